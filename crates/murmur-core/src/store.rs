//! Store traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `murmur-store-sqlite`).
//! A single store handle is constructed by the composition root and passed to
//! everything that needs it; nothing here reaches for a global.
//!
//! Every listing method is a keyset range query: rows strictly after
//! `request.after`, ordered `(created_at DESC, id DESC)`, at most
//! [`PageRequest::fetch_limit`] of them. Callers turn the rows into a
//! [`Page`](crate::page::Page) with
//! [`Page::from_overfetch`](crate::page::Page::from_overfetch).

use std::future::Future;

use crate::{
  content::{Comment, NewComment, NewPost, Post},
  id::ObjectId,
  interaction::{InsertOutcome, InteractionKey, InteractionRecord, ParticipantRole},
  page::PageRequest,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which interactions on a target to list or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionFilter {
  /// Likes on the target itself (`sub_target_id: None`) or on one of its
  /// children.
  Likes { sub_target_id: Option<ObjectId> },
  /// Participants of an event, optionally restricted to one role.
  Participants { role: Option<ParticipantRole> },
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for a storage backend.
///
/// All methods of the derived traits return `Send` futures so they can be
/// driven from multi-threaded runtimes (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Interaction records, unique per [`InteractionKey`].
pub trait InteractionStore: Store {
  /// Insert `record` in a single atomic write.
  ///
  /// A uniqueness violation on the composite key is not an error: it comes
  /// back as [`InsertOutcome::Conflict`]. Every other failure is `Err`.
  fn insert_interaction(
    &self,
    record: InteractionRecord,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + '_;

  /// Delete the record with exactly this composite key. Returns whether a
  /// row was removed.
  fn delete_interaction(
    &self,
    key: InteractionKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Keyset listing of interactions on `target_id`.
  fn list_interactions(
    &self,
    target_id: ObjectId,
    filter: InteractionFilter,
    request: PageRequest,
  ) -> impl Future<Output = Result<Vec<InteractionRecord>, Self::Error>> + Send + '_;

  fn count_interactions(
    &self,
    target_id: ObjectId,
    filter: InteractionFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

/// Posts and their comments.
pub trait PostStore: Store {
  // ── Posts ─────────────────────────────────────────────────────────────

  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: ObjectId,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Keyset listing of the whole feed.
  fn list_posts(
    &self,
    request: PageRequest,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Delete a post together with its comments and every interaction that
  /// targets the post or one of its comments, atomically. Returns `false` if
  /// the post did not exist.
  fn delete_post(
    &self,
    id: ObjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: ObjectId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn list_comments(
    &self,
    post_id: ObjectId,
    request: PageRequest,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}

/// Everything the HTTP layer needs from one backend.
pub trait FeedStore: PostStore + InteractionStore + 'static {}

impl<T: PostStore + InteractionStore + 'static> FeedStore for T {}
