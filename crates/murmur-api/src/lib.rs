//! JSON REST API for Murmur.
//!
//! Exposes an axum [`Router`] backed by any [`FeedStore`]. Authentication,
//! TLS and transport concerns are the caller's responsibility; the acting
//! user arrives through a [`ResolveIdentity`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", murmur_api::api_router(state))
//! ```

pub mod comments;
pub mod error;
pub mod identity;
pub mod interactions;
pub mod listing;
pub mod posts;

use std::{fmt::Display, future::Future, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use murmur_core::{
  guard::{GuardConfig, InteractionGuard, bounded},
  store::FeedStore,
};

pub use error::ApiError;
pub use identity::{Actor, HeaderIdentity, ResolveIdentity};

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiConfig {
  /// Page size when the client sends no `limit`.
  pub default_page_size: usize,
  /// Upper bound applied to any client-supplied `limit`.
  pub max_page_size:     usize,
}

impl Default for ApiConfig {
  fn default() -> Self { Self { default_page_size: 20, max_page_size: 100 } }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub guard:    InteractionGuard<S>,
  pub identity: Arc<dyn ResolveIdentity>,
  pub config:   ApiConfig,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      guard:    self.guard.clone(),
      identity: Arc::clone(&self.identity),
      config:   self.config,
    }
  }
}

impl<S: FeedStore> ApiState<S> {
  /// Wire one store handle into both the handlers and the interaction guard.
  pub fn new(
    store: Arc<S>,
    guard_config: GuardConfig,
    identity: Arc<dyn ResolveIdentity>,
    config: ApiConfig,
  ) -> Self {
    let guard = InteractionGuard::new(Arc::clone(&store), guard_config);
    Self { store, guard, identity, config }
  }

  /// Run a direct store call under the same timeout the guard uses.
  pub(crate) async fn call<T, E, F>(
    &self,
    operation: &'static str,
    key: impl Display,
    call: F,
  ) -> Result<T, ApiError>
  where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    Ok(bounded(self.guard.config().store_timeout, operation, key, call).await?)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: FeedStore>(state: ApiState<S>) -> Router<()> {
  Router::new()
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route("/posts/{id}", get(posts::get_one::<S>).delete(posts::delete_one::<S>))
    // Comments
    .route(
      "/posts/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    // Likes
    .route("/posts/{id}/like", post(interactions::like_post::<S>))
    .route("/posts/{id}/likes", get(interactions::list_likes::<S>))
    .route(
      "/posts/{id}/comments/{comment_id}/like",
      post(interactions::like_comment::<S>),
    )
    // Participation
    .route(
      "/events/{id}/participants",
      get(interactions::list_participants::<S>).post(interactions::participate::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
