//! [`SqliteStore`]: the SQLite implementation of the Murmur store traits.

use std::path::Path;

use chrono::Utc;
use murmur_core::{
  Cursor, ObjectId,
  content::{Comment, NewComment, NewPost, Post},
  interaction::{InsertOutcome, InteractionKey, InteractionRecord},
  page::PageRequest,
  store::{InteractionFilter, InteractionStore, PostStore, Store},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    RawComment, RawInteraction, RawPost, encode_filter, encode_id, encode_kind, encode_ms,
    encode_opt_id, encode_page,
  },
  schema::SCHEMA,
};

/// Whether `err` is the composite-key UNIQUE index rejecting a row.
///
/// Primary-key collisions report `SQLITE_CONSTRAINT_PRIMARYKEY` instead and
/// stay errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// A fresh `(id, created_at)` pair at the precision the columns store.
fn stamp() -> Cursor { Cursor::new(Utc::now(), ObjectId::new()) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Murmur store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── InteractionStore impl ───────────────────────────────────────────────────

impl InteractionStore for SqliteStore {
  async fn insert_interaction(&self, record: InteractionRecord) -> Result<InsertOutcome> {
    let id_str         = encode_id(record.interaction_id);
    let (kind, role)   = encode_kind(record.key.kind);
    let actor_str      = encode_id(record.key.actor_id);
    let target_str     = encode_id(record.key.target_id);
    let sub_target_str = encode_opt_id(record.key.sub_target_id);
    let at_ms          = encode_ms(record.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO interactions
             (interaction_id, kind, actor_id, target_id, sub_target_id, role, created_at_ms)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, kind, actor_str, target_str, sub_target_str, role, at_ms],
        );
        match inserted {
          Ok(_) => Ok(InsertOutcome::Inserted),
          Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if outcome == InsertOutcome::Conflict {
      debug!(key = %record.key, "unique index rejected interaction");
    }
    Ok(outcome)
  }

  async fn delete_interaction(&self, key: InteractionKey) -> Result<bool> {
    let (kind, role)   = encode_kind(key.kind);
    let actor_str      = encode_id(key.actor_id);
    let target_str     = encode_id(key.target_id);
    let sub_target_str = encode_opt_id(key.sub_target_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM interactions
           WHERE kind = ?1 AND actor_id = ?2 AND target_id = ?3
             AND sub_target_id = ?4 AND role = ?5",
          rusqlite::params![kind, actor_str, target_str, sub_target_str, role],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list_interactions(
    &self,
    target_id: ObjectId,
    filter:    InteractionFilter,
    request:   PageRequest,
  ) -> Result<Vec<InteractionRecord>> {
    let target_str               = encode_id(target_id);
    let (kind, sub_target, role) = encode_filter(filter);
    let (after_ms, after_id, limit) = encode_page(&request);

    let raws: Vec<RawInteraction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT interaction_id, kind, actor_id, target_id, sub_target_id, role, created_at_ms
           FROM interactions
           WHERE target_id = ?1
             AND kind = ?2
             AND (?3 IS NULL OR sub_target_id = ?3)
             AND (?4 IS NULL OR role = ?4)
             AND (?5 IS NULL
                  OR created_at_ms < ?5
                  OR (created_at_ms = ?5 AND interaction_id < ?6))
           ORDER BY created_at_ms DESC, interaction_id DESC
           LIMIT ?7",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![target_str, kind, sub_target, role, after_ms, after_id, limit],
            RawInteraction::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInteraction::into_record).collect()
  }

  async fn count_interactions(
    &self,
    target_id: ObjectId,
    filter:    InteractionFilter,
  ) -> Result<u64> {
    let target_str               = encode_id(target_id);
    let (kind, sub_target, role) = encode_filter(filter);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM interactions
           WHERE target_id = ?1
             AND kind = ?2
             AND (?3 IS NULL OR sub_target_id = ?3)
             AND (?4 IS NULL OR role = ?4)",
          rusqlite::params![target_str, kind, sub_target, role],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let stamp = stamp();
    let post = Post {
      post_id:    stamp.id,
      author_id:  input.author_id,
      body:       input.body,
      created_at: stamp.timestamp,
    };

    let id_str     = encode_id(post.post_id);
    let author_str = encode_id(post.author_id);
    let body       = post.body.clone();
    let at_ms      = encode_ms(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, author_id, body, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, author_str, body, at_ms],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, id: ObjectId) -> Result<Option<Post>> {
    let id_str = encode_id(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT post_id, author_id, body, created_at_ms FROM posts WHERE post_id = ?1",
            rusqlite::params![id_str],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self, request: PageRequest) -> Result<Vec<Post>> {
    let (after_ms, after_id, limit) = encode_page(&request);

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT post_id, author_id, body, created_at_ms
           FROM posts
           WHERE ?1 IS NULL
              OR created_at_ms < ?1
              OR (created_at_ms = ?1 AND post_id < ?2)
           ORDER BY created_at_ms DESC, post_id DESC
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after_ms, after_id, limit], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn delete_post(&self, id: ObjectId) -> Result<bool> {
    let id_str = encode_id(id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        // Interactions first: the comment subqueries need the comments.
        tx.execute(
          "DELETE FROM interactions
           WHERE target_id = ?1
              OR target_id     IN (SELECT comment_id FROM comments WHERE post_id = ?1)
              OR sub_target_id IN (SELECT comment_id FROM comments WHERE post_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM comments WHERE post_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if removed {
      debug!(post_id = %id, "post deleted with its comments and interactions");
    }
    Ok(removed)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn create_comment(&self, input: NewComment) -> Result<Comment> {
    let stamp = stamp();
    let comment = Comment {
      comment_id: stamp.id,
      post_id:    input.post_id,
      author_id:  input.author_id,
      body:       input.body,
      created_at: stamp.timestamp,
    };

    let id_str     = encode_id(comment.comment_id);
    let post_str   = encode_id(comment.post_id);
    let author_str = encode_id(comment.author_id);
    let body       = comment.body.clone();
    let at_ms      = encode_ms(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, post_id, author_id, body, created_at_ms)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, post_str, author_str, body, at_ms],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: ObjectId) -> Result<Option<Comment>> {
    let id_str = encode_id(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT comment_id, post_id, author_id, body, created_at_ms
             FROM comments WHERE comment_id = ?1",
            rusqlite::params![id_str],
            RawComment::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(&self, post_id: ObjectId, request: PageRequest) -> Result<Vec<Comment>> {
    let post_str = encode_id(post_id);
    let (after_ms, after_id, limit) = encode_page(&request);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, post_id, author_id, body, created_at_ms
           FROM comments
           WHERE post_id = ?1
             AND (?2 IS NULL
                  OR created_at_ms < ?2
                  OR (created_at_ms = ?2 AND comment_id < ?3))
           ORDER BY created_at_ms DESC, comment_id DESC
           LIMIT ?4",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![post_str, after_ms, after_id, limit],
            RawComment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}

// ─── Test hooks ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl SqliteStore {
  /// Insert a post with a caller-chosen id and timestamp, for ordering tests.
  pub(crate) async fn insert_post_at(&self, post: Post) -> Result<()> {
    let id_str     = encode_id(post.post_id);
    let author_str = encode_id(post.author_id);
    let at_ms      = encode_ms(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, author_id, body, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, author_str, post.body, at_ms],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total rows in `interactions`, whatever their key.
  pub(crate) async fn interaction_rows(&self) -> Result<i64> {
    Ok(
      self
        .conn
        .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM interactions", [], |r| r.get(0))?))
        .await?,
    )
  }
}
