//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are INTEGER milliseconds. Ids are lowercase hex TEXT. Optional
//! key components are stored as `''` so they take part in UNIQUE checks.

use chrono::{DateTime, Utc};
use murmur_core::{
  ObjectId,
  content::{Comment, Post},
  interaction::{InteractionKey, InteractionKind, InteractionRecord, ParticipantRole},
  page::PageRequest,
  store::InteractionFilter,
};

use crate::{Error, Result};

// ─── ObjectId ────────────────────────────────────────────────────────────────

pub fn encode_id(id: ObjectId) -> String { id.to_hex() }

pub fn decode_id(s: &str) -> Result<ObjectId> { Ok(ObjectId::parse_str(s)?) }

pub fn encode_opt_id(id: Option<ObjectId>) -> String {
  id.map(encode_id).unwrap_or_default()
}

pub fn decode_opt_id(s: &str) -> Result<Option<ObjectId>> {
  if s.is_empty() { Ok(None) } else { decode_id(s).map(Some) }
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_ms(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn decode_ms(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms)
    .ok_or_else(|| Error::Decode(format!("timestamp out of range: {ms}")))
}

// ─── InteractionKind ─────────────────────────────────────────────────────────

/// `(kind, role)` column values.
pub fn encode_kind(kind: InteractionKind) -> (&'static str, &'static str) {
  match kind {
    InteractionKind::Like => ("like", ""),
    InteractionKind::Participation(role) => ("participation", role.into()),
  }
}

pub fn decode_kind(kind: &str, role: &str) -> Result<InteractionKind> {
  match kind {
    "like" => Ok(InteractionKind::Like),
    "participation" => role
      .parse::<ParticipantRole>()
      .map(InteractionKind::Participation)
      .map_err(|_| Error::Decode(format!("unknown participant role: {role:?}"))),
    other => Err(Error::Decode(format!("unknown interaction kind: {other:?}"))),
  }
}

// ─── Query parameters ────────────────────────────────────────────────────────

/// Column filters for an [`InteractionFilter`]: `(kind, sub_target_id, role)`.
/// `None` means "any value".
pub fn encode_filter(
  filter: InteractionFilter,
) -> (&'static str, Option<String>, Option<&'static str>) {
  match filter {
    InteractionFilter::Likes { sub_target_id } => {
      ("like", Some(encode_opt_id(sub_target_id)), None)
    }
    InteractionFilter::Participants { role } => {
      ("participation", None, role.map(<&'static str>::from))
    }
  }
}

/// Keyset bound for a [`PageRequest`]: `(after_ms, after_id, fetch_limit)`.
/// Both bounds are NULL on the first page.
pub fn encode_page(request: &PageRequest) -> (Option<i64>, Option<String>, i64) {
  (
    request.after.map(|c| c.millis()),
    request.after.map(|c| encode_id(c.id)),
    request.fetch_limit() as i64,
  )
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub post_id:       String,
  pub author_id:     String,
  pub body:          String,
  pub created_at_ms: i64,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:       row.get(0)?,
      author_id:     row.get(1)?,
      body:          row.get(2)?,
      created_at_ms: row.get(3)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    decode_id(&self.post_id)?,
      author_id:  decode_id(&self.author_id)?,
      body:       self.body,
      created_at: decode_ms(self.created_at_ms)?,
    })
  }
}

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:    String,
  pub post_id:       String,
  pub author_id:     String,
  pub body:          String,
  pub created_at_ms: i64,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:    row.get(0)?,
      post_id:       row.get(1)?,
      author_id:     row.get(2)?,
      body:          row.get(3)?,
      created_at_ms: row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_id(&self.comment_id)?,
      post_id:    decode_id(&self.post_id)?,
      author_id:  decode_id(&self.author_id)?,
      body:       self.body,
      created_at: decode_ms(self.created_at_ms)?,
    })
  }
}

/// Raw values read directly from an `interactions` row.
pub struct RawInteraction {
  pub interaction_id: String,
  pub kind:           String,
  pub actor_id:       String,
  pub target_id:      String,
  pub sub_target_id:  String,
  pub role:           String,
  pub created_at_ms:  i64,
}

impl RawInteraction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      interaction_id: row.get(0)?,
      kind:           row.get(1)?,
      actor_id:       row.get(2)?,
      target_id:      row.get(3)?,
      sub_target_id:  row.get(4)?,
      role:           row.get(5)?,
      created_at_ms:  row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<InteractionRecord> {
    Ok(InteractionRecord {
      interaction_id: decode_id(&self.interaction_id)?,
      key:            InteractionKey {
        actor_id:      decode_id(&self.actor_id)?,
        target_id:     decode_id(&self.target_id)?,
        sub_target_id: decode_opt_id(&self.sub_target_id)?,
        kind:          decode_kind(&self.kind, &self.role)?,
      },
      created_at:     decode_ms(self.created_at_ms)?,
    })
  }
}
