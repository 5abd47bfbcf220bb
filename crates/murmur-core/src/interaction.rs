//! Interaction records: one actor's relationship to one target.
//!
//! An interaction is identified by its composite [`InteractionKey`]. The
//! store holds at most one record per key; that guarantee comes from a
//! database-level uniqueness constraint, never from a read-before-write.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{cursor::Cursor, id::ObjectId, page::Keyed};

// ─── Kinds and policies ──────────────────────────────────────────────────────

/// The role an actor takes on an event. Part of the participation identity:
/// the same actor may hold several roles on one event.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantRole {
  Host,
  Speaker,
  Attendee,
}

/// What happens when an interaction is applied a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
  /// The repeat removes the existing record ("unlike").
  Toggle,
  /// The repeat is a no-op; the existing record stays.
  AppendOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "role", rename_all = "snake_case")]
pub enum InteractionKind {
  Like,
  Participation(ParticipantRole),
}

impl InteractionKind {
  /// The duplicate policy of each kind. Every new kind has to pick one here.
  pub fn policy(&self) -> DuplicatePolicy {
    match self {
      Self::Like => DuplicatePolicy::Toggle,
      Self::Participation(_) => DuplicatePolicy::AppendOnce,
    }
  }

  pub fn role(&self) -> Option<ParticipantRole> {
    match self {
      Self::Like => None,
      Self::Participation(role) => Some(*role),
    }
  }
}

impl fmt::Display for InteractionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Like => f.write_str("like"),
      Self::Participation(role) => write!(f, "participation:{role}"),
    }
  }
}

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The composite identity of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionKey {
  pub actor_id:      ObjectId,
  /// The post or event interacted with.
  pub target_id:     ObjectId,
  /// A child of the target, e.g. a comment under the liked post.
  pub sub_target_id: Option<ObjectId>,
  pub kind:          InteractionKind,
}

impl InteractionKey {
  pub fn like_post(actor_id: ObjectId, post_id: ObjectId) -> Self {
    Self { actor_id, target_id: post_id, sub_target_id: None, kind: InteractionKind::Like }
  }

  pub fn like_comment(actor_id: ObjectId, post_id: ObjectId, comment_id: ObjectId) -> Self {
    Self {
      actor_id,
      target_id: post_id,
      sub_target_id: Some(comment_id),
      kind: InteractionKind::Like,
    }
  }

  pub fn participate(actor_id: ObjectId, event_id: ObjectId, role: ParticipantRole) -> Self {
    Self {
      actor_id,
      target_id: event_id,
      sub_target_id: None,
      kind: InteractionKind::Participation(role),
    }
  }
}

impl fmt::Display for InteractionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}->{}", self.kind, self.actor_id, self.target_id)?;
    if let Some(sub) = self.sub_target_id {
      write!(f, "/{sub}")?;
    }
    Ok(())
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
  pub interaction_id: ObjectId,
  #[serde(flatten)]
  pub key:            InteractionKey,
  pub created_at:     DateTime<Utc>,
}

impl InteractionRecord {
  /// A fresh record for `key`, stamped now at millisecond precision.
  pub fn new(key: InteractionKey) -> Self {
    let cursor = Cursor::new(Utc::now(), ObjectId::new());
    Self { interaction_id: cursor.id, key, created_at: cursor.timestamp }
  }
}

impl Keyed for InteractionRecord {
  fn sort_key(&self) -> Cursor { Cursor::new(self.created_at, self.interaction_id) }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What the store reports for an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Inserted,
  /// The composite-key uniqueness constraint rejected the row.
  Conflict,
}

/// What an interaction request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Created,
  AlreadyExists,
  ToggledOff,
}

impl Outcome {
  /// Whether the relation exists once the request has been applied.
  pub fn is_present(&self) -> bool { !matches!(self, Self::ToggledOff) }
}
