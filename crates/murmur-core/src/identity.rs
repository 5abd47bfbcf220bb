//! The authenticated actor behind a request.
//!
//! Producing an [`Identity`] is the job of a resolver at the HTTP edge; the
//! core only consumes the typed result.

use serde::{Deserialize, Serialize};

use crate::id::ObjectId;

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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  User,
  Moderator,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub actor_id: ObjectId,
  pub roles:    Vec<Role>,
}

impl Identity {
  pub fn new(actor_id: ObjectId) -> Self { Self { actor_id, roles: vec![Role::User] } }

  pub fn has_role(&self, role: Role) -> bool { self.roles.contains(&role) }

  /// Moderators and admins may remove content they did not author.
  pub fn can_moderate(&self) -> bool {
    self.has_role(Role::Moderator) || self.has_role(Role::Admin)
  }
}
