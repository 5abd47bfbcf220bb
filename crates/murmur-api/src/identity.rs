//! Request identity: who is acting.
//!
//! Authentication itself happens upstream; a [`ResolveIdentity`] turns the
//! request headers it leaves behind into an [`Identity`].

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use murmur_core::{
  ObjectId,
  identity::{Identity, Role},
  store::FeedStore,
};

use crate::{ApiState, error::ApiError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

pub trait ResolveIdentity: Send + Sync {
  /// `None` when the request carries no usable identity.
  fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Trusts `x-user-id` (24 hex characters) and the comma-separated
/// `x-user-roles` set by an authenticating proxy. Unknown roles are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentity;

impl ResolveIdentity for HeaderIdentity {
  fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
    let raw = headers.get(USER_ID_HEADER)?.to_str().ok()?;
    let actor_id = ObjectId::parse_str(raw.trim()).ok()?;

    let mut identity = Identity::new(actor_id);
    let extra = headers
      .get(USER_ROLES_HEADER)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .split(',')
      .filter_map(|r| r.trim().parse::<Role>().ok());
    for role in extra {
      if !identity.has_role(role) {
        identity.roles.push(role);
      }
    }
    Some(identity)
  }
}

/// Extractor for handlers that need an acting user. Rejects with 401.
pub struct Actor(pub Identity);

impl<S: FeedStore> FromRequestParts<ApiState<S>> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    state
      .identity
      .resolve(&parts.headers)
      .map(Actor)
      .ok_or(ApiError::Unauthenticated)
  }
}
