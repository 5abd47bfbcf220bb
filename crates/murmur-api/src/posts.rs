//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Feed, newest first; `?cursor`, `?limit` |
//! | `POST`   | `/posts` | Body: `{"body":"..."}`; returns 201 + stored post |
//! | `GET`    | `/posts/:id` | 404 if not found |
//! | `DELETE` | `/posts/:id` | Author or moderator; removes comments and interactions |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use murmur_core::{
  ObjectId,
  content::{NewPost, Post},
  page::Page,
  store::FeedStore,
};
use serde::Deserialize;
use tracing::info;

use crate::{
  ApiState,
  error::ApiError,
  identity::Actor,
  listing::{ListParams, parse_id},
};

/// Fetch a post or answer 404.
pub(crate) async fn require_post<S: FeedStore>(
  state: &ApiState<S>,
  id: ObjectId,
) -> Result<Post, ApiError> {
  state
    .call("get_post", id, state.store.get_post(id))
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))
}

/// Reject blank bodies; returns the trimmed text.
pub(crate) fn validate_body(body: &str) -> Result<String, ApiError> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(ApiError::BadRequest("body must not be empty".into()));
  }
  Ok(trimmed.to_owned())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /posts[?cursor=...][&limit=...]`
pub async fn list<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Post>>, ApiError> {
  let request = params.page_request(&state.config)?;
  let rows = state
    .call("list_posts", "feed", state.store.list_posts(request))
    .await?;
  Ok(Json(Page::from_overfetch(rows, request.limit)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub body: String,
}

/// `POST /posts` with body `{"body":"..."}`
pub async fn create<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewPost { author_id: actor.actor_id, body: validate_body(&body.body)? };
  let post = state
    .call("create_post", actor.actor_id, state.store.create_post(input))
    .await?;
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /posts/:id`
pub async fn get_one<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
  let id = parse_id(&id)?;
  Ok(Json(require_post(&state, id).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /posts/:id`, 204 on success.
pub async fn delete_one<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let id = parse_id(&id)?;
  let post = require_post(&state, id).await?;

  if post.author_id != actor.actor_id && !actor.can_moderate() {
    return Err(ApiError::Forbidden(format!("post {id} belongs to another user")));
  }

  let removed = state.call("delete_post", id, state.store.delete_post(id)).await?;
  if !removed {
    // Deleted concurrently between the lookup and now.
    return Err(ApiError::NotFound(format!("post {id} not found")));
  }

  info!(post_id = %id, actor = %actor.actor_id, "post deleted");
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_bodies_are_rejected() {
    assert!(matches!(validate_body("  \n"), Err(ApiError::BadRequest(_))));
    assert_eq!(validate_body("  hello ").unwrap(), "hello");
  }
}
