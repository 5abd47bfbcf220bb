//! Handlers for `/posts/:id/comments`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use murmur_core::{
  content::{Comment, NewComment},
  page::Page,
  store::FeedStore,
};

use crate::{
  ApiState,
  error::ApiError,
  identity::Actor,
  listing::{ListParams, parse_id},
  posts::{CreateBody, require_post, validate_body},
};

/// `GET /posts/:id/comments[?cursor=...][&limit=...]`, newest first.
pub async fn list<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Path(post_id): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Comment>>, ApiError> {
  let post_id = parse_id(&post_id)?;
  let request = params.page_request(&state.config)?;
  require_post(&state, post_id).await?;

  let rows = state
    .call("list_comments", post_id, state.store.list_comments(post_id, request))
    .await?;
  Ok(Json(Page::from_overfetch(rows, request.limit)))
}

/// `POST /posts/:id/comments` with body `{"body":"..."}`; returns 201.
pub async fn create<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(post_id): Path<String>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let post_id = parse_id(&post_id)?;
  let body = validate_body(&body.body)?;
  require_post(&state, post_id).await?;

  let input = NewComment { post_id, author_id: actor.actor_id, body };
  let comment = state
    .call("create_comment", post_id, state.store.create_comment(input))
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}
