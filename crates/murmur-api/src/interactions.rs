//! Handlers for likes and event participation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/posts/:id/like` | Toggle: `created` then `toggled_off` |
//! | `POST` | `/posts/:id/comments/:comment_id/like` | Toggle on a comment |
//! | `GET`  | `/posts/:id/likes` | Optional `?comment_id`; listing plus `count` |
//! | `POST` | `/events/:id/participants` | Body: `{"role":"speaker"}`; append-once |
//! | `GET`  | `/events/:id/participants` | Optional `?role`; listing |
//!
//! Writes answer `{"outcome": ...}` with 201 for `created` and 200 for the
//! duplicate outcomes.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use murmur_core::{
  interaction::{InteractionKey, InteractionRecord, Outcome, ParticipantRole},
  page::Page,
  store::{FeedStore, InteractionFilter},
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  error::ApiError,
  identity::Actor,
  listing::{page_request, parse_id},
  posts::require_post,
};

#[derive(Debug, Serialize)]
pub struct OutcomeBody {
  pub outcome: Outcome,
}

fn respond(outcome: Outcome) -> (StatusCode, Json<OutcomeBody>) {
  let status = match outcome {
    Outcome::Created => StatusCode::CREATED,
    Outcome::AlreadyExists | Outcome::ToggledOff => StatusCode::OK,
  };
  (status, Json(OutcomeBody { outcome }))
}

// ─── Likes ────────────────────────────────────────────────────────────────────

/// `POST /posts/:id/like`
pub async fn like_post<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(post_id): Path<String>,
) -> Result<(StatusCode, Json<OutcomeBody>), ApiError> {
  let post_id = parse_id(&post_id)?;
  require_post(&state, post_id).await?;

  let outcome = state.guard.apply(InteractionKey::like_post(actor.actor_id, post_id)).await?;
  Ok(respond(outcome))
}

/// `POST /posts/:id/comments/:comment_id/like`
pub async fn like_comment<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<OutcomeBody>), ApiError> {
  let post_id = parse_id(&post_id)?;
  let comment_id = parse_id(&comment_id)?;

  let comment = state
    .call("get_comment", comment_id, state.store.get_comment(comment_id))
    .await?
    .filter(|c| c.post_id == post_id)
    .ok_or_else(|| ApiError::NotFound(format!("comment {comment_id} not found on post {post_id}")))?;

  let key = InteractionKey::like_comment(actor.actor_id, comment.post_id, comment.comment_id);
  Ok(respond(state.guard.apply(key).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct LikesParams {
  pub cursor:     Option<String>,
  pub limit:      Option<usize>,
  /// List likes on this comment instead of on the post itself.
  pub comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikesPage {
  #[serde(flatten)]
  pub page:  Page<InteractionRecord>,
  /// Total likes on the target, independent of the page.
  pub count: u64,
}

/// `GET /posts/:id/likes[?comment_id=...][&cursor=...][&limit=...]`
pub async fn list_likes<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Path(post_id): Path<String>,
  Query(params): Query<LikesParams>,
) -> Result<Json<LikesPage>, ApiError> {
  let post_id = parse_id(&post_id)?;
  let sub_target_id = params.comment_id.as_deref().map(parse_id).transpose()?;
  let request = page_request(params.cursor.as_deref(), params.limit, &state.config)?;
  require_post(&state, post_id).await?;

  let filter = InteractionFilter::Likes { sub_target_id };
  let rows = state
    .call("list_interactions", post_id, state.store.list_interactions(post_id, filter, request))
    .await?;
  let count = state
    .call("count_interactions", post_id, state.store.count_interactions(post_id, filter))
    .await?;

  Ok(Json(LikesPage { page: Page::from_overfetch(rows, request.limit), count }))
}

// ─── Participation ────────────────────────────────────────────────────────────

fn default_role() -> ParticipantRole { ParticipantRole::Attendee }

#[derive(Debug, Deserialize)]
pub struct ParticipateBody {
  #[serde(default = "default_role")]
  pub role: ParticipantRole,
}

/// `POST /events/:id/participants` with body `{"role":"host"|"speaker"|"attendee"}`
///
/// Events live outside this service, so the event id is not looked up.
pub async fn participate<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(event_id): Path<String>,
  Json(body): Json<ParticipateBody>,
) -> Result<(StatusCode, Json<OutcomeBody>), ApiError> {
  let event_id = parse_id(&event_id)?;
  let key = InteractionKey::participate(actor.actor_id, event_id, body.role);
  Ok(respond(state.guard.apply(key).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantParams {
  pub cursor: Option<String>,
  pub limit:  Option<usize>,
  pub role:   Option<ParticipantRole>,
}

/// `GET /events/:id/participants[?role=...][&cursor=...][&limit=...]`
pub async fn list_participants<S: FeedStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
  Query(params): Query<ParticipantParams>,
) -> Result<Json<Page<InteractionRecord>>, ApiError> {
  let event_id = parse_id(&event_id)?;
  let request = page_request(params.cursor.as_deref(), params.limit, &state.config)?;

  let filter = InteractionFilter::Participants { role: params.role };
  let rows = state
    .call(
      "list_interactions",
      event_id,
      state.store.list_interactions(event_id, filter, request),
    )
    .await?;
  Ok(Json(Page::from_overfetch(rows, request.limit)))
}
