//! Router tests driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use murmur_core::{
  ObjectId,
  content::{Comment, NewComment, NewPost, Post},
  guard::GuardConfig,
  interaction::{InsertOutcome, InteractionKey, InteractionRecord},
  page::PageRequest,
  store::{InteractionFilter, InteractionStore, PostStore, Store},
};
use murmur_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;
use crate::identity::{USER_ID_HEADER, USER_ROLES_HEADER};

async fn make_state() -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(
    Arc::new(store),
    GuardConfig::default(),
    Arc::new(HeaderIdentity),
    ApiConfig { default_page_size: 2, max_page_size: 10 },
  )
}

struct Reply {
  status:      StatusCode,
  retry_after: Option<String>,
  body:        Value,
}

async fn send<S: FeedStore>(
  state:   &ApiState<S>,
  method:  &str,
  uri:     &str,
  headers: &[(&str, &str)],
  body:    Option<Value>,
) -> Reply {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(*k, *v);
  }
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(serde_json::to_vec(&v).unwrap()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let retry_after = resp
    .headers()
    .get(header::RETRY_AFTER)
    .map(|v| v.to_str().unwrap().to_owned());
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  Reply { status, retry_after, body }
}

fn user() -> String { ObjectId::new().to_string() }

async fn create_post(state: &ApiState<SqliteStore>, author: &str, text: &str) -> String {
  let reply = send(
    state,
    "POST",
    "/posts",
    &[(USER_ID_HEADER, author)],
    Some(json!({ "body": text })),
  )
  .await;
  assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
  reply.body["post_id"].as_str().unwrap().to_owned()
}

// ── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_pages_follow_next_cursor_to_the_end() {
  let state = make_state().await;
  let author = user();
  let mut ids = Vec::new();
  for i in 0..3 {
    ids.push(create_post(&state, &author, &format!("post {i}")).await);
  }
  ids.reverse();

  let first = send(&state, "GET", "/posts", &[], None).await;
  assert_eq!(first.status, StatusCode::OK);
  let items: Vec<&str> = first.body["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["post_id"].as_str().unwrap())
    .collect();
  assert_eq!(items, [ids[0].as_str(), ids[1].as_str()]);
  let cursor = first.body["next_cursor"].as_str().unwrap();

  let second = send(&state, "GET", &format!("/posts?cursor={cursor}"), &[], None).await;
  assert_eq!(second.status, StatusCode::OK);
  assert_eq!(second.body["items"].as_array().unwrap().len(), 1);
  assert_eq!(second.body["items"][0]["post_id"], ids[2].as_str());
  assert!(second.body["next_cursor"].is_null());
}

#[tokio::test]
async fn undecodable_cursor_is_a_400() {
  let state = make_state().await;
  let reply = send(&state, "GET", "/posts?cursor=not*base64", &[], None).await;
  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
  assert_eq!(reply.body["code"], "invalid_cursor");
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_the_store() {
  let state = make_state().await;
  let actor = user();

  let reply = send(&state, "GET", "/posts/xyz", &[], None).await;
  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
  assert_eq!(reply.body["code"], "malformed_identifier");

  let reply = send(&state, "POST", "/posts/xyz/like", &[(USER_ID_HEADER, actor.as_str())], None).await;
  assert_eq!(reply.body["code"], "malformed_identifier");
}

#[tokio::test]
async fn writes_require_an_identity() {
  let state = make_state().await;
  let reply = send(&state, "POST", "/posts", &[], Some(json!({ "body": "hi" }))).await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
  assert_eq!(reply.body["code"], "unauthenticated");
}

#[tokio::test]
async fn only_author_or_moderator_may_delete() {
  let state = make_state().await;
  let author = user();
  let stranger = user();
  let post_id = create_post(&state, &author, "mine").await;
  let uri = format!("/posts/{post_id}");

  let reply = send(&state, "DELETE", &uri, &[(USER_ID_HEADER, stranger.as_str())], None).await;
  assert_eq!(reply.status, StatusCode::FORBIDDEN);

  let moderator = [(USER_ID_HEADER, stranger.as_str()), (USER_ROLES_HEADER, "moderator")];
  let reply = send(&state, "DELETE", &uri, &moderator, None).await;
  assert_eq!(reply.status, StatusCode::NO_CONTENT);

  let reply = send(&state, "GET", &uri, &[], None).await;
  assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

// ── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_list_under_their_post() {
  let state = make_state().await;
  let author = user();
  let post_id = create_post(&state, &author, "p").await;
  let uri = format!("/posts/{post_id}/comments");

  for text in ["one", "two", "three"] {
    let reply = send(&state, "POST", &uri, &[(USER_ID_HEADER, author.as_str())], Some(json!({ "body": text }))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
  }

  let reply = send(&state, "GET", &format!("{uri}?limit=5"), &[], None).await;
  let bodies: Vec<&str> = reply.body["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["body"].as_str().unwrap())
    .collect();
  assert_eq!(bodies, ["three", "two", "one"]);

  let missing = format!("/posts/{}/comments", user());
  assert_eq!(send(&state, "GET", &missing, &[], None).await.status, StatusCode::NOT_FOUND);
}

// ── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn liking_twice_toggles_off() {
  let state = make_state().await;
  let actor = user();
  let post_id = create_post(&state, &user(), "likeable").await;
  let like = format!("/posts/{post_id}/like");
  let who = [(USER_ID_HEADER, actor.as_str())];

  let reply = send(&state, "POST", &like, &who, None).await;
  assert_eq!((reply.status, reply.body["outcome"].as_str()), (StatusCode::CREATED, Some("created")));

  let reply = send(&state, "POST", &like, &who, None).await;
  assert_eq!((reply.status, reply.body["outcome"].as_str()), (StatusCode::OK, Some("toggled_off")));

  let reply = send(&state, "POST", &like, &who, None).await;
  assert_eq!(reply.body["outcome"], "created");

  let likes = send(&state, "GET", &format!("/posts/{post_id}/likes"), &[], None).await;
  assert_eq!(likes.body["count"], 1);
  assert_eq!(likes.body["items"][0]["actor_id"], actor.as_str());
}

#[tokio::test]
async fn liking_a_missing_post_is_a_404() {
  let state = make_state().await;
  let actor = user();
  let reply = send(&state, "POST", &format!("/posts/{}/like", user()), &[(USER_ID_HEADER, actor.as_str())], None).await;
  assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_likes_are_counted_apart_from_post_likes() {
  let state = make_state().await;
  let actor = user();
  let post_id = create_post(&state, &actor, "p").await;
  let other_post = create_post(&state, &actor, "q").await;
  let who = [(USER_ID_HEADER, actor.as_str())];

  let comment = send(
    &state,
    "POST",
    &format!("/posts/{post_id}/comments"),
    &who,
    Some(json!({ "body": "c" })),
  )
  .await;
  let comment_id = comment.body["comment_id"].as_str().unwrap().to_owned();

  let reply = send(&state, "POST", &format!("/posts/{post_id}/comments/{comment_id}/like"), &who, None).await;
  assert_eq!(reply.status, StatusCode::CREATED);

  // The comment does not belong to the other post.
  let reply = send(&state, "POST", &format!("/posts/{other_post}/comments/{comment_id}/like"), &who, None).await;
  assert_eq!(reply.status, StatusCode::NOT_FOUND);

  let on_comment = send(&state, "GET", &format!("/posts/{post_id}/likes?comment_id={comment_id}"), &[], None).await;
  assert_eq!(on_comment.body["count"], 1);
  let on_post = send(&state, "GET", &format!("/posts/{post_id}/likes"), &[], None).await;
  assert_eq!(on_post.body["count"], 0);
}

// ── Participation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn participation_is_recorded_once_per_role() {
  let state = make_state().await;
  let actor = user();
  let event = user();
  let uri = format!("/events/{event}/participants");
  let who = [(USER_ID_HEADER, actor.as_str())];

  let reply = send(&state, "POST", &uri, &who, Some(json!({ "role": "speaker" }))).await;
  assert_eq!((reply.status, reply.body["outcome"].as_str()), (StatusCode::CREATED, Some("created")));

  let reply = send(&state, "POST", &uri, &who, Some(json!({ "role": "speaker" }))).await;
  assert_eq!((reply.status, reply.body["outcome"].as_str()), (StatusCode::OK, Some("already_exists")));

  let reply = send(&state, "POST", &uri, &who, Some(json!({ "role": "host" }))).await;
  assert_eq!(reply.status, StatusCode::CREATED);

  let speakers = send(&state, "GET", &format!("{uri}?role=speaker"), &[], None).await;
  assert_eq!(speakers.body["items"].as_array().unwrap().len(), 1);
  let everyone = send(&state, "GET", &uri, &[], None).await;
  assert_eq!(everyone.body["items"].as_array().unwrap().len(), 2);
}

// ── Store failures ──────────────────────────────────────────────────────────

// Every call fails, as if the database were unreachable.
struct DownStore;

fn down() -> std::io::Error { std::io::Error::other("connection refused by db-7") }

impl Store for DownStore {
  type Error = std::io::Error;
}

impl InteractionStore for DownStore {
  async fn insert_interaction(&self, _: InteractionRecord) -> Result<InsertOutcome, Self::Error> { Err(down()) }
  async fn delete_interaction(&self, _: InteractionKey) -> Result<bool, Self::Error> { Err(down()) }
  async fn list_interactions(&self, _: ObjectId, _: InteractionFilter, _: PageRequest) -> Result<Vec<InteractionRecord>, Self::Error> { Err(down()) }
  async fn count_interactions(&self, _: ObjectId, _: InteractionFilter) -> Result<u64, Self::Error> { Err(down()) }
}

impl PostStore for DownStore {
  async fn create_post(&self, _: NewPost) -> Result<Post, Self::Error> { Err(down()) }
  async fn get_post(&self, _: ObjectId) -> Result<Option<Post>, Self::Error> { Err(down()) }
  async fn list_posts(&self, _: PageRequest) -> Result<Vec<Post>, Self::Error> { Err(down()) }
  async fn delete_post(&self, _: ObjectId) -> Result<bool, Self::Error> { Err(down()) }
  async fn create_comment(&self, _: NewComment) -> Result<Comment, Self::Error> { Err(down()) }
  async fn get_comment(&self, _: ObjectId) -> Result<Option<Comment>, Self::Error> { Err(down()) }
  async fn list_comments(&self, _: ObjectId, _: PageRequest) -> Result<Vec<Comment>, Self::Error> { Err(down()) }
}

#[tokio::test]
async fn store_failures_are_retryable_503s() {
  let state = ApiState::new(
    Arc::new(DownStore),
    GuardConfig::default(),
    Arc::new(HeaderIdentity),
    ApiConfig::default(),
  );
  let actor = user();

  for (method, uri) in [
    ("GET", "/posts".to_owned()),
    ("POST", format!("/events/{}/participants", user())),
  ] {
    let body = (method == "POST").then(|| json!({ "role": "attendee" }));
    let reply = send(&state, method, &uri, &[(USER_ID_HEADER, actor.as_str())], body).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE, "{method} {uri}");
    assert_eq!(reply.retry_after.as_deref(), Some("1"));
    assert_eq!(reply.body["code"], "unavailable");
    assert!(!reply.body["error"].as_str().unwrap().contains("db-7"));
  }
}
