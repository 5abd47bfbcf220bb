//! Posts and comments: the feed items that get listed and liked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{cursor::Cursor, id::ObjectId, page::Keyed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    ObjectId,
  pub author_id:  ObjectId,
  pub body:       String,
  /// Server-assigned; millisecond precision.
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::PostStore::create_post`]. The id and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id: ObjectId,
  pub body:      String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: ObjectId,
  pub post_id:    ObjectId,
  pub author_id:  ObjectId,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   ObjectId,
  pub author_id: ObjectId,
  pub body:      String,
}

impl Keyed for Post {
  fn sort_key(&self) -> Cursor { Cursor::new(self.created_at, self.post_id) }
}

impl Keyed for Comment {
  fn sort_key(&self) -> Cursor { Cursor::new(self.created_at, self.comment_id) }
}
