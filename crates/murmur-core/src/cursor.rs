//! Opaque keyset-pagination cursors.
//!
//! A [`Cursor`] is the `(timestamp, id)` sort key of the last item on a page.
//! On the wire it is compact JSON (`{"ts":<millis>,"id":"<hex>"}`) wrapped in
//! unpadded URL-safe base64. The encoding carries no nonce, so the same
//! position always yields the same token.
//!
//! Clients must treat the token as opaque. Decoding validates structure only;
//! it is not an integrity check.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

use crate::id::ObjectId;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a cursor token was rejected. Each variant is a distinct condition;
/// none of them is ever coerced into "start of list".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
  #[error("cursor is not url-safe base64: {0}")]
  Encoding(#[from] base64::DecodeError),

  #[error("cursor payload is malformed: {0}")]
  Structure(String),

  #[error("cursor id is not a valid identifier: {0:?}")]
  Identifier(String),
}

// ─── Wire form ───────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Wire {
  ts: i64,
  id: String,
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// A resume point in a listing ordered by `(timestamp DESC, id DESC)`.
///
/// The derived ordering compares `timestamp` first and `id` second, which is
/// exactly the ascending form of the listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
  /// Millisecond-precision sort key.
  pub timestamp: DateTime<Utc>,
  /// Tie-breaker for records sharing a timestamp.
  pub id:        ObjectId,
}

impl Cursor {
  /// Build a cursor, truncating `timestamp` to millisecond precision so the
  /// value survives an encode/decode round-trip unchanged.
  pub fn new(timestamp: DateTime<Utc>, id: ObjectId) -> Self {
    Self { timestamp: timestamp.trunc_subsecs(3), id }
  }

  /// Build a cursor from a stored millisecond timestamp. `None` if the value
  /// is outside the representable range.
  pub fn from_millis(millis: i64, id: ObjectId) -> Option<Self> {
    DateTime::from_timestamp_millis(millis).map(|timestamp| Self { timestamp, id })
  }

  pub fn millis(&self) -> i64 { self.timestamp.timestamp_millis() }

  /// Serialise into an opaque, URL-safe token.
  pub fn encode(&self) -> String {
    let wire = Wire { ts: self.millis(), id: self.id.to_hex() };
    // A struct of an integer and a string always serialises.
    let json = serde_json::to_vec(&wire).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
  }

  /// Parse a token produced by [`Cursor::encode`].
  pub fn decode(token: &str) -> Result<Self, CursorError> {
    let bytes = URL_SAFE_NO_PAD.decode(token)?;
    let wire: Wire = serde_json::from_slice(&bytes)
      .map_err(|e| CursorError::Structure(e.to_string()))?;
    let id = ObjectId::parse_str(&wire.id)
      .map_err(|_| CursorError::Identifier(wire.id.clone()))?;
    let cursor = Self::from_millis(wire.ts, id).ok_or_else(|| {
      CursorError::Structure(format!("timestamp {} is out of range", wire.ts))
    })?;
    // Only the exact bytes `encode` emits are accepted, so two distinct tokens
    // can never name the same position.
    if cursor.encode() != token {
      return Err(CursorError::Structure("token is not in canonical form".into()));
    }
    Ok(cursor)
  }

  /// Decode an optional query parameter. Absence means "no lower bound" and is
  /// not an error; a present but invalid token is.
  pub fn decode_optional(token: Option<&str>) -> Result<Option<Self>, CursorError> {
    token.map(Self::decode).transpose()
  }

  /// The resume predicate: does `candidate` come strictly after `self` in a
  /// descending listing?
  ///
  /// `candidate.timestamp < self.timestamp`, or equal timestamps and
  /// `candidate.id < self.id`.
  pub fn admits(&self, candidate: &Cursor) -> bool {
    candidate.timestamp < self.timestamp
      || (candidate.timestamp == self.timestamp && candidate.id < self.id)
  }
}

impl fmt::Display for Cursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.encode())
  }
}

impl FromStr for Cursor {
  type Err = CursorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::decode(s) }
}

impl Serialize for Cursor {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.encode())
  }
}

impl<'de> Deserialize<'de> for Cursor {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let token = String::deserialize(deserializer)?;
    Self::decode(&token).map_err(de::Error::custom)
  }
}
