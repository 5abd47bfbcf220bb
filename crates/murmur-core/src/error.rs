//! Error types for `murmur-core`.

use thiserror::Error;

use crate::cursor::CursorError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid cursor: {0}")]
  InvalidCursor(#[from] CursorError),

  #[error("malformed identifier: {0:?}")]
  MalformedIdentifier(String),

  /// The store rejected or failed the call for a reason other than the
  /// composite-key uniqueness constraint.
  #[error("store call {operation} failed for {key}: {source}")]
  Store {
    operation: &'static str,
    key:       String,
    #[source]
    source:    Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store call {operation} timed out for {key}")]
  StoreTimeout {
    operation: &'static str,
    key:       String,
  },
}

impl Error {
  /// Store failures and timeouts leave no observable state change behind, so
  /// callers may retry them as-is.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Store { .. } | Self::StoreTimeout { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
