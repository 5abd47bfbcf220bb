//! Query parameters shared by every keyset listing.
//!
//! `?cursor=<token>&limit=<n>`. A missing cursor starts from the newest
//! item; a present but undecodable one is a 400, never a silent restart.

use murmur_core::{Cursor, ObjectId, page::PageRequest};
use serde::Deserialize;

use crate::{ApiConfig, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub cursor: Option<String>,
  pub limit:  Option<usize>,
}

impl ListParams {
  pub fn page_request(&self, config: &ApiConfig) -> Result<PageRequest, ApiError> {
    page_request(self.cursor.as_deref(), self.limit, config)
  }
}

pub fn page_request(
  cursor: Option<&str>,
  limit: Option<usize>,
  config: &ApiConfig,
) -> Result<PageRequest, ApiError> {
  let after = Cursor::decode_optional(cursor)?;
  Ok(PageRequest::clamped(after, limit, config.default_page_size, config.max_page_size))
}

/// Parse an id taken from the path or a body before it reaches the store.
pub fn parse_id(raw: &str) -> Result<ObjectId, ApiError> { Ok(ObjectId::parse_str(raw)?) }

#[cfg(test)]
mod tests {
  use murmur_core::CursorError;

  use super::*;

  #[test]
  fn absent_cursor_starts_at_the_top() {
    let request = ListParams::default().page_request(&ApiConfig::default()).unwrap();
    assert_eq!(request.after, None);
    assert_eq!(request.limit, ApiConfig::default().default_page_size);
  }

  #[test]
  fn limits_are_clamped() {
    let config = ApiConfig { default_page_size: 20, max_page_size: 50 };
    assert_eq!(page_request(None, Some(1000), &config).unwrap().limit, 50);
    assert_eq!(page_request(None, Some(0), &config).unwrap().limit, 1);
  }

  #[test]
  fn bad_cursor_is_rejected() {
    let err = page_request(Some("***"), None, &ApiConfig::default()).unwrap_err();
    assert!(matches!(err, ApiError::InvalidCursor(CursorError::Encoding(_))));
  }

  #[test]
  fn ids_are_validated() {
    assert!(matches!(parse_id("nope"), Err(ApiError::MalformedIdentifier(_))));
    assert!(parse_id("65f0a1b2c3d4e5f601234567").is_ok());
  }
}
