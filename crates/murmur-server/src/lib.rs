//! Composition root for the Murmur server.
//!
//! Turns a [`ServerConfig`] into one store handle and the router that
//! serves it. The binary in `main.rs` only adds argument parsing, logging
//! and the listener.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use murmur_api::{ApiConfig, ApiState, HeaderIdentity, api_router};
use murmur_core::{guard::GuardConfig, store::FeedStore};
use murmur_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MURMUR_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// SQLite file; `:memory:` keeps everything in process memory.
  pub store_path:        PathBuf,
  pub store_timeout_ms:  u64,
  pub default_page_size: usize,
  pub max_page_size:     usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let api = ApiConfig::default();
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      store_path:        PathBuf::from("murmur.db"),
      store_timeout_ms:  GuardConfig::default().store_timeout.as_millis() as u64,
      default_page_size: api.default_page_size,
      max_page_size:     api.max_page_size,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn guard_config(&self) -> GuardConfig {
    GuardConfig { store_timeout: Duration::from_millis(self.store_timeout_ms.max(1)) }
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      default_page_size: self.default_page_size.max(1),
      max_page_size:     self.max_page_size.max(1),
    }
  }
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// Open the configured store.
pub async fn open_store(config: &ServerConfig) -> murmur_store_sqlite::Result<SqliteStore> {
  if config.store_path.as_os_str() == ":memory:" {
    return SqliteStore::open_in_memory().await;
  }
  SqliteStore::open(expand_tilde(&config.store_path)).await
}

/// Build the application router: the API under `/api`, traced.
pub fn build_app<S: FeedStore>(store: Arc<S>, config: &ServerConfig) -> Router {
  let state = ApiState::new(
    store,
    config.guard_config(),
    Arc::new(HeaderIdentity),
    config.api_config(),
  );
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
