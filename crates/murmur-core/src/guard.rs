//! The idempotent interaction guard.
//!
//! [`InteractionGuard::apply`] inserts first and interprets a uniqueness
//! conflict afterwards. Nothing is read before the insert: the store's
//! composite-key constraint is the only arbiter of "at most one", even for
//! concurrent identical requests from several server processes.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
  Error, Result,
  interaction::{DuplicatePolicy, InsertOutcome, InteractionKey, InteractionRecord, Outcome},
  store::InteractionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
  /// Upper bound on a single store call. Expiry is reported as
  /// [`Error::StoreTimeout`], never as a guessed outcome.
  pub store_timeout: Duration,
}

impl Default for GuardConfig {
  fn default() -> Self { Self { store_timeout: Duration::from_secs(5) } }
}

/// Run one store call under `timeout`, attaching the operation name and key to
/// any failure.
pub async fn bounded<T, E, F>(
  timeout: Duration,
  operation: &'static str,
  key: impl Display,
  call: F,
) -> Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(timeout, call).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(source)) => {
      warn!(operation, key = %key, error = %source, "store call failed");
      Err(Error::Store { operation, key: key.to_string(), source: Box::new(source) })
    }
    Err(_) => {
      warn!(operation, key = %key, ?timeout, "store call timed out");
      Err(Error::StoreTimeout { operation, key: key.to_string() })
    }
  }
}

pub struct InteractionGuard<S> {
  store:  Arc<S>,
  config: GuardConfig,
}

impl<S> Clone for InteractionGuard<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), config: self.config } }
}

impl<S: InteractionStore> InteractionGuard<S> {
  pub fn new(store: Arc<S>, config: GuardConfig) -> Self { Self { store, config } }

  pub fn config(&self) -> &GuardConfig { &self.config }

  /// Apply the interaction named by `key`.
  ///
  /// | state before | policy       | write  | result            |
  /// |--------------|--------------|--------|-------------------|
  /// | absent       | any          | insert | `Created`         |
  /// | present      | `Toggle`     | delete | `ToggledOff`      |
  /// | present      | `AppendOnce` | none   | `AlreadyExists`   |
  pub async fn apply(&self, key: InteractionKey) -> Result<Outcome> {
    let record = InteractionRecord::new(key);
    let timeout = self.config.store_timeout;

    let inserted = bounded(
      timeout,
      "insert_interaction",
      key,
      self.store.insert_interaction(record),
    )
    .await?;

    match inserted {
      InsertOutcome::Inserted => {
        debug!(%key, "interaction created");
        Ok(Outcome::Created)
      }
      InsertOutcome::Conflict => match key.kind.policy() {
        DuplicatePolicy::AppendOnce => {
          debug!(%key, "interaction already present");
          Ok(Outcome::AlreadyExists)
        }
        DuplicatePolicy::Toggle => {
          let removed = bounded(
            timeout,
            "delete_interaction",
            key,
            self.store.delete_interaction(key),
          )
          .await?;
          if removed {
            debug!(%key, "interaction toggled off");
          } else {
            // A concurrent toggle got there first; the relation is absent
            // either way.
            debug!(%key, "interaction already removed by a concurrent toggle");
          }
          Ok(Outcome::ToggledOff)
        }
      },
    }
  }
}
