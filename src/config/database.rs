use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};
use validator::{Validate, ValidateError};

use crate::util::Sensitive;

/// Configuration for connecting to the Postgres database holding
/// the user records.
#[derive(Debug, Deserialize)]
pub struct Database {
  /// Connection URL of the Postgres database.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_DB_URL` or `DATABASE_URL`
  pub url: Sensitive<String>,
  /// Maximum amount of connections the pool may open.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_DB_POOL_SIZE`
  #[serde(default = "Database::default_pool_size")]
  pub pool_size: NonZeroU32,
  /// Connections kept open even when there is nothing to do.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_DB_MIN_IDLE`
  #[serde(default)]
  pub min_idle: Option<NonZeroU32>,
  /// Prefer TLS encrypted connections when the server offers them.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_DB_ENFORCE_TLS`
  #[serde(default = "Database::default_enforce_tls")]
  pub enforce_tls: bool,
  /// How long to wait for a connection before giving up.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_DB_TIMEOUT_SECS`
  #[serde(default = "Database::default_timeout_secs")]
  pub timeout_secs: NonZeroU64,
}

impl Database {
  const DEFAULT_POOL_SIZE: u32 = 5;
  const DEFAULT_TIMEOUT_SECS: u64 = 5;

  // Required by serde
  const fn default_pool_size() -> NonZeroU32 {
    match NonZeroU32::new(Self::DEFAULT_POOL_SIZE) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
    }
  }

  const fn default_timeout_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_TIMEOUT_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_TIMEOUT_SECS is accidentally set to 0"),
    }
  }

  const fn default_enforce_tls() -> bool {
    true
  }

  /// Settings for the given URL with every other field defaulted.
  #[must_use]
  pub fn with_url(url: impl Into<String>) -> Self {
    Self {
      url: Sensitive::new(url.into()),
      pool_size: Self::default_pool_size(),
      min_idle: None,
      enforce_tls: Self::default_enforce_tls(),
      timeout_secs: Self::default_timeout_secs(),
    }
  }
}

impl Validate for Database {
  fn validate(&self) -> Result<(), ValidateError> {
    let mut fields = ValidateError::field_builder();

    if !validator::extras::validate_url(self.url.as_str()) {
      let mut msg = ValidateError::msg_builder();
      msg.insert("Invalid Postgres connection URL");
      fields.insert("url", msg.build());
    }

    if self.min_idle.is_some_and(|n| n > self.pool_size) {
      let mut msg = ValidateError::msg_builder();
      msg.insert("Must not be greater than pool_size");
      fields.insert("min_idle", msg.build());
    }

    fields.build().into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_impl() {
    assert!(Database::with_url("postgres://localhost/userbook")
      .validate()
      .is_ok());

    let error = Database::with_url("nope").validate().unwrap_err();
    assert!(error.messages_of("url").is_some());

    let mut db = Database::with_url("postgres://localhost/userbook");
    db.min_idle = NonZeroU32::new(10);
    let error = db.validate().unwrap_err();
    assert!(error.messages_of("min_idle").is_some());
    assert!(error.messages_of("url").is_none());
  }
}
