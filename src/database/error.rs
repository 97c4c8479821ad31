use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// The configured Postgres connection url could not be parsed.
  #[error("invalid connection url")]
  InvalidUrl,
  /// Any [`sqlx`] error that is not covered by the other variants.
  #[error("received a database error")]
  Internal,
  /// A write was rejected because it would break a unique index.
  #[error("unique constraint violated")]
  UniqueViolation,
  /// The pool could not hand out a working connection in time.
  #[error("unhealthy database pool")]
  UnhealthyPool,
  /// Embedded migrations could not be applied.
  #[error("failed to run database migrations")]
  Migration,
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
  fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
  fn into_db_error(self) -> Result<T> {
    self.map_err(|e| {
      let context = classify(&e);
      Report::new(e).change_context(context)
    })
  }
}

fn classify(error: &sqlx::Error) -> Error {
  match error {
    sqlx::Error::Database(err) if err.is_unique_violation() => Error::UniqueViolation,
    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(..) => {
      Error::UnhealthyPool
    }
    _ => Error::Internal,
  }
}

/// Saves callers from digging through the report themselves:
///
/// ```rust,ignore
/// match pool.get().await {
///   Err(e) if e.is_unhealthy() => { /* fall back or bail */ }
///   ...
/// }
/// ```
pub trait ReportExt {
  fn is_unhealthy(&self) -> bool;
  fn is_unique_violation(&self) -> bool;
}

impl ReportExt for Report<Error> {
  fn is_unhealthy(&self) -> bool {
    matches!(self.current_context(), Error::UnhealthyPool)
  }

  fn is_unique_violation(&self) -> bool {
    matches!(self.current_context(), Error::UniqueViolation)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_pool_failures() {
    let report = Err::<(), _>(sqlx::Error::PoolTimedOut)
      .into_db_error()
      .unwrap_err();
    assert!(report.is_unhealthy());
    assert!(!report.is_unique_violation());

    let report = Err::<(), _>(sqlx::Error::RowNotFound)
      .into_db_error()
      .unwrap_err();
    assert_eq!(report.current_context(), &Error::Internal);
  }
}
