use thiserror::Error;

use crate::types::validation::Violations;

pub mod users;

pub use users::UserService;

/// Failure kinds of the record service.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// Submitted data broke at least one rule. The store was not touched.
  #[error("submitted user data is invalid")]
  ValidationFailed(Violations),
  /// No record exists with the requested id.
  #[error("user not found")]
  NotFound,
  /// The store failed or rejected the write (duplicate email included).
  #[error("user store could not complete the operation")]
  Store,
}

impl ServiceError {
  #[must_use]
  pub fn violations(&self) -> Option<&Violations> {
    match self {
      ServiceError::ValidationFailed(violations) => Some(violations),
      ServiceError::NotFound | ServiceError::Store => None,
    }
  }
}

pub type Result<T> = error_stack::Result<T, ServiceError>;
