use serde::{Deserialize, Serialize};
use std::fmt::Display;
use validator::ValidateError;

use super::form::users::UserForm;

/// Error body sent back to clients. It never carries internal
/// diagnostics, those stay in the server logs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
  Internal,
  InvalidRequest,
  NotFound,
  InvalidFormBody {
    errors: ValidateError,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submitted: Option<UserForm>,
  },
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::Internal => f.write_str("Failed to perform request"),
      Error::InvalidRequest => f.write_str("Request body could not be read"),
      Error::NotFound => f.write_str("User not found"),
      Error::InvalidFormBody { .. } => f.write_str("User performed request with invalid body"),
    }
  }
}
