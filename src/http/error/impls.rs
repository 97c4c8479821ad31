use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;
use validator::ValidateError;

use super::Error;
use crate::{services::ServiceError, types::Error as ErrorType};

impl actix_web::ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self.error_type {
      ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      ErrorType::NotFound => StatusCode::NOT_FOUND,
      ErrorType::InvalidRequest | ErrorType::InvalidFormBody { .. } => StatusCode::BAD_REQUEST,
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    HttpResponse::build(self.status_code()).json(&self.error_type)
  }
}

impl From<Report<ServiceError>> for Error {
  fn from(value: Report<ServiceError>) -> Self {
    let error_type = match value.current_context() {
      ServiceError::ValidationFailed(violations) => ErrorType::InvalidFormBody {
        errors: ValidateError::from(violations),
        submitted: None,
      },
      ServiceError::NotFound => ErrorType::NotFound,
      ServiceError::Store => {
        tracing::error!(report = ?value, "user store failed");
        ErrorType::Internal
      }
    };
    Error::from_report(error_type, value)
  }
}
