use actix_web::{
  body::MessageBody,
  dev::{ServiceRequest, ServiceResponse},
  error::{JsonPayloadError, PathError, UrlencodedError},
  HttpRequest,
};
use thiserror::Error as ThisError;
use tracing::{Level, Span};
use tracing_actix_web::{root_span, DefaultRootSpanBuilder, RootSpanBuilder};

use super::Error;
use crate::types::Error as ErrorType;

/// Same as [`DefaultRootSpanBuilder`] but request spans are emitted
/// at `DEBUG` so a production `info` filter stays quiet.
pub struct QuieterRootSpanBuilder;

impl RootSpanBuilder for QuieterRootSpanBuilder {
  fn on_request_start(request: &ServiceRequest) -> Span {
    root_span!(level = Level::DEBUG, request)
  }

  fn on_request_end<B: MessageBody>(
    span: Span,
    outcome: &Result<ServiceResponse<B>, actix_web::Error>,
  ) {
    DefaultRootSpanBuilder::on_request_end(span, outcome);
  }
}

#[derive(Debug, ThisError)]
#[error("Could not read request body: {0}")]
pub struct InvalidBody(String);

#[derive(Debug, ThisError)]
#[error("Could not read request path: {0}")]
pub struct InvalidPath(String);

#[derive(Debug, ThisError)]
#[error("No route matches the request")]
pub struct NoRoute;

pub fn json_error_handler(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  Error::from_context(ErrorType::InvalidRequest, InvalidBody(error.to_string())).into()
}

pub fn form_error_handler(error: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
  Error::from_context(ErrorType::InvalidRequest, InvalidBody(error.to_string())).into()
}

pub fn path_error_handler(error: PathError, _req: &HttpRequest) -> actix_web::Error {
  Error::from_context(ErrorType::NotFound, InvalidPath(error.to_string())).into()
}

pub async fn not_found() -> Result<actix_web::HttpResponse, Error> {
  Err(Error::from_context(ErrorType::NotFound, NoRoute))
}
