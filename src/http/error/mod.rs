use error_stack::{Context, Report};
use thiserror::Error as ThisError;
use tracing_error::SpanTrace;

use crate::types::{self, form::users::UserForm};

mod impls;

pub type Result<T> = std::result::Result<T, Error>;

/// Context every report ends up under once it reaches the HTTP layer.
#[derive(Debug, ThisError)]
#[error("Failed to handle request")]
pub struct RequestFailed;

/// An error sent back to the client as [`types::Error`] while the
/// full report and span trace stay on the server side.
pub struct Error {
  error_type: types::Error,
  report: Report<RequestFailed>,
  trace: SpanTrace,
}

impl Error {
  #[must_use]
  pub fn from_context(error_type: types::Error, context: impl Context) -> Self {
    Self::from_report(error_type, Report::new(context))
  }

  #[must_use]
  pub fn from_report<C: Context>(error_type: types::Error, report: Report<C>) -> Self {
    Self {
      error_type,
      report: report.change_context(RequestFailed),
      trace: SpanTrace::capture(),
    }
  }
}

impl Error {
  #[must_use]
  pub fn as_type(&self) -> &types::Error {
    &self.error_type
  }

  #[must_use]
  pub fn report(&self) -> &Report<RequestFailed> {
    &self.report
  }

  #[must_use]
  pub fn downcast_ref<F: Context>(&self) -> Option<&F> {
    self.report.downcast_ref::<F>()
  }

  /// Echoes the submitted form back with validation errors so the
  /// client can re-populate it. Other error types are left as is.
  #[must_use]
  pub fn with_submitted(mut self, form: UserForm) -> Self {
    if let types::Error::InvalidFormBody { submitted, .. } = &mut self.error_type {
      *submitted = Some(form);
    }
    self
  }
}

impl std::fmt::Debug for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Error")
      .field("type", &self.error_type)
      .field("report", &self.report)
      .field("trace", &self.trace)
      .finish()
  }
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: ", &self.error_type)?;
    writeln!(f, "{:?}", self.report)?;
    std::fmt::Display::fmt(&self.trace, f)
  }
}
