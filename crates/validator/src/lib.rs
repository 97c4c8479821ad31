#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;

pub use error::*;
pub mod extras;

/// Checks a value and reports every problem found in it at once.
pub trait Validate {
  fn validate(&self) -> Result<(), ValidateError>;
}

impl<T: Validate> Validate for Option<T> {
  fn validate(&self) -> Result<(), ValidateError> {
    match self {
      Some(inner) => inner.validate(),
      None => Ok(()),
    }
  }
}
