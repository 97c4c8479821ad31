use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateError};

use crate::types::validation;

/// User data submitted to create or replace a record.
///
/// Every field is optional here so a missing field turns into a
/// violation instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserForm {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
}

impl UserForm {
  #[must_use]
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      email: Some(email.into()),
      image: None,
    }
  }

  #[must_use]
  pub fn with_image(mut self, image: impl Into<String>) -> Self {
    self.image = Some(image.into());
    self
  }

  /// The submitted image, where an empty string counts as no image.
  #[must_use]
  pub fn image(&self) -> Option<&str> {
    self.image.as_deref().filter(|v| !v.is_empty())
  }
}

impl Validate for UserForm {
  fn validate(&self) -> Result<(), ValidateError> {
    ValidateError::from(&validation::check_user(self)).into_result()
  }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_impl() {
    assert!(UserForm::new("Ann", "ann@x.com").validate().is_ok());
    assert!(UserForm::new("Ann", "ann@x.com")
      .with_image("https://example.com/ann.gif")
      .validate()
      .is_ok());

    let error = UserForm::new("", "bad").validate().unwrap_err();
    assert!(error.messages_of("name").is_some());
    assert!(error.messages_of("email").is_some());

    let error = UserForm::new("Ann", "ann@x.com")
      .with_image("https://example.com/ann.svg")
      .validate()
      .unwrap_err();
    assert!(error.messages_of("image").is_some());
  }

  #[test]
  fn empty_image_counts_as_absent() {
    assert_eq!(UserForm::new("Ann", "ann@x.com").with_image("").image(), None);
    assert_eq!(
      UserForm::new("Ann", "ann@x.com").with_image("http://a.b/c.png").image(),
      Some("http://a.b/c.png")
    );
  }

  #[test]
  fn missing_fields_deserialize() {
    let form: UserForm = serde_json::from_str(r#"{"email":"ann@x.com"}"#).unwrap();
    assert_eq!(form.name, None);
    assert_eq!(form.email.as_deref(), Some("ann@x.com"));
    assert_eq!(form.image, None);
  }
}
