use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::Display;
use validator::ValidateError;

use super::form::users::UserForm;

#[allow(clippy::expect_used)]
static EMAIL_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("compile email regex"));

#[allow(clippy::expect_used)]
static IMAGE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(https?://.*\.(?:png|jpg|jpeg|gif))$").expect("compile image url regex")
});

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_INVALID: &str = "Valid email is required";
pub const IMAGE_INVALID: &str = "Image URL must be valid";

/// Matches `local@domain.tld`-shaped addresses. Nothing is
/// trimmed or lowercased beforehand.
pub fn is_valid_email(email: &str) -> bool {
  EMAIL_REGEX.is_match(email)
}

/// Only absolute http(s) links ending in a png, jpg, jpeg or gif
/// extension (case-insensitive) are accepted.
pub fn is_valid_image_url(url: &str) -> bool {
  IMAGE_URL_REGEX.is_match(url)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  Name,
  Email,
  Image,
}

impl Field {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Field::Name => "name",
      Field::Email => "email",
      Field::Image => "image",
    }
  }
}

impl Display for Field {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A single broken rule of a submitted user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Violation {
  pub field: Field,
  pub message: &'static str,
}

/// Every rule a submitted user broke, in field order
/// (`name`, `email`, then `image`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[must_use]
  pub fn contains(&self, field: Field) -> bool {
    self.0.iter().any(|v| v.field == field)
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
    self.0.iter()
  }

  #[must_use]
  pub fn into_vec(self) -> Vec<Violation> {
    self.0
  }
}

impl<'a> IntoIterator for &'a Violations {
  type Item = &'a Violation;
  type IntoIter = std::slice::Iter<'a, Violation>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

impl From<&Violations> for ValidateError {
  fn from(violations: &Violations) -> Self {
    let mut fields = ValidateError::field_builder();
    for violation in violations {
      let mut msg = ValidateError::msg_builder();
      msg.insert(violation.message);
      fields.insert(violation.field.as_str(), msg.build());
    }
    fields.build()
  }
}

/// Checks a submitted user against every rule at once.
///
/// Rules do not short-circuit: a form with an empty name and a
/// malformed email yields two violations. An absent or empty
/// `image` is never a violation.
#[must_use]
pub fn check_user(form: &UserForm) -> Violations {
  let mut violations = Vec::new();

  if form.name.as_deref().map_or(true, str::is_empty) {
    violations.push(Violation {
      field: Field::Name,
      message: NAME_REQUIRED,
    });
  }

  if !form.email.as_deref().is_some_and(is_valid_email) {
    violations.push(Violation {
      field: Field::Email,
      message: EMAIL_INVALID,
    });
  }

  if let Some(image) = form.image.as_deref().filter(|v| !v.is_empty()) {
    if !is_valid_image_url(image) {
      violations.push(Violation {
        field: Field::Image,
        message: IMAGE_INVALID,
      });
    }
  }

  Violations(violations)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(name: Option<&str>, email: Option<&str>, image: Option<&str>) -> UserForm {
    UserForm {
      name: name.map(String::from),
      email: email.map(String::from),
      image: image.map(String::from),
    }
  }

  #[test]
  fn test_is_valid_email() {
    assert!(is_valid_email("ann@x.com"));
    assert!(is_valid_email("first.last+tag@mail.example.org"));
    assert!(is_valid_email("ANN@X.COM"));

    assert!(!is_valid_email("bad"));
    assert!(!is_valid_email("ann@x"));
    assert!(!is_valid_email("ann x@y.com"));
    assert!(!is_valid_email("@x.com"));
    assert!(!is_valid_email("ann@@x.com"));
    assert!(!is_valid_email(" ann@x.com"));
    assert!(!is_valid_email(""));
  }

  #[test]
  fn test_is_valid_image_url() {
    assert!(is_valid_image_url("http://example.com/a.png"));
    assert!(is_valid_image_url("https://cdn.example.com/u/1/avatar.jpeg"));
    assert!(is_valid_image_url("HTTPS://EXAMPLE.COM/A.GIF"));
    assert!(is_valid_image_url("https://example.com/photo.JpG"));

    assert!(!is_valid_image_url("ftp://example.com/a.png"));
    assert!(!is_valid_image_url("https://example.com/a.webp"));
    assert!(!is_valid_image_url("https://example.com/a.png?size=2"));
    assert!(!is_valid_image_url("example.com/a.png"));
    assert!(!is_valid_image_url("not a url"));
  }

  #[test]
  fn accepts_valid_user() {
    assert!(check_user(&form(Some("Ann"), Some("ann@x.com"), None)).is_empty());
    assert!(check_user(&form(Some("Ann"), Some("ann@x.com"), Some(""))).is_empty());
    assert!(check_user(&form(
      Some("Ann"),
      Some("ann@x.com"),
      Some("https://example.com/ann.png")
    ))
    .is_empty());
  }

  #[test]
  fn name_is_checked_without_trimming() {
    let violations = check_user(&form(None, Some("ann@x.com"), None));
    assert_eq!(
      violations.into_vec(),
      vec![Violation {
        field: Field::Name,
        message: NAME_REQUIRED
      }]
    );

    assert!(check_user(&form(Some(""), Some("ann@x.com"), None)).contains(Field::Name));
    assert!(!check_user(&form(Some("   "), Some("ann@x.com"), None)).contains(Field::Name));
  }

  #[test]
  fn reports_every_violation_in_field_order() {
    let violations = check_user(&form(Some(""), Some("bad"), Some("ftp://x/y.txt")));
    let fields = violations.iter().map(|v| v.field).collect::<Vec<_>>();
    assert_eq!(fields, vec![Field::Name, Field::Email, Field::Image]);

    let messages = violations.iter().map(|v| v.message).collect::<Vec<_>>();
    assert_eq!(messages, vec![NAME_REQUIRED, EMAIL_INVALID, IMAGE_INVALID]);
  }

  #[test]
  fn missing_email_is_a_violation() {
    let violations = check_user(&form(Some("Ann"), None, None));
    assert_eq!(violations.len(), 1);
    assert!(violations.contains(Field::Email));
  }

  #[test]
  fn converts_into_field_errors() {
    let violations = check_user(&form(Some(""), Some("bad"), None));
    let error = ValidateError::from(&violations);
    assert_eq!(
      error.messages_of("name").map(|m| m.join(", ")),
      Some(NAME_REQUIRED.to_string())
    );
    assert_eq!(
      error.messages_of("email").map(|m| m.join(", ")),
      Some(EMAIL_INVALID.to_string())
    );
    assert!(error.messages_of("image").is_none());
  }
}
