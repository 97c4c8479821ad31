use indexmap::IndexMap;
use serde::{ser::SerializeMap, Serialize};
use std::borrow::Cow;

/// Collects the messages reported for a single field.
pub struct MessageBuilder(Vec<Cow<'static, str>>);

impl MessageBuilder {
  #[must_use]
  pub const fn new() -> Self {
    Self(Vec::new())
  }

  pub fn insert(&mut self, message: impl Into<Cow<'static, str>>) {
    self.0.push(message.into());
  }

  #[must_use]
  pub fn build(self) -> ValidateError {
    ValidateError::Messages(self.0)
  }
}

/// Collects field errors in insertion order. Empty errors are skipped
/// so a field is only present if something is wrong with it.
pub struct FieldBuilder(IndexMap<Cow<'static, str>, ValidateError>);

#[allow(clippy::new_without_default)]
impl FieldBuilder {
  #[must_use]
  pub fn new() -> Self {
    Self(IndexMap::default())
  }

  pub fn insert(&mut self, key: impl Into<Cow<'static, str>>, value: ValidateError) {
    if value.is_empty() {
      return;
    }

    let key = key.into();
    if let ValidateError::Messages(extra) = &value {
      if let Some(ValidateError::Messages(existing)) = self.0.get_mut(&key) {
        existing.extend(extra.iter().cloned());
        return;
      }
    }
    self.0.insert(key, value);
  }

  #[must_use]
  pub fn build(self) -> ValidateError {
    ValidateError::Fields(self.0)
  }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ValidateError {
  Fields(IndexMap<Cow<'static, str>, ValidateError>),
  Messages(Vec<Cow<'static, str>>),
}

impl std::fmt::Display for ValidateError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("Invalid data occurred")
  }
}

impl std::error::Error for ValidateError {}

impl std::fmt::Debug for ValidateError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ValidateError::Fields(n) => n.fmt(f),
      ValidateError::Messages(n) => f.debug_map().entry(&"_errors", &n).finish(),
    }
  }
}

impl ValidateError {
  #[must_use]
  pub fn field_builder() -> FieldBuilder {
    FieldBuilder::new()
  }

  #[must_use]
  pub fn msg_builder() -> MessageBuilder {
    MessageBuilder::new()
  }

  /// Shorthand for an error with exactly one message under `field`.
  #[must_use]
  pub fn single(field: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
    let mut msg = Self::msg_builder();
    msg.insert(message);

    let mut fields = Self::field_builder();
    fields.insert(field, msg.build());
    fields.build()
  }
}

impl ValidateError {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    match self {
      ValidateError::Fields(n) => n.is_empty(),
      ValidateError::Messages(n) => n.is_empty(),
    }
  }

  /// Messages reported directly under `field`, if any.
  #[must_use]
  pub fn messages_of(&self, field: &str) -> Option<&[Cow<'static, str>]> {
    match self {
      ValidateError::Fields(fields) => match fields.get(field) {
        Some(ValidateError::Messages(messages)) => Some(messages.as_slice()),
        _ => None,
      },
      ValidateError::Messages(..) => None,
    }
  }

  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl<'de> serde::Deserialize<'de> for ValidateError {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    struct Visitor;

    impl<'de> serde::de::Visitor<'de> for Visitor {
      type Value = ValidateError;

      fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ValidateError type")
      }

      fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
      where
        A: serde::de::MapAccess<'de>,
      {
        let mut fields = IndexMap::new();
        let mut messages = None;

        while let Some(key) = map.next_key::<String>()? {
          if key == "_errors" {
            if messages.is_some() {
              return Err(serde::de::Error::duplicate_field("_errors"));
            }
            messages = Some(map.next_value::<Vec<Cow<'static, str>>>()?);
          } else {
            fields.insert(Cow::Owned(key), map.next_value()?);
          }
        }

        if let Some(data) = messages {
          Ok(ValidateError::Messages(data))
        } else if !fields.is_empty() {
          Ok(ValidateError::Fields(fields))
        } else {
          Err(serde::de::Error::custom("error fields must not be empty"))
        }
      }
    }

    deserializer.deserialize_map(Visitor)
  }
}

impl Serialize for ValidateError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    match self {
      ValidateError::Fields(n) => {
        let mut map = serializer.serialize_map(Some(n.len()))?;
        for (key, value) in n {
          map.serialize_entry(key, value)?;
        }
        map.end()
      }
      ValidateError::Messages(n) => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("_errors", &n)?;
        map.end()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::Validate;

  use super::*;
  use serde_test::Token;

  #[derive(Debug)]
  struct Contact {
    name: &'static str,
    phone: &'static str,
  }

  impl Validate for Contact {
    fn validate(&self) -> Result<(), ValidateError> {
      let mut fields = ValidateError::field_builder();
      fields.insert("name", {
        let mut msg = ValidateError::msg_builder();
        if self.name.is_empty() {
          msg.insert("Name is empty");
        }
        msg.build()
      });
      fields.insert("phone", {
        let mut msg = ValidateError::msg_builder();
        if self.phone.is_empty() {
          msg.insert("Phone is empty");
        }
        if !self.phone.chars().all(|c| c.is_ascii_digit()) {
          msg.insert("Phone must only contain digits");
        }
        msg.build()
      });
      fields.build().into_result()
    }
  }

  #[test]
  fn test_debug_fmt() {
    const EXPECTED_FMT_MSG: &str =
      r#"{"name": {"_errors": ["Name is empty"]}, "phone": {"_errors": ["Phone must only contain digits"]}}"#;

    let error = Contact { name: "", phone: "12a" }.validate().unwrap_err();
    assert_eq!(EXPECTED_FMT_MSG, format!("{error:?}"));
  }

  #[test]
  fn test_passing_value() {
    assert!(Contact { name: "Ann", phone: "555" }.validate().is_ok());
    assert!(None::<Contact>.validate().is_ok());
  }

  #[test]
  fn test_serde_impl() {
    let error = Contact { name: "", phone: "" }.validate().unwrap_err();
    serde_test::assert_tokens(
      &error,
      &[
        Token::Map { len: Some(2) },
        Token::Str("name"),
        Token::Map { len: Some(1) },
        Token::Str("_errors"),
        Token::Seq { len: Some(1) },
        Token::Str("Name is empty"),
        Token::SeqEnd,
        Token::MapEnd,
        Token::Str("phone"),
        Token::Map { len: Some(1) },
        Token::Str("_errors"),
        Token::Seq { len: Some(1) },
        Token::Str("Phone is empty"),
        Token::SeqEnd,
        Token::MapEnd,
        Token::MapEnd,
      ],
    );
  }

  #[test]
  fn test_repeated_field_merges_messages() {
    let mut fields = FieldBuilder::new();
    for message in ["first", "second"] {
      let mut msg = MessageBuilder::new();
      msg.insert(message);
      fields.insert("email", msg.build());
    }

    let error = fields.build();
    let messages = error.messages_of("email").unwrap();
    assert_eq!(messages, &["first", "second"]);
    assert!(error.messages_of("name").is_none());
  }

  #[test]
  fn validate_error_is_empty() {
    assert!(MessageBuilder::new().build().is_empty());
    assert!(FieldBuilder::new().build().is_empty());

    let mut msg = MessageBuilder::new();
    msg.insert("Hello world!");
    assert!(!msg.build().is_empty());

    let mut err = FieldBuilder::new();
    err.insert("microbar", MessageBuilder::new().build());
    assert!(err.build().is_empty());

    assert!(!ValidateError::single("name", "Name is required").is_empty());
  }
}
