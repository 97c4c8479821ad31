use error_stack::Report;
use thiserror::Error;
use validator::ValidateError;

#[derive(Debug, Error)]
#[error("Invalid given data occurred")]
pub struct Wrapper;

/// Turns a [`ValidateError`] into a report with one `field: message`
/// attachment per failed rule. Nested fields are joined with dots.
pub trait IntoValidatorReport<T> {
  fn into_validator_report(self) -> error_stack::Result<T, Wrapper>;
}

impl<T> IntoValidatorReport<T> for Result<T, ValidateError> {
  fn into_validator_report(self) -> error_stack::Result<T, Wrapper> {
    self.map_err(|error| {
      let mut path = Vec::new();
      read_errors(&error, &mut path, Report::new(Wrapper))
    })
  }
}

fn read_errors<'a>(
  error: &'a ValidateError,
  path: &mut Vec<&'a str>,
  mut report: Report<Wrapper>,
) -> Report<Wrapper> {
  match error {
    ValidateError::Fields(fields) => {
      for (field, inner) in fields {
        path.push(field.as_ref());
        report = read_errors(inner, path, report);
        path.pop();
      }
    }
    ValidateError::Messages(messages) => {
      let field = path.join(".");
      for message in messages {
        report = report.attach_printable(format!("{field}: {message}"));
      }
    }
  }
  report
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_every_nested_message() {
    let mut root = ValidateError::field_builder();
    root.insert(
      "db",
      ValidateError::single("url", "Invalid Postgres connection URL"),
    );
    root.insert("port", {
      let mut msg = ValidateError::msg_builder();
      msg.insert("must not be zero");
      msg.build()
    });

    let report = Err::<(), _>(root.build()).into_validator_report().unwrap_err();
    let lines = report
      .frames()
      .filter_map(|f| f.downcast_ref::<String>())
      .cloned()
      .collect::<Vec<_>>();

    assert!(lines.contains(&"db.url: Invalid Postgres connection URL".to_string()));
    assert!(lines.contains(&"port: must not be zero".to_string()));
  }
}
