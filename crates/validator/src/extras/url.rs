use url::Url;

/// Whether `value` parses as an absolute URL, connection strings included.
#[must_use]
pub fn validate_url(value: &str) -> bool {
  Url::parse(value).is_ok()
}
