use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroUsize;
use validator::{Validate, ValidateError};

use super::ParseError;
use crate::util::{figment::FigmentErrorAttachable, validator::IntoValidatorReport};

#[derive(Debug, Deserialize)]
pub struct Server {
  /// **Environment variables**:
  /// - `USERBOOK_IP`
  #[serde(default = "Server::default_ip")]
  pub ip: IpAddr,
  /// **Environment variables**:
  /// - `USERBOOK_PORT` or `PORT`
  #[serde(default = "Server::default_port")]
  pub port: u16,
  /// Amount of HTTP workers and runtime threads. Defaults to the
  /// available parallelism of the machine.
  ///
  /// **Environment variables**:
  /// - `USERBOOK_WORKERS`
  #[serde(default = "Server::default_workers")]
  pub workers: NonZeroUsize,
  /// Required unless the server runs with the in-memory store.
  #[serde(default)]
  pub db: Option<super::Database>,
}

impl Server {
  pub fn load() -> Result<Self, ParseError> {
    dotenvy::dotenv().ok();

    let config = Self::figment()
      .extract::<Self>()
      .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    config
      .validate()
      .into_validator_report()
      .change_context(ParseError)?;

    Ok(config)
  }

  /// Configuration used when nothing is set. It has no database.
  #[must_use]
  pub fn with_defaults() -> Self {
    Self {
      ip: Self::default_ip(),
      port: Self::default_port(),
      workers: Self::default_workers(),
      db: None,
    }
  }
}

impl Server {
  const DEFAULT_CONFIG_FILE: &'static str = "userbook.toml";

  const fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  }

  const fn default_port() -> u16 {
    3000
  }

  fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
  }

  /// Creates a [`Figment`] object to load server configuration,
  /// separate from [`Server::load`] for testing.
  ///
  /// [`Figment`]: figment::Figment
  pub(crate) fn figment() -> figment::Figment {
    use figment::{
      providers::{Env, Format, Toml},
      Figment,
    };

    Figment::new()
      .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
      // fields with underscores in them cannot be split blindly
      .merge(Env::prefixed("USERBOOK_").map(|v| match v.as_str() {
        "DB_POOL_SIZE" => "db.pool_size".into(),
        "DB_MIN_IDLE" => "db.min_idle".into(),
        "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
        "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),
        _ => v.as_str().replace('_', ".").into(),
      }))
      // Environment variable aliases
      .merge(
        Env::raw()
          .only(&["DATABASE_URL", "PORT"])
          .map(|v| match v.as_str() {
            "DATABASE_URL" => "db.url".into(),
            _ => v.into(),
          }),
      )
  }
}

impl Validate for Server {
  fn validate(&self) -> std::result::Result<(), ValidateError> {
    let mut fields = ValidateError::field_builder();
    if let Err(error) = self.db.validate() {
      fields.insert("db", error);
    }
    fields.build().into_result()
  }
}
