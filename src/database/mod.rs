use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::migrate::Migrator;
use std::{str::FromStr, time::Duration};

use crate::config;

pub mod error;
pub use error::{Error, ErrorExt, ReportExt, Result};

pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;
pub type Connection = sqlx::PgConnection;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A Postgres connection pool.
///
/// Connections are opened lazily, a pool that cannot reach the
/// database yet is still handed out so the server can start and
/// recover once the database comes back.
#[derive(Clone)]
pub struct Pool {
  pool: sqlx::PgPool,
}

impl Pool {
  #[tracing::instrument(name = "db.connect_pool", skip_all)]
  pub async fn new(cfg: &config::Database) -> Result<Self> {
    let mut pool_opts = PgPoolOptions::new()
      .acquire_timeout(Duration::from_secs(cfg.timeout_secs.get()))
      .max_connections(cfg.pool_size.get());

    if let Some(min_idle) = cfg.min_idle {
      pool_opts = pool_opts.min_connections(min_idle.get());
    }

    let mut connect_opts = PgConnectOptions::from_str(cfg.url.as_str())
      .change_context(Error::InvalidUrl)
      .attach_printable("could not parse `db.url`")?;

    if cfg.enforce_tls {
      connect_opts = connect_opts.ssl_mode(PgSslMode::Prefer);
    }

    let pool = Self {
      pool: pool_opts.connect_lazy_with(connect_opts),
    };

    match pool.wait_until_healthy().await {
      Ok(..) => {}
      Err(err) if err.is_unhealthy() => {
        tracing::warn!(report = ?err, "database is not reachable yet");
      }
      Err(err) => return Err(err),
    }

    Ok(pool)
  }

  /// Wraps an already connected pool, used by tests that get
  /// their pool from `#[sqlx::test]`.
  #[must_use]
  pub fn from_raw(pool: sqlx::PgPool) -> Self {
    Self { pool }
  }
}

impl std::fmt::Debug for Pool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.pool.fmt(f)
  }
}

impl Pool {
  #[inline(always)]
  pub fn connections(&self) -> u32 {
    self.pool.size()
  }

  #[inline(always)]
  pub fn is_healthy(&self) -> bool {
    self.connections() > 0
  }

  #[tracing::instrument(name = "db.connect", skip(self))]
  pub async fn get(&self) -> Result<PoolConnection> {
    if let Some(inner) = self.pool.try_acquire() {
      Ok(inner)
    } else {
      self.pool.acquire().await.into_db_error()
    }
  }

  #[tracing::instrument(skip(self))]
  pub async fn wait_until_healthy(&self) -> Result<()> {
    match self.pool.acquire().await {
      Ok(..) => Ok(()),
      Err(e) if !self.is_healthy() => Err(Report::new(e).change_context(Error::UnhealthyPool)),
      Err(e) => Err(e).into_db_error(),
    }
  }

  #[tracing::instrument(name = "db.migrate", skip(self))]
  pub async fn migrate(&self) -> Result<()> {
    let now = tokio::time::Instant::now();
    tracing::info!("Performing database migrations...");

    MIGRATOR
      .run(&self.pool)
      .await
      .change_context(Error::Migration)?;

    let elapsed = now.elapsed();
    tracing::info!("Successfully performed database migrations! took {elapsed:.2?}");
    Ok(())
  }

  /// Waits for every checked out connection to be returned and
  /// closes all of them.
  #[tracing::instrument(name = "db.close", skip(self))]
  pub async fn close(&self) {
    self.pool.close().await;
  }
}
