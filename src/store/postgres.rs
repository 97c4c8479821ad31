use async_trait::async_trait;
use error_stack::{Report, ResultExt};

use super::{Error, Filter, Result, UserData, UserStore};
use crate::{
  config,
  database::{self, PoolConnection},
  schema::User,
};

/// User store backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
  pool: database::Pool,
}

impl PgUserStore {
  /// Connects to the configured database and applies pending
  /// migrations before handing out the store.
  #[tracing::instrument(name = "store.postgres.open", skip_all)]
  pub async fn open(cfg: &config::Database) -> Result<Self> {
    let pool = database::Pool::new(cfg).await.map_err(into_store_error)?;
    pool.migrate().await.map_err(into_store_error)?;
    Ok(Self { pool })
  }

  #[must_use]
  pub fn from_pool(pool: database::Pool) -> Self {
    Self { pool }
  }

  async fn conn(&self) -> Result<PoolConnection> {
    self.pool.get().await.map_err(into_store_error)
  }
}

fn into_store_error(report: Report<database::Error>) -> Report<Error> {
  let context = match report.current_context() {
    database::Error::UniqueViolation => Error::UniqueViolation,
    database::Error::UnhealthyPool => Error::Unavailable,
    database::Error::InvalidUrl | database::Error::Internal | database::Error::Migration => {
      Error::Internal
    }
  };
  report.change_context(context)
}

#[async_trait]
impl UserStore for PgUserStore {
  async fn find(&self, filter: Filter) -> Result<Vec<User>> {
    let mut conn = self.conn().await?;
    User::find(&mut conn, &filter)
      .await
      .map_err(into_store_error)
  }

  async fn find_one(&self, filter: Filter) -> Result<Option<User>> {
    let mut conn = self.conn().await?;
    User::find_one(&mut conn, &filter)
      .await
      .map_err(into_store_error)
  }

  async fn create(&self, data: UserData) -> Result<User> {
    let mut conn = self.conn().await?;
    User::insert(&mut conn, &data)
      .await
      .map_err(into_store_error)
  }

  async fn find_one_and_update(&self, filter: Filter, data: UserData) -> Result<Option<User>> {
    let mut conn = self.conn().await?;
    User::update(&mut conn, &filter, &data)
      .await
      .map_err(into_store_error)
      .attach_printable_lazy(|| format!("filter: {filter:?}"))
  }

  async fn find_one_and_delete(&self, filter: Filter) -> Result<Option<User>> {
    let mut conn = self.conn().await?;
    User::delete(&mut conn, &filter)
      .await
      .map_err(into_store_error)
      .attach_printable_lazy(|| format!("filter: {filter:?}"))
  }

  async fn close(&self) {
    self.pool.close().await;
  }
}
