use error_stack::{Report, Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::{
  config,
  services::UserService,
  store::{PgUserStore, UserStore},
};

/// Shared state handed to every HTTP worker.
#[derive(Debug, Clone)]
pub struct App {
  pub config: Arc<config::Server>,
  pub users: UserService,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
  /// Opens the Postgres store from `cfg.db` (migrating it first).
  #[tracing::instrument(skip_all)]
  pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
    let db = cfg
      .db
      .as_ref()
      .ok_or_else(|| Report::new(AppError))
      .attach_printable("`db.url` is required unless the in-memory store is used")?;

    let store = PgUserStore::open(db).await.change_context(AppError)?;
    Ok(Self::with_store(cfg, Arc::new(store)))
  }

  #[must_use]
  pub fn with_store(cfg: config::Server, store: Arc<dyn UserStore>) -> Self {
    Self {
      config: Arc::new(cfg),
      users: UserService::new(store),
    }
  }

  /// Releases the store. Requests still in flight afterwards fail
  /// with a store error.
  #[tracing::instrument(skip_all)]
  pub async fn close(&self) {
    self.users.store().close().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryUserStore;

  #[tokio::test]
  async fn requires_database_config() {
    let error = App::new(config::Server::with_defaults()).await.unwrap_err();
    assert!(format!("{error:?}").contains("db.url"));
  }

  #[tokio::test]
  async fn close_releases_the_store() {
    let store = Arc::new(MemoryUserStore::new());
    let app = App::with_store(config::Server::with_defaults(), store.clone());

    app.close().await;
    assert!(app.users.list().await.is_err());
  }
}
