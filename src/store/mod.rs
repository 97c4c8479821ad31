use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::{schema::User, types::id::UserId};

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Record store errors, kept free of any backend specific type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// The store is closed or its backend cannot be reached.
  #[error("user store is unavailable")]
  Unavailable,
  /// Another record already uses the submitted email.
  #[error("email is already taken by another user")]
  UniqueViolation,
  #[error("user store failed to perform an operation")]
  Internal,
}

pub type Result<T> = error_stack::Result<T, Error>;

/// Selects which records an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  All,
  Id(UserId),
  /// Exact, case-sensitive match.
  Email(String),
}

impl Filter {
  #[must_use]
  pub fn matches(&self, user: &User) -> bool {
    match self {
      Filter::All => true,
      Filter::Id(id) => user.id == *id,
      Filter::Email(email) => user.email == *email,
    }
  }
}

/// Mutable fields of a user, already validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
  pub name: String,
  pub email: String,
  pub image: Option<String>,
}

/// Document-style persistence for user records.
///
/// Single record mutations are atomic and pick the record with the
/// lowest id when a filter matches more than one. The store is the
/// only place email uniqueness is enforced.
#[async_trait]
pub trait UserStore: std::fmt::Debug + Send + Sync {
  /// Every matching record ordered by id.
  async fn find(&self, filter: Filter) -> Result<Vec<User>>;

  async fn find_one(&self, filter: Filter) -> Result<Option<User>>;

  /// Assigns a fresh id and sets both timestamps to the same instant.
  async fn create(&self, data: UserData) -> Result<User>;

  /// Replaces the mutable fields and returns the record as it is
  /// after the update, or `None` if nothing matched.
  async fn find_one_and_update(&self, filter: Filter, data: UserData) -> Result<Option<User>>;

  /// Removes a record and returns what it held before removal.
  async fn find_one_and_delete(&self, filter: Filter) -> Result<Option<User>>;

  /// Releases the resources held by the store. Later calls fail
  /// with [`Error::Unavailable`].
  async fn close(&self);
}
