use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use error_stack::Report;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{Error, Filter, Result, UserData, UserStore};
use crate::{schema::User, types::id::UserId};

/// User store that keeps every record in process memory.
///
/// Used by tests and by `server --memory`. Every operation takes the
/// lock for its whole duration, so uniqueness checks and writes are
/// atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
  state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
  closed: bool,
  last_id: u64,
  users: BTreeMap<UserId, User>,
}

impl State {
  fn ensure_open(&self) -> Result<()> {
    if self.closed {
      Err(Report::new(Error::Unavailable).attach_printable("memory store is closed"))
    } else {
      Ok(())
    }
  }

  fn first_match(&self, filter: &Filter) -> Option<UserId> {
    match filter {
      Filter::Id(id) => self.users.contains_key(id).then_some(*id),
      _ => self.users.values().find(|u| filter.matches(u)).map(|u| u.id),
    }
  }

  fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> Result<()> {
    let taken = self
      .users
      .values()
      .any(|u| u.email == email && Some(u.id) != except);

    if taken {
      Err(Report::new(Error::UniqueViolation).attach_printable("duplicate key on `email`"))
    } else {
      Ok(())
    }
  }
}

impl MemoryUserStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of records currently held.
  pub async fn len(&self) -> usize {
    self.state.read().await.users.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.len().await == 0
  }
}

fn now() -> NaiveDateTime {
  Utc::now().naive_utc()
}

#[async_trait]
impl UserStore for MemoryUserStore {
  async fn find(&self, filter: Filter) -> Result<Vec<User>> {
    let state = self.state.read().await;
    state.ensure_open()?;

    Ok(state
      .users
      .values()
      .filter(|u| filter.matches(u))
      .cloned()
      .collect())
  }

  async fn find_one(&self, filter: Filter) -> Result<Option<User>> {
    let state = self.state.read().await;
    state.ensure_open()?;

    Ok(state
      .first_match(&filter)
      .and_then(|id| state.users.get(&id))
      .cloned())
  }

  async fn create(&self, data: UserData) -> Result<User> {
    let mut state = self.state.write().await;
    state.ensure_open()?;
    state.ensure_email_free(&data.email, None)?;

    let id = UserId::new_checked(state.last_id + 1)
      .ok_or_else(|| Report::new(Error::Internal).attach_printable("ran out of user ids"))?;

    let created_at = now();
    let user = User {
      id,
      name: data.name,
      email: data.email,
      image: data.image,
      created_at,
      updated_at: created_at,
    };

    state.last_id = id.get();
    state.users.insert(id, user.clone());
    Ok(user)
  }

  async fn find_one_and_update(&self, filter: Filter, data: UserData) -> Result<Option<User>> {
    let mut state = self.state.write().await;
    state.ensure_open()?;

    let Some(id) = state.first_match(&filter) else {
      return Ok(None);
    };
    state.ensure_email_free(&data.email, Some(id))?;

    let Some(user) = state.users.get_mut(&id) else {
      return Ok(None);
    };

    // keeps `updated_at` strictly increasing on coarse clocks
    let timestamp = now().max(user.updated_at + Duration::microseconds(1));

    user.name = data.name;
    user.email = data.email;
    user.image = data.image;
    user.updated_at = timestamp;

    Ok(Some(user.clone()))
  }

  async fn find_one_and_delete(&self, filter: Filter) -> Result<Option<User>> {
    let mut state = self.state.write().await;
    state.ensure_open()?;

    Ok(state
      .first_match(&filter)
      .and_then(|id| state.users.remove(&id)))
  }

  async fn close(&self) {
    let mut state = self.state.write().await;
    state.closed = true;
    state.users.clear();
  }
}
