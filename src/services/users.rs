use error_stack::{Report, ResultExt};
use std::sync::Arc;
use tracing::debug;

use super::{Result, ServiceError};
use crate::{
  schema::User,
  store::{Filter, UserData, UserStore},
  types::{form::users::UserForm, id::UserId, validation},
};

/// Validates submitted users and runs them against the store.
///
/// The service keeps no state of its own, clones are cheap and
/// share the same store.
#[derive(Debug, Clone)]
pub struct UserService {
  store: Arc<dyn UserStore>,
}

impl UserService {
  #[must_use]
  pub fn new(store: Arc<dyn UserStore>) -> Self {
    Self { store }
  }

  #[must_use]
  pub fn store(&self) -> &Arc<dyn UserStore> {
    &self.store
  }
}

impl UserService {
  #[tracing::instrument(skip(self), name = "services.users.list")]
  pub async fn list(&self) -> Result<Vec<User>> {
    self
      .store
      .find(Filter::All)
      .await
      .change_context(ServiceError::Store)
  }

  #[tracing::instrument(skip(self), name = "services.users.get")]
  pub async fn get(&self, id: UserId) -> Result<User> {
    self
      .store
      .find_one(Filter::Id(id))
      .await
      .change_context(ServiceError::Store)?
      .ok_or_else(|| Report::new(ServiceError::NotFound))
  }

  #[tracing::instrument(skip_all, name = "services.users.create")]
  pub async fn create(&self, form: &UserForm) -> Result<User> {
    let data = checked(form)?;
    let user = self
      .store
      .create(data)
      .await
      .change_context(ServiceError::Store)?;

    debug!(id = %user.id, "created user");
    Ok(user)
  }

  #[tracing::instrument(skip(self, form), name = "services.users.update")]
  pub async fn update(&self, id: UserId, form: &UserForm) -> Result<User> {
    let data = checked(form)?;
    self
      .store
      .find_one_and_update(Filter::Id(id), data)
      .await
      .change_context(ServiceError::Store)?
      .ok_or_else(|| Report::new(ServiceError::NotFound))
  }

  #[tracing::instrument(skip(self), name = "services.users.delete")]
  pub async fn delete(&self, id: UserId) -> Result<User> {
    let user = self
      .store
      .find_one_and_delete(Filter::Id(id))
      .await
      .change_context(ServiceError::Store)?
      .ok_or_else(|| Report::new(ServiceError::NotFound))?;

    debug!(id = %user.id, "deleted user");
    Ok(user)
  }
}

/// Runs every rule over the form and turns it into storable data.
/// An empty image is stored as no image at all.
fn checked(form: &UserForm) -> Result<UserData> {
  let violations = validation::check_user(form);
  if !violations.is_empty() {
    debug!(?violations, "rejected submitted user");
    return Err(Report::new(ServiceError::ValidationFailed(violations)));
  }

  Ok(UserData {
    name: form.name.clone().unwrap_or_default(),
    email: form.email.clone().unwrap_or_default(),
    image: form.image().map(String::from),
  })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{self, MemoryUserStore};
  use crate::types::validation::Field;

  fn service() -> (UserService, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    (UserService::new(store.clone()), store)
  }

  #[track_caller]
  fn expect_violations(result: Result<User>, fields: &[Field]) {
    let error = result.unwrap_err();
    let violations = error
      .current_context()
      .violations()
      .unwrap_or_else(|| panic!("expected validation failure, got {error:?}"));

    let actual = violations.iter().map(|v| v.field).collect::<Vec<_>>();
    assert_eq!(actual, fields);
  }

  #[tokio::test]
  async fn create_then_get_round_trips() {
    let (service, _) = service();
    let form = UserForm::new("Ann", "ann@x.com").with_image("https://example.com/ann.png");

    let created = service.create(&form).await.unwrap();
    let fetched = service.get(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.name, "Ann");
    assert_eq!(fetched.email, "ann@x.com");
    assert_eq!(fetched.image.as_deref(), Some("https://example.com/ann.png"));
  }

  #[tokio::test]
  async fn empty_image_is_stored_as_none() {
    let (service, _) = service();
    let form = UserForm::new("Ann", "ann@x.com").with_image("");
    let created = service.create(&form).await.unwrap();
    assert_eq!(created.image, None);
  }

  #[tokio::test]
  async fn invalid_create_never_reaches_the_store() {
    let (service, store) = service();

    expect_violations(
      service.create(&UserForm::new("", "bad")).await,
      &[Field::Name, Field::Email],
    );
    expect_violations(
      service.create(&UserForm::default()).await,
      &[Field::Name, Field::Email],
    );
    expect_violations(
      service
        .create(&UserForm::new("Ann", "ann@x.com").with_image("https://example.com/a.bmp"))
        .await,
      &[Field::Image],
    );

    assert!(store.is_empty().await);
  }

  #[tokio::test]
  async fn invalid_update_is_rejected_before_lookup() {
    let (service, _) = service();
    let ann = service
      .create(&UserForm::new("Ann", "ann@x.com"))
      .await
      .unwrap();

    expect_violations(
      service.update(ann.id, &UserForm::new("", "ann@x.com")).await,
      &[Field::Name],
    );
    // validation runs first, even for ids that do not exist
    expect_violations(
      service.update(UserId::new(999), &UserForm::new("Ann", "nope")).await,
      &[Field::Email],
    );

    assert_eq!(service.get(ann.id).await.unwrap(), ann);
  }

  #[tokio::test]
  async fn duplicate_email_is_a_store_error() {
    let (service, store) = service();
    service
      .create(&UserForm::new("Ann", "ann@x.com"))
      .await
      .unwrap();

    let error = service
      .create(&UserForm::new("Another Ann", "ann@x.com"))
      .await
      .unwrap_err();

    assert!(matches!(error.current_context(), ServiceError::Store));
    assert_eq!(
      error.downcast_ref::<store::Error>(),
      Some(&store::Error::UniqueViolation)
    );

    let matches = store.find(Filter::Email("ann@x.com".into())).await.unwrap();
    assert_eq!(matches.len(), 1);
  }

  #[tokio::test]
  async fn update_and_delete_missing_user() {
    let (service, _) = service();
    let missing = UserId::new(42);

    let error = service
      .update(missing, &UserForm::new("Ann", "ann@x.com"))
      .await
      .unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::NotFound));

    let error = service.delete(missing).await.unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::NotFound));
  }

  #[tokio::test]
  async fn delete_twice() {
    let (service, _) = service();
    let ann = service
      .create(&UserForm::new("Ann", "ann@x.com"))
      .await
      .unwrap();

    let deleted = service.delete(ann.id).await.unwrap();
    assert_eq!(deleted, ann);

    let error = service.delete(ann.id).await.unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::NotFound));
  }

  #[tokio::test]
  async fn full_lifecycle() {
    let (service, _) = service();

    let created = service
      .create(&UserForm::new("Ann", "ann@x.com"))
      .await
      .unwrap();
    assert_eq!(created.created_at, created.updated_at);

    let updated = service
      .update(created.id, &UserForm::new("Ann B", "ann@x.com"))
      .await
      .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Ann B");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.created_at);

    service.delete(created.id).await.unwrap();

    let error = service.get(created.id).await.unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::NotFound));
  }

  #[tokio::test]
  async fn list_returns_records_in_id_order() {
    let (service, _) = service();
    for (name, email) in [("Ann", "ann@x.com"), ("Bob", "bob@x.com"), ("Cid", "cid@x.com")] {
      service.create(&UserForm::new(name, email)).await.unwrap();
    }

    let names = service
      .list()
      .await
      .unwrap()
      .into_iter()
      .map(|u| u.name)
      .collect::<Vec<_>>();
    assert_eq!(names, ["Ann", "Bob", "Cid"]);
  }

  #[tokio::test]
  async fn unavailable_store_is_a_store_error() {
    let (service, store) = service();
    store.close().await;

    let error = service.list().await.unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::Store));

    let error = service.get(UserId::new(1)).await.unwrap_err();
    assert!(matches!(error.current_context(), ServiceError::Store));
  }

  #[tokio::test]
  async fn concurrent_creates_with_same_email() {
    let (service, store) = service();
    let form = UserForm::new("Ann", "ann@x.com");

    let (a, b) = tokio::join!(service.create(&form), service.create(&form));
    assert!(a.is_ok() ^ b.is_ok());
    assert_eq!(store.len().await, 1);
  }
}
