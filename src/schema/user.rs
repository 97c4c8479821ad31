use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};

use crate::{
  database::{Connection, ErrorExt, Result},
  store::{Filter, UserData},
  types::id::UserId,
};

/// A stored user record.
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
  pub id: UserId,
  pub name: String,
  pub email: String,
  pub image: Option<String>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

// Mutations target at most one row, the lowest id matching the filter.
fn push_target(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
  query.push(r#"id = (SELECT id FROM "users""#);
  push_filter(query, filter);
  query.push(" ORDER BY id LIMIT 1 FOR UPDATE)");
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
  match filter {
    Filter::All => {}
    Filter::Id(id) => {
      query.push(" WHERE id = ").push_bind(*id);
    }
    Filter::Email(email) => {
      query.push(" WHERE email = ").push_bind(email.clone());
    }
  }
}

impl User {
  #[tracing::instrument(skip(conn), name = "db.users.find")]
  pub async fn find(conn: &mut Connection, filter: &Filter) -> Result<Vec<Self>> {
    let mut query = QueryBuilder::new(r#"SELECT * FROM "users""#);
    push_filter(&mut query, filter);
    query.push(" ORDER BY id");

    query
      .build_query_as::<Self>()
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.users.find_one")]
  pub async fn find_one(conn: &mut Connection, filter: &Filter) -> Result<Option<Self>> {
    let mut query = QueryBuilder::new(r#"SELECT * FROM "users""#);
    push_filter(&mut query, filter);
    query.push(" ORDER BY id LIMIT 1");

    query
      .build_query_as::<Self>()
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip_all, name = "db.users.insert")]
  pub async fn insert(conn: &mut Connection, data: &UserData) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "users" (name, email, image)
      VALUES ($1, $2, $3)
      RETURNING *"#,
    )
    .bind(&data.name)
    .bind(&data.email)
    .bind(data.image.as_deref())
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  /// `updated_at` always moves forward, even if two updates land
  /// within the same clock tick.
  #[tracing::instrument(skip(conn, data), name = "db.users.update")]
  pub async fn update(
    conn: &mut Connection,
    filter: &Filter,
    data: &UserData,
  ) -> Result<Option<Self>> {
    let mut query = QueryBuilder::new(r#"UPDATE "users" SET name = "#);
    query
      .push_bind(data.name.clone())
      .push(", email = ")
      .push_bind(data.email.clone())
      .push(", image = ")
      .push_bind(data.image.clone())
      .push(
        ", updated_at = GREATEST(clock_timestamp() AT TIME ZONE 'utc', \
         updated_at + interval '1 microsecond') WHERE ",
      );
    push_target(&mut query, filter);
    query.push(" RETURNING *");

    query
      .build_query_as::<Self>()
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.users.delete")]
  pub async fn delete(conn: &mut Connection, filter: &Filter) -> Result<Option<Self>> {
    let mut query = QueryBuilder::new(r#"DELETE FROM "users" WHERE "#);
    push_target(&mut query, filter);
    query.push(" RETURNING *");

    query
      .build_query_as::<Self>()
      .fetch_optional(conn)
      .await
      .into_db_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_targeted_mutation() {
    let mut query = QueryBuilder::<Postgres>::new(r#"DELETE FROM "users" WHERE "#);
    push_target(&mut query, &Filter::Email("ann@x.com".into()));
    query.push(" RETURNING *");

    assert_eq!(
      query.sql(),
      r#"DELETE FROM "users" WHERE id = (SELECT id FROM "users" WHERE email = $1 ORDER BY id LIMIT 1 FOR UPDATE) RETURNING *"#
    );
  }

  #[test]
  fn unfiltered_find_has_no_where_clause() {
    let mut query = QueryBuilder::<Postgres>::new(r#"SELECT * FROM "users""#);
    push_filter(&mut query, &Filter::All);
    assert_eq!(query.sql(), r#"SELECT * FROM "users""#);
  }
}
