use actix_web::{
  web::{self, Either, Form, Json},
  HttpResponse,
};

use crate::{
  http::error::{Error, Result},
  types::{self, form::users::UserForm, id::UserId},
  App,
};

/// Bodies may come from JSON clients or from plain HTML forms.
type Body = Either<Json<UserForm>, Form<UserForm>>;

fn into_form(body: Body) -> UserForm {
  match body {
    Either::Left(Json(form)) | Either::Right(Form(form)) => form,
  }
}

// Ids that do not parse cannot belong to any record.
fn parse_id(path: &str) -> Result<UserId> {
  path
    .parse::<UserId>()
    .map_err(|e| Error::from_context(types::Error::NotFound, e))
}

#[tracing::instrument(skip(app))]
pub async fn list(app: web::Data<App>) -> Result<HttpResponse> {
  let users = app.users.list().await?;
  Ok(HttpResponse::Ok().json(users))
}

#[tracing::instrument(skip(app))]
pub async fn get(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse> {
  let id = parse_id(&path)?;
  let user = app.users.get(id).await?;
  Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip_all)]
pub async fn create(app: web::Data<App>, body: Body) -> Result<HttpResponse> {
  let form = into_form(body);
  match app.users.create(&form).await {
    Ok(user) => Ok(HttpResponse::Created().json(user)),
    Err(report) => Err(Error::from(report).with_submitted(form)),
  }
}

#[tracing::instrument(skip(app, body))]
pub async fn update(
  app: web::Data<App>,
  path: web::Path<String>,
  body: Body,
) -> Result<HttpResponse> {
  let form = into_form(body);
  let id = parse_id(&path)?;
  match app.users.update(id, &form).await {
    Ok(user) => Ok(HttpResponse::Ok().json(user)),
    Err(report) => Err(Error::from(report).with_submitted(form)),
  }
}

#[tracing::instrument(skip(app))]
pub async fn delete(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse> {
  let id = parse_id(&path)?;
  let user = app.users.delete(id).await?;
  Ok(HttpResponse::Ok().json(user))
}
