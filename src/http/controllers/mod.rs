use actix_web::{web, HttpResponse};
use serde_json::json;

pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/", web::get().to(index))
    .service(
      web::scope("/users")
        .service(
          web::resource("")
            .route(web::get().to(users::list))
            .route(web::post().to(users::create)),
        )
        .service(
          web::resource("/{id}")
            .route(web::get().to(users::get))
            .route(web::put().to(users::update))
            .route(web::post().to(users::update))
            .route(web::delete().to(users::delete)),
        ),
    )
    // routes kept for clients of the older form based pages
    .route("/read", web::get().to(users::list))
    .route("/create", web::post().to(users::create))
    .route("/edit/{id}", web::get().to(users::get))
    .route("/update/{id}", web::post().to(users::update))
    .route("/delete/{id}", web::get().to(users::delete));
}

async fn index() -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "users": {
      "list": "GET /users",
      "get": "GET /users/{id}",
      "create": "POST /users",
      "update": "PUT /users/{id}",
      "delete": "DELETE /users/{id}",
    }
  }))
}
