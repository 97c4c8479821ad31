use actix_web::web;

pub mod controllers;
pub mod error;
pub mod util;

pub use error::Error;

/// Registers every route along with the extractor error handlers
/// and a JSON `not_found` fallback.
pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(util::json_error_handler))
    .app_data(web::FormConfig::default().error_handler(util::form_error_handler))
    .app_data(web::PathConfig::default().error_handler(util::path_error_handler))
    .default_service(web::to(util::not_found));

  controllers::configure(cfg);
}
