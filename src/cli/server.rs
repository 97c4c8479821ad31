use actix_web::{web, App as HttpApp, HttpServer};
use clap::Parser;
use error_stack::{Result, ResultExt};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing_actix_web::TracingLogger;

use userbook::{config::Server as Config, http, store::MemoryUserStore, App};

#[derive(Debug, Error)]
#[error("Failed to start the server")]
pub struct StartServerError;

/// Serve the user directory over HTTP
#[derive(Debug, Parser)]
pub struct ServerCommand {
  #[clap(long)]
  pub address: Option<IpAddr>,
  #[clap(long)]
  pub port: Option<u16>,
  #[clap(long)]
  pub workers: Option<NonZeroUsize>,
  /// Keep records in memory instead of Postgres. Everything is lost
  /// once the server stops.
  #[clap(long)]
  pub memory: bool,
}

pub fn run(args: &ServerCommand) -> Result<(), StartServerError> {
  let mut config = Config::load().change_context(StartServerError)?;
  args.override_config(&mut config);

  userbook::logging::init().change_context(StartServerError)?;
  tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .worker_threads(config.workers.get())
    .build()
    .change_context(StartServerError)
    .attach_printable("could not build tokio runtime")?
    .block_on(serve(config, args.memory))
}

async fn serve(config: Config, memory: bool) -> Result<(), StartServerError> {
  let app = if memory {
    info!("using in-memory user store");
    App::with_store(config, Arc::new(MemoryUserStore::new()))
  } else {
    App::new(config).await.change_context(StartServerError)?
  };

  let addr = (app.config.ip, app.config.port);
  let workers = app.config.workers.get();
  let data = web::Data::new(app.clone());

  let server = HttpServer::new(move || {
    HttpApp::new()
      .app_data(data.clone())
      .wrap(TracingLogger::<http::util::QuieterRootSpanBuilder>::new())
      .configure(http::configure)
  })
  .workers(workers)
  .bind(addr)
  .change_context(StartServerError)
  .attach_printable_lazy(|| format!("could not bind to {}:{}", addr.0, addr.1))?;

  info!("listening on {}:{}", addr.0, addr.1);
  let result = server.run().await.change_context(StartServerError);

  app.close().await;
  info!("server stopped");
  result
}

impl ServerCommand {
  fn override_config(&self, config: &mut Config) {
    // override server configurations if set by the cli
    if let Some(address) = self.address {
      config.ip = address;
    }

    if let Some(port) = self.port {
      config.port = port;
    }

    if let Some(workers) = self.workers {
      config.workers = workers;
    }
  }
}
