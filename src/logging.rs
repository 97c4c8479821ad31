use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Debug, Error)]
#[error("Failed to initialize tracing")]
pub struct TracingInitError;

/// Installs the global subscriber. Targets come from `RUST_LOG`.
pub fn init() -> Result<(), TracingInitError> {
  let targets = std::env::var("RUST_LOG").unwrap_or_default();
  let registry = tracing_subscriber::Registry::default()
    .with(make_env_filter(&targets))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .with(ErrorLayer::default());

  tracing::subscriber::set_global_default(registry)
    .change_context(TracingInitError)
    .attach_printable("already initialized tracing")
}

/// Like [`init`] but writes through the test harness. Calling it
/// more than once is fine.
pub fn init_for_tests() {
  let targets = std::env::var("RUST_LOG").unwrap_or_default();
  let registry = tracing_subscriber::Registry::default()
    .with(make_env_filter(&targets))
    .with(tracing_subscriber::fmt::layer().with_test_writer())
    .with(ErrorLayer::default());

  tracing::subscriber::set_global_default(registry).ok();
}

fn make_env_filter(targets: &str) -> EnvFilter {
  let default_level = if cfg!(debug_assertions) {
    LevelFilter::DEBUG
  } else {
    LevelFilter::INFO
  };

  EnvFilter::builder()
    .with_default_directive(default_level.into())
    .parse_lossy(targets)
}
