use clap::Parser;
use error_stack::Result;

mod server;

pub use server::StartServerError;

/// Command line options for userbook.
#[derive(Debug, Parser)]
#[command(about = "Small user directory served over HTTP", version, author, long_about)]
pub struct Cli {
  #[clap(subcommand)]
  pub subcommand: Subcommand,
}

impl Cli {
  pub fn run(self) -> Result<(), StartServerError> {
    match self.subcommand {
      Subcommand::Server(args) => self::server::run(&args),
    }
  }
}

#[derive(Debug, Parser)]
pub enum Subcommand {
  Server(self::server::ServerCommand),
}
