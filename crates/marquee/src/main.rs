use crate::prelude::*;
use clap::Parser;

mod artists;
mod catalog;
mod config;
mod error;
mod movies;
mod output;
mod prelude;
mod providers;
mod server;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Ranked, paginated views over the TMDB movie and Spotify artist catalogs"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "MARQUEE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Serve the catalogs over HTTP
    Serve(crate::server::ServeOptions),

    /// TMDB movie lists
    Movies(crate::movies::App),

    /// Spotify artist search
    Artists(crate::artists::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
        SubCommands::Movies(sub_app) => crate::movies::run(sub_app, app.global).await,
        SubCommands::Artists(sub_app) => crate::artists::run(sub_app, app.global).await,
    }
}
