use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod batch;
mod config;
mod document;
mod error;
mod extract;
mod inspect;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Refine classified text blocks into a document title and heading outline"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// TOML file overriding the classifier and refinement thresholds
    #[clap(long, env = "DOCOUTLINE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "DOCOUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Build the outline of a single block file
    Extract(crate::extract::ExtractOptions),

    /// Build outlines for every block file in a directory
    Batch(crate::batch::BatchOptions),

    /// Show how every block of a file was labelled
    Inspect(crate::inspect::InspectOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    init_logger(app.global.verbose);
    color_eyre::install()?;

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global).await,
        SubCommands::Batch(options) => crate::batch::run(options, app.global).await,
        SubCommands::Inspect(options) => crate::inspect::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

/// `RUST_LOG` wins; otherwise warnings only, or debug output with `--verbose`.
fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
