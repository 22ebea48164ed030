//! `htrc-tokencount` — fetch HTRC Data API token counts for the volumes
//! matching a Solr query and save them as a zip file.

use anyhow::{Context, Result};
use clap::Parser;
use htrc_tokencount::telemetry::init_tracing;
use htrc_tokencount::{Config, Credentials, TokenCountRequest, TokenCountWorkflow};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, Level};

#[derive(Parser)]
#[command(name = "htrc-tokencount")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Request token counts from the HTRC Data API for the volumes matching a Solr query", long_about = None)]
struct Cli {
    /// OAuth2 client id
    client_id: String,

    /// OAuth2 client secret
    client_secret: String,

    /// Solr query string
    query: String,

    /// Zip file to write the token counts to
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<htrc_tokencount::Error>() {
                Some(err) => error!(category = ?err.category(), status = ?err.status(), "{e:#}"),
                None => error!("{e:#}"),
            }
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let workflow = TokenCountWorkflow::new(&config)?;

    let request = TokenCountRequest {
        credentials: Credentials::new(cli.client_id, cli.client_secret),
        query: cli.query,
        output: cli.output,
    };

    let summary = workflow.run(&request).await?;
    println!(
        "Saved {} bytes of token counts to {}",
        summary.bytes_written,
        summary.path.display()
    );
    Ok(())
}
