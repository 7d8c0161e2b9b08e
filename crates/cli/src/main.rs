//! `marcbench` -- batch driver for the marclite record-processing engine.
//!
//! Runs count, convert, split and merge jobs by spawning a local
//! engine process or by talking to an engine service over HTTP.
//! Engine events stream to stdout as NDJSON; logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default    | Description                                  |
//! |---------------------|----------|------------|----------------------------------------------|
//! | `MARCBENCH_ENGINE`  | no       | `marclite` | Engine executable for local runs             |
//! | `MARCBENCH_SERVER`  | no       | --         | Service base URL, e.g. `http://localhost:8000` |
//! | `RUST_LOG`          | no       | `marcbench=info` | Log filter for stderr output           |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marcbench_cli::cli::Cli;
use marcbench_cli::config::EngineConfig;
use marcbench_cli::run;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marcbench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::resolve(cli.engine, cli.server);

    match run::execute(cli.command, config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Job could not be started");
            std::process::exit(1);
        }
    }
}
