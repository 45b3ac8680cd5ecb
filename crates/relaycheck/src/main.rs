//! `relaycheck` - connection test for the POP3 to Gmail importer.
//!
//! Checks every configured account's POP3 mailbox and Gmail API access,
//! prints a report and exits non-zero if any enabled account failed.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use relaycheck_core::{
    ConsoleSink, DEFAULT_ENV_FILE, GmailApi, MapSettings, Orchestrator, Pop3Connector,
};
use relaycheck_oauth::FileTokenStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file with `ACCOUNT_COUNT` and `ACCOUNTn_*` keys.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr; the report owns stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaycheck=info,relaycheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let summary = runtime.block_on(async {
        info!(env_file = %args.env_file.display(), "starting connection test");
        let settings = MapSettings::load_dotenv(&args.env_file);

        let (connector, store, api, sink) = (Pop3Connector, FileTokenStore, GmailApi, ConsoleSink);
        Orchestrator::new(&connector, &store, &api, &sink)
            .run(settings)
            .await
    });

    Ok(ExitCode::from(summary.exit_code()))
}
