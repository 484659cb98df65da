//! CLI for the finch seed fetch scheduler and metrics bridge.

mod bridge_socket;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use finch_core::config::{self, FlagOverrides};
use std::path::PathBuf;

use commands::{
    run_cancel, run_jobs, run_record, run_reset_stamp, run_retrieve, run_schedule, run_status,
    Context,
};

/// Top-level CLI for finch.
#[derive(Debug, Parser)]
#[command(name = "finch")]
#[command(
    about = "finch: background variations seed fetch scheduler and metrics bridge",
    long_about = None
)]
pub struct Cli {
    /// Minimum time between seed downloads in milliseconds (0 = always download).
    #[arg(long = "finch-seed-min-download-period", value_name = "MS", global = true)]
    pub min_download_period: Option<u64>,

    /// Replace a pending download job instead of leaving it alone.
    #[arg(long = "finch-seed-ignore-pending-download", global = true)]
    pub ignore_pending_download: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Enqueue the seed fetch job if it is due.
    Schedule,

    /// Run the job loop and serve the metrics bridge.
    Run {
        /// Make a single activation attempt and exit.
        #[arg(long)]
        once: bool,
    },

    /// Show the stamp, the pending job and the last job metrics.
    Status,

    /// Cancel the pending fetch job (and stop it if it is running).
    Cancel,

    /// Delete the seed stamp so the next schedule call downloads again.
    ResetStamp,

    /// Submit the bytes of a file as one metrics record.
    Record {
        /// File holding one serialized record.
        path: PathBuf,
    },

    /// Drain every stored metrics record and print it.
    Retrieve,
}

impl Cli {
    pub fn flag_overrides(&self) -> FlagOverrides {
        FlagOverrides {
            min_download_period_ms: self.min_download_period,
            ignore_pending_download: self.ignore_pending_download,
        }
    }

    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let ctx = Context::open(cfg, cli.flag_overrides(), config::state_dir()?).await?;

        match cli.command {
            CliCommand::Schedule => run_schedule(&ctx).await?,
            CliCommand::Run { once } => run_jobs(&ctx, once).await?,
            CliCommand::Status => run_status(&ctx).await?,
            CliCommand::Cancel => run_cancel(&ctx).await?,
            CliCommand::ResetStamp => run_reset_stamp(&ctx)?,
            CliCommand::Record { path } => run_record(&ctx, &path).await?,
            CliCommand::Retrieve => run_retrieve(&ctx).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
