//! CLI for the Harvest dashboard client.

mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use harvest_core::config;
use harvest_core::notify::{NotificationCenter, NotificationKind, UnknownKind};

use commands::{run_config, run_login, run_logout, run_notify, run_watch};

/// Top-level CLI for the Harvest dashboard client.
#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest: follow extraction jobs and notifications from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Follow a job's progress until it reaches a terminal state.
    Watch {
        /// Job identifier.
        job_id: String,
    },

    /// Store the bearer token used to open progress channels.
    Login {
        /// Bearer token issued by the extraction API.
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },

    /// Forget the stored token.
    Logout,

    /// Show one notification and follow it until it is removed.
    Notify {
        /// success, error, warning or info.
        #[arg(value_parser = parse_kind)]
        kind: NotificationKind,

        /// Notification title.
        title: String,

        /// Optional body text.
        #[arg(long)]
        message: Option<String>,

        /// Visible time in milliseconds; 0 or less keeps it until Ctrl-C.
        #[arg(long, value_name = "MS", allow_hyphen_values = true)]
        duration_ms: Option<i64>,
    },

    /// Print the config file path and the resolved configuration.
    Config,
}

fn parse_kind(s: &str) -> Result<NotificationKind, UnknownKind> {
    s.parse()
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        NotificationCenter::init_global(&cfg.notifications());

        match cli.command {
            CliCommand::Watch { job_id } => run_watch(&cfg, &job_id).await?,
            CliCommand::Login { token } => run_login(&token)?,
            CliCommand::Logout => run_logout()?,
            CliCommand::Notify {
                kind,
                title,
                message,
                duration_ms,
            } => run_notify(kind, &title, message.as_deref(), duration_ms).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
