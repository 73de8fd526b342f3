// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runnerctl`: administrative commands against a fleet managed by
//! `runnerd` — list the servers it owns, connect to one over SSH, or tear
//! the whole fleet down. This talks to the cloud and source-control
//! backends directly; it does not need `runnerd` to be running.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use runner_cloud::{CloudProvider, HetznerProvider};
use runner_core::names::NamePrefixes;
use runner_daemon::Config;
use runner_scm::{GithubSourceControl, SourceControl};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "runnerctl", about = "Administer a Hetzner/GitHub self-hosted runner fleet")]
struct Cli {
    /// Path to the runnerd config file
    #[arg(long, env = "RUNNERD_CONFIG", default_value = "/etc/runnerd/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List every server currently owned by this fleet
    List,
    /// Open an interactive SSH session to a named server
    Ssh {
        /// Server name, e.g. `runner-standby-ab12cd34`
        name: String,
    },
    /// Print the SSH command line for a named server without running it
    SshCommand {
        name: String,
    },
    /// Delete every managed server and deregister every managed runner
    Delete {
        /// Confirm the fleet-wide deletion; the command refuses to run without it
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let name_prefixes = NamePrefixes::new(format!("{}-", config.runner_label));

    let cloud: Arc<dyn CloudProvider> = Arc::new(HetznerProvider::new(config.hetzner_token()?.to_string())?);

    match cli.command {
        Cmd::List => commands::list(&cloud, &name_prefixes).await?,
        Cmd::Ssh { name } => commands::ssh(&cloud, &name).await?,
        Cmd::SshCommand { name } => commands::ssh_command(&cloud, &name).await?,
        Cmd::Delete { all: true } => {
            let scm: Arc<dyn SourceControl> = Arc::new(GithubSourceControl::new(
                config.github_token()?.to_string(),
                config.github_repository.clone(),
            )?);
            commands::delete_all(&cloud, &scm, &name_prefixes).await?;
        }
        Cmd::Delete { all: false } => {
            eprintln!("refusing to delete without --all");
            std::process::exit(1);
        }
    }

    Ok(())
}
