// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use refract_cli::commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "refract",
    author = "Maravilla Labs",
    version,
    about = "Inertia-style web application toolkit CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter applied when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Show full tool output instead of the filtered summary
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new refract project
    Init {
        /// Directory to scaffold into; defaults to the current one
        name: Option<String>,
        /// Template to use: react, vanilla
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Start the development asset server with live reload
    Dev {
        /// Port for the dev server (default: 5173)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
    },
    /// Build assets for production
    Build {
        /// Also build the SSR bundle
        #[arg(long)]
        ssr: bool,
    },
    /// Preview the production build (static, no live reload)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4173")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when both are set
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cli.log_level))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Init { name, template } => commands::init::run(name, template).await,
        Commands::Dev { port, host } => {
            commands::dev::run(host, port, cli.verbose, cli.quiet).await
        }
        Commands::Build { ssr } => commands::build::run(ssr, cli.verbose, cli.quiet).await,
        Commands::Serve { port, host } => commands::serve::run(&host, port).await,
    }
}
