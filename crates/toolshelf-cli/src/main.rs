//! toolshelf - CLI for the toolshelf session subsystem.
//!
//! A thin driver over `toolshelf-core`: every command opens the token store,
//! runs the session machine against the configured backend and reports what
//! it settled on.

mod app;
mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use app::App;
use cli::{Cli, Commands};
use commands::{collections, login, logout, refresh_token, register, whoami};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.json_logs);

    let app = App::open(&cli.global)?;

    match cli.command {
        Commands::Login(args) => login::run(&app, args).await,
        Commands::Register(args) => register::run(&app, args).await,
        Commands::Logout(args) => logout::run(&app, args).await,
        Commands::Whoami(args) => whoami::run(&app, args).await,
        Commands::RefreshToken(args) => refresh_token::run(&app, args).await,
        Commands::Collections(args) => collections::run(&app, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so command output stays machine-readable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
