//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{collections, login, logout, refresh_token, register, whoami};

/// Sign in to a toolshelf backend and inspect the session.
#[derive(Parser, Debug)]
#[command(name = "toolshelf")]
#[command(author, version = env!("TOOLSHELF_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Backend base URL
    #[arg(
        long,
        global = true,
        env = "TOOLSHELF_API_URL",
        default_value = "http://localhost:5000"
    )]
    pub api_url: String,

    /// Token store file (defaults to the user data directory)
    #[arg(long, global = true, env = "TOOLSHELF_STORE")]
    pub store: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Create an account and log in
    Register(register::RegisterArgs),

    /// Log out and clear stored tokens
    Logout(logout::LogoutArgs),

    /// Check the stored session and show the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new access token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Show the signed-in user's tools and bookmarks
    Collections(collections::CollectionsArgs),
}
