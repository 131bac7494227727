//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(app: &App, _args: RefreshTokenArgs) -> Result<()> {
    let session = app.require_session().await?;

    eprintln!("{}", "Refreshing access token...".dimmed());

    app.machine
        .refresh_access_token()
        .await
        .context("Failed to refresh access token")?;

    output::success("Access token refreshed");
    if let Some(user) = &session.user {
        output::field("User", user.display_name());
    }

    Ok(())
}
