//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(app: &App, args: LoginArgs) -> Result<()> {
    eprintln!("{}", "Logging in...".dimmed());

    let grant = app
        .api
        .login(&args.email, &args.password)
        .await
        .context("Failed to login")?;
    let user = grant.user.clone();
    app.machine.send(grant.into()).await;

    output::success("Logged in successfully");
    println!();
    super::print_user(&user);
    output::field("Store", &app.store_path().display().to_string());

    Ok(())
}
