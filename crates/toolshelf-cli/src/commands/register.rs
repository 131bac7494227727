//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username to register
    #[arg(long)]
    pub username: String,

    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(app: &App, args: RegisterArgs) -> Result<()> {
    eprintln!("{}", "Creating account...".dimmed());

    let grant = app
        .api
        .register(&args.username, &args.email, &args.password)
        .await
        .context("Failed to register")?;
    let user = grant.user.clone();
    app.machine.send(grant.into()).await;

    output::success("Account created");
    println!();
    super::print_user(&user);

    Ok(())
}
