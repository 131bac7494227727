//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(app: &App, _args: LogoutArgs) -> Result<()> {
    let coordinator = app.coordinator();

    app.machine.logout().await;
    // Drop cached collections now that no tokens remain.
    coordinator.observe(&app.machine.session()).await;

    output::success("Logged out");
    Ok(())
}
