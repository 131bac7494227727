//! Whoami command implementation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use toolshelf_core::{AuthState, UserRecord};

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct WhoamiOutput<'a> {
    state: String,
    user: Option<UserOutput<'a>>,
    last_error: Option<String>,
}

// Only the identifying fields; an embedded refresh token is never printed.
#[derive(Serialize)]
struct UserOutput<'a> {
    id: &'a str,
    username: Option<&'a str>,
    email: Option<&'a str>,
}

impl<'a> From<&'a UserRecord> for UserOutput<'a> {
    fn from(user: &'a UserRecord) -> Self {
        Self {
            id: &user.id,
            username: user.username.as_deref(),
            email: user.email.as_deref(),
        }
    }
}

pub async fn run(app: &App, args: WhoamiArgs) -> Result<()> {
    let state = app.machine.start().await;
    let session = app.machine.session();

    if args.json {
        return output::json_pretty(&WhoamiOutput {
            state: state.to_string(),
            user: session.user.as_ref().map(UserOutput::from),
            last_error: session.last_error.map(|kind| kind.to_string()),
        });
    }

    match (state, &session.user) {
        (AuthState::Authenticated, Some(user)) => super::print_user(user),
        _ => {
            let reason = session
                .last_error
                .map(|kind| format!(" ({})", kind))
                .unwrap_or_default();
            anyhow::bail!("Not logged in{}. Run 'toolshelf login' first.", reason);
        }
    }

    Ok(())
}
