//! Subcommand implementations.

pub mod collections;
pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod register;
pub mod whoami;

use toolshelf_core::UserRecord;

use crate::output;

fn print_user(user: &UserRecord) {
    output::field("User", user.display_name());
    output::field("ID", &user.id);
    if let Some(email) = &user.email {
        output::field("Email", email);
    }
}
