//! Authentication commands
//!
//! Login, logout, and session inspection.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{print_error, print_info, print_single, print_success};
use userdesk_core::LoginOutcome;

/// Session row for whoami display
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Role")]
    role: String,
}

pub async fn login(ctx: &Context, username: &str) -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;

    match ctx.client.login(username, &password).await {
        LoginOutcome::Success(user) => {
            print_success(&format!("Logged in as {}", user.name), ctx.quiet);
            Ok(())
        }
        LoginOutcome::Failed(message) => {
            print_error(&message);
            anyhow::bail!("login failed")
        }
    }
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.client.session().clear();
    print_success("Logged out", ctx.quiet);
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<()> {
    match ctx.client.session().current_user() {
        Some(user) if ctx.client.session().is_logged_in() => {
            let row = SessionRow {
                id: user.id,
                name: user.name,
                email: user.email,
                username: user.username,
                role: user.role.as_str().to_string(),
            };
            print_single(&row, ctx.format)
        }
        Some(_) => {
            // Token on disk but past its exp claim
            print_info("Session expired. Run 'userdesk login'.", false);
            Ok(())
        }
        None => {
            print_info("Not logged in.", false);
            Ok(())
        }
    }
}
