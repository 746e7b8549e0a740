//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod auth;
pub mod dashboard;
pub mod password;
pub mod report;
pub mod status;
pub mod users;

use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_error, print_success, OutputFormat};
use userdesk_core::{format_timestamp, Error, Notifier, Role, User};

/// Shared context for all commands
pub struct Context {
    pub client: userdesk_core::ApiClient,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Notifier backed by the terminal. CRUD outcomes surface as colored
/// lines instead of toasts.
pub struct CliNotifier {
    pub quiet: bool,
}

impl Notifier for CliNotifier {
    fn success(&self, message: &str) {
        print_success(message, self.quiet);
    }

    fn error(&self, message: &str) {
        print_error(message);
    }
}

/// User row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Created At")]
    pub created_at: String,
}

impl From<User> for UserRow {
    fn from(user: User) -> Self {
        Self {
            id: user
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            name: user.name,
            email: user.email,
            username: user.username,
            role: user
                .role
                .map(|role| role.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
            created_at: format_timestamp(user.created_at.as_deref()),
        }
    }
}

/// Parse a role argument
pub fn parse_role(raw: &str) -> anyhow::Result<Role> {
    raw.parse::<Role>().map_err(anyhow::Error::msg)
}

/// Print an API error the way the browser console surfaces it, then
/// propagate for a non-zero exit
pub fn report_api_error(err: Error) -> anyhow::Error {
    match &err {
        Error::Connection => print_error("Cannot connect to backend server"),
        Error::Auth => print_error("Session expired or unauthorized. Run 'userdesk login'."),
        Error::Validation(message) => print_error(message),
        _ => print_error(userdesk_core::GENERIC_ERROR_MESSAGE),
    }
    err.into()
}
