//! Dashboard command
//!
//! Account statistics and the latest signups, like the console landing page.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use super::{report_api_error, Context, UserRow};
use crate::output::{print_info, print_output, print_single};
use userdesk_core::{load_dashboard, SystemStatus};

/// Stats row for table display
#[derive(Debug, Serialize, Tabled)]
struct StatsRow {
    #[tabled(rename = "Total Users")]
    total_users: u64,
    #[tabled(rename = "Active Users")]
    active_users: u64,
    #[tabled(rename = "New This Month")]
    new_users_this_month: u64,
    #[tabled(rename = "System Status")]
    system_status: String,
}

pub async fn execute(ctx: &Context) -> Result<()> {
    let view = load_dashboard(&ctx.client).await.map_err(report_api_error)?;

    let status = match view.stats.system_status {
        SystemStatus::Operational => "Operational",
        SystemStatus::Error => "Error",
    };
    let row = StatsRow {
        total_users: view.stats.total_users,
        active_users: view.stats.active_users,
        new_users_this_month: view.stats.new_users_this_month,
        system_status: status.to_string(),
    };
    print_single(&row, ctx.format)?;

    print_info("\nRecent signups:", ctx.quiet);
    let rows: Vec<UserRow> = view.recent_users.into_iter().map(UserRow::from).collect();
    print_output(&rows, ctx.format)?;

    Ok(())
}
