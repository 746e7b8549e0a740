//! Report commands
//!
//! Paginated report listing and CSV export of user accounts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use super::{report_api_error, Context, UserRow};
use crate::output::{print_connection_banner, print_error, print_info, print_output, print_success};
use userdesk_core::{
    default_file_name, write_csv, ListController, PageRequest, Role, SortDir, User, UserDirectory,
};

/// Page size of the reports view
const PAGE_SIZE: u32 = 5;

#[derive(Subcommand)]
pub enum ReportAction {
    /// List report rows, newest accounts first
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Export all user accounts to a CSV file
    Export {
        /// Output path (defaults to user-report-YYYY-MM-DD.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub async fn execute(ctx: &Context, action: ReportAction) -> Result<()> {
    match action {
        ReportAction::List { page } => list_report(ctx, page).await,
        ReportAction::Export { out } => export_report(ctx, out).await,
    }
}

async fn list_report(ctx: &Context, page: u32) -> Result<()> {
    let directory: Arc<dyn UserDirectory> = Arc::new(ctx.client.clone());
    let controller = ListController::new(directory, Some(Role::User), PAGE_SIZE);

    super::users::check_fetch(controller.set_sort("createdAt", SortDir::Desc).await)?;
    if page > 1 {
        super::users::check_fetch(controller.change_page(page).await)?;
    }

    let snapshot = controller.snapshot();
    print_connection_banner(snapshot.connection);
    if let Some(error) = &snapshot.error {
        print_error(error);
        anyhow::bail!("fetch failed");
    }
    if snapshot.connection == userdesk_core::ConnectionStatus::Failed {
        anyhow::bail!("backend unreachable");
    }

    let rows: Vec<UserRow> = snapshot.items.into_iter().map(UserRow::from).collect();
    print_output(&rows, ctx.format)?;
    print_info(
        &format!(
            "Page {} of {} ({} users)",
            snapshot.current_page, snapshot.total_pages, snapshot.total_users
        ),
        ctx.quiet,
    );

    Ok(())
}

async fn export_report(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let users = collect_all_users(ctx).await?;
    if users.is_empty() {
        print_info("No users to export.", false);
        return Ok(());
    }

    let path = out.unwrap_or_else(|| {
        PathBuf::from(default_file_name(chrono::Local::now().date_naive()))
    });
    write_csv(&users, &path)?;

    print_success(
        &format!("Exported {} users to {}", users.len(), path.display()),
        ctx.quiet,
    );
    Ok(())
}

/// Pull every page, newest first, for the export
async fn collect_all_users(ctx: &Context) -> Result<Vec<User>> {
    let mut users = Vec::new();
    let mut page = 1;
    loop {
        let req = PageRequest::new(page, PAGE_SIZE).sorted("createdAt", SortDir::Desc);
        let fetched = ctx
            .client
            .list_users(Some(Role::User), &req)
            .await
            .map_err(report_api_error)?;
        users.extend(fetched.users);
        if page >= fetched.total_pages {
            return Ok(users);
        }
        page += 1;
    }
}
