//! User account commands
//!
//! Commands for managing user accounts: list, add, update, delete.

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use super::{parse_role, report_api_error, CliNotifier, Context, UserRow};
use crate::output::{print_connection_banner, print_error, print_info, print_output, print_single};
use userdesk_core::{
    CrudOrchestrator, CrudOutcome, Error, FetchOutcome, ListController, Role, SortDir, User,
    UserDraft, UserDirectory,
};

/// Page size of the accounts view
const PAGE_SIZE: u32 = 4;

#[derive(Subcommand)]
pub enum UsersAction {
    /// List user accounts
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Sort column (name, email, username, createdAt)
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort direction (asc or desc)
        #[arg(short = 'd', long, default_value = "asc")]
        dir: String,

        /// Filter by role (admin or user)
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Add a new user account
    Add {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Login username
        #[arg(short, long)]
        username: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Account role (admin or user)
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Update an existing user account
    Update {
        /// User ID
        id: u64,

        /// New full name
        #[arg(short, long)]
        name: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,

        /// New login username
        #[arg(short, long)]
        username: Option<String>,

        /// New password
        #[arg(long)]
        password: Option<String>,

        /// New role (admin or user)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Delete a user account
    Delete {
        /// User ID
        id: u64,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn execute(ctx: &Context, action: UsersAction) -> Result<()> {
    match action {
        UsersAction::List { page, sort, dir, role } => {
            list_users(ctx, page, sort, dir, role).await
        }
        UsersAction::Add { name, email, username, password, role } => {
            add_user(ctx, name, email, username, password, role).await
        }
        UsersAction::Update { id, name, email, username, password, role } => {
            update_user(ctx, id, name, email, username, password, role).await
        }
        UsersAction::Delete { id, force } => {
            delete_user(ctx, id, force).await
        }
    }
}

fn controller_for(ctx: &Context, role: Option<Role>) -> ListController {
    let directory: Arc<dyn UserDirectory> = Arc::new(ctx.client.clone());
    ListController::new(directory, role, PAGE_SIZE)
}

fn parse_sort_dir(raw: &str) -> Result<SortDir> {
    raw.parse::<SortDir>().map_err(anyhow::Error::msg)
}

/// Turn a terminal fetch outcome into a printed error and non-zero exit
pub(crate) fn check_fetch(outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Unauthorized => Err(report_api_error(Error::Auth)),
        FetchOutcome::OutOfRange => {
            print_error("Page is out of range");
            anyhow::bail!("page out of range")
        }
        _ => Ok(()),
    }
}

async fn list_users(
    ctx: &Context,
    page: u32,
    sort: Option<String>,
    dir: String,
    role: String,
) -> Result<()> {
    let controller = controller_for(ctx, Some(parse_role(&role)?));

    let outcome = match sort {
        Some(column) => controller.set_sort(&column, parse_sort_dir(&dir)?).await,
        None => controller.ensure_initial_fetch().await,
    };
    check_fetch(outcome)?;

    if page > 1 {
        check_fetch(controller.change_page(page).await)?;
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

async fn add_user(
    ctx: &Context,
    name: String,
    email: String,
    username: String,
    password: Option<String>,
    role: String,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ")?,
    };

    let draft = UserDraft {
        name,
        email,
        username,
        password: Some(password),
        role: Some(parse_role(&role)?),
    };

    let controller = controller_for(ctx, Some(Role::User));
    let crud = orchestrator(ctx, controller.clone());

    match crud.create(&draft).await.map_err(report_api_error)? {
        CrudOutcome::Completed => Ok(()),
        CrudOutcome::ConnectionFailed => {
            print_connection_banner(controller.snapshot().connection);
            anyhow::bail!("backend unreachable")
        }
        _ => anyhow::bail!("create failed"),
    }
}

async fn update_user(
    ctx: &Context,
    id: u64,
    name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    role: Option<String>,
) -> Result<()> {
    let controller = controller_for(ctx, Some(Role::User));
    let existing = match locate_user(&controller, id).await? {
        Some(user) => user,
        None => {
            print_error(&format!("User {} not found", id));
            anyhow::bail!("user not found")
        }
    };

    // Merge the edits over the current record, as the edit form does
    let draft = UserDraft {
        name: name.unwrap_or(existing.name),
        email: email.unwrap_or(existing.email),
        username: username.unwrap_or(existing.username),
        password,
        role: match role {
            Some(raw) => Some(parse_role(&raw)?),
            None => existing.role,
        },
    };

    let crud = orchestrator(ctx, controller.clone());
    match crud.update(id, &draft).await.map_err(report_api_error)? {
        CrudOutcome::Completed => Ok(()),
        CrudOutcome::ConnectionFailed => {
            print_connection_banner(controller.snapshot().connection);
            anyhow::bail!("backend unreachable")
        }
        _ => anyhow::bail!("update failed"),
    }
}

async fn delete_user(ctx: &Context, id: u64, force: bool) -> Result<()> {
    let controller = controller_for(ctx, Some(Role::User));
    if locate_user(&controller, id).await?.is_none() {
        print_error(&format!("User {} not found", id));
        anyhow::bail!("user not found")
    }

    let crud = orchestrator(ctx, controller.clone());
    let pending = match crud.request_delete(id) {
        Some(pending) => pending,
        None => {
            print_error(&format!("User {} not found", id));
            anyhow::bail!("user not found")
        }
    };

    if !force {
        // Show the target before asking again with --force
        if let Some(user) = controller.find_item(id) {
            print_single(&UserRow::from(user), ctx.format)?;
        }
        print_error(&format!(
            "Use --force to confirm deleting \"{}\"",
            pending.name
        ));
        crud.cancel_delete();
        return Ok(());
    }

    match crud.confirm_delete().await.map_err(report_api_error)? {
        CrudOutcome::Completed => Ok(()),
        CrudOutcome::ConnectionFailed => {
            print_connection_banner(controller.snapshot().connection);
            anyhow::bail!("backend unreachable")
        }
        _ => anyhow::bail!("delete failed"),
    }
}

fn orchestrator(ctx: &Context, controller: ListController) -> CrudOrchestrator {
    CrudOrchestrator::new(
        Arc::new(ctx.client.clone()),
        controller,
        Arc::new(CliNotifier { quiet: ctx.quiet }),
    )
}

/// Walk pages until the account shows up or the listing runs out
async fn locate_user(controller: &ListController, id: u64) -> Result<Option<User>> {
    check_fetch(controller.ensure_initial_fetch().await)?;
    loop {
        if let Some(user) = controller.find_item(id) {
            return Ok(Some(user));
        }
        let snapshot = controller.snapshot();
        if let Some(error) = &snapshot.error {
            print_error(error);
            anyhow::bail!("fetch failed");
        }
        if snapshot.connection == userdesk_core::ConnectionStatus::Failed {
            print_connection_banner(snapshot.connection);
            anyhow::bail!("backend unreachable");
        }
        if snapshot.current_page >= snapshot.total_pages {
            return Ok(None);
        }
        check_fetch(controller.change_page(snapshot.current_page + 1).await)?;
    }
}
