//! Dashboard statistics
//!
//! Headline numbers plus the most recently created accounts. The totals
//! come from the backend's pagination metadata (a size-1 page request is
//! the cheapest way to get the authoritative count); the activity figures
//! are demo placeholders carried over from the original console and are
//! not real metrics.

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{PageRequest, Role, User};

/// Overall backend health as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Operational,
    Error,
}

/// Headline statistics block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    /// Placeholder: assumes every account is active
    pub active_users: u64,
    /// Placeholder: fixed fraction of the total, not a real metric
    pub new_users_this_month: u64,
    pub system_status: SystemStatus,
}

impl DashboardStats {
    /// Derive the stats block from the authoritative total count
    pub fn from_total(total_users: u64) -> Self {
        Self {
            total_users,
            active_users: total_users,
            new_users_this_month: total_users * 3 / 10,
            system_status: SystemStatus::Operational,
        }
    }
}

/// Everything the dashboard view renders
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub recent_users: Vec<User>,
}

/// Load the dashboard: one size-1 page fetch for the total count and the
/// recent-users endpoint for the latest non-admin accounts.
pub async fn load_dashboard(client: &ApiClient) -> Result<DashboardView> {
    let totals = client.list_users(None, &PageRequest::new(1, 1)).await?;
    let recent_users = client.recent_users(Some(Role::User)).await?;

    Ok(DashboardView {
        stats: DashboardStats::from_total(totals.total_users),
        recent_users,
    })
}
