//! Connectivity check command

use anyhow::Result;

use super::Context;
use crate::output::{print_error, print_success};
use userdesk_core::{ConnectionMonitor, ConnectionStatus};

pub async fn execute(ctx: &Context) -> Result<()> {
    let monitor = ConnectionMonitor::new(ctx.client.clone());
    match monitor.check().await {
        ConnectionStatus::Connected => {
            print_success("Backend is reachable", ctx.quiet);
            Ok(())
        }
        _ => {
            print_error("Cannot connect to backend server");
            anyhow::bail!("backend unreachable")
        }
    }
}
