//! Password reset command

use anyhow::Result;

use super::{report_api_error, Context};
use crate::output::{print_error, print_success};

pub async fn execute(ctx: &Context) -> Result<()> {
    let current = rpassword::prompt_password("Current password: ")?;
    let new = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")?;

    if new != confirm {
        print_error("Passwords do not match");
        anyhow::bail!("passwords do not match")
    }

    ctx.client
        .reset_password(&current, &new)
        .await
        .map_err(report_api_error)?;

    print_success("Password updated successfully", ctx.quiet);
    Ok(())
}
