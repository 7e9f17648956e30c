//! Fleet status.

use anyhow::Result;

use super::Context;

pub async fn show(ctx: &Context, pending_only: bool) -> Result<()> {
    let fleet = if pending_only {
        ctx.engine().pending_releases().await?
    } else {
        ctx.engine().release_status().await?
    };
    ctx.emit(&fleet, || fleet.to_string())
}
