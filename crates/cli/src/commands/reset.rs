use gaccount_core::person::{resolve_identity, PersonInput};

use super::context::Context;

/// Run the `reset-account` command: move the account back to the bulk org unit.
pub async fn run(config_path: &str, input: &PersonInput) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_identity(input, ctx.lookup()).await?;

    let handle = ctx.controller.reset(&person).await?;
    println!(
        "Account {} moved to {}",
        handle.primary_name(),
        handle.org_unit().unwrap_or("-")
    );
    Ok(())
}
