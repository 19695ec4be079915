use gaccount_core::person::{resolve_identity, PersonInput};

use super::context::Context;

/// Run the `activate-account` command.
pub async fn run(config_path: &str, input: &PersonInput, password_hash: &str) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_identity(input, ctx.lookup()).await?;

    let handle = ctx.controller.activate(&person, password_hash).await?;
    println!("Account activated: {}", handle.primary_name());
    println!("  Org unit:  {}", handle.org_unit().unwrap_or("-"));
    if handle.is_pending() {
        println!("  Available: {}", handle.time_until_available());
    }
    Ok(())
}
