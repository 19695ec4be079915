use gaccount_core::person::{resolve_identity, PersonInput};

use super::context::Context;

/// Run the `delete-account` command.
pub async fn run(config_path: &str, input: &PersonInput) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_identity(input, ctx.lookup()).await?;

    ctx.controller.delete(&person).await?;
    println!("Account deleted for {}", person.identifier());
    Ok(())
}
