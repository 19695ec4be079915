use gaccount_core::person::{resolve_identity, PersonInput};

use super::context::Context;

/// Run the `update-name` command.
pub async fn run(config_path: &str, input: &PersonInput, first_name: &str, last_name: &str) -> anyhow::Result<()> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        anyhow::bail!("first and last name must not be empty");
    }

    let ctx = Context::load(config_path).await?;
    let person = resolve_identity(input, ctx.lookup()).await?;

    let handle = ctx
        .controller
        .update_name(&person, first_name.trim(), last_name.trim())
        .await?;
    println!(
        "Account {} is now named {} {}",
        handle.primary_name(),
        handle.first_name(),
        handle.last_name()
    );
    Ok(())
}
