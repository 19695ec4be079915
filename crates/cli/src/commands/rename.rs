use gaccount_core::person::resolve_for_rename;
use tracing::info;

use super::context::Context;

/// Run the `rename-account` command.
pub async fn run(
    config_path: &str,
    numeric_id: Option<&str>,
    old_username: &str,
    new_username: &str,
    delete_alias: bool,
) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_for_rename(numeric_id, old_username, new_username, ctx.lookup()).await?;

    let old_username = old_username.trim().to_lowercase();
    let new_username = new_username.trim().to_lowercase();
    info!(old = %old_username, new = %new_username, delete_alias, "Renaming account");

    let handle = ctx
        .controller
        .rename(&person, &old_username, &new_username, delete_alias)
        .await?;
    println!("Account renamed to {}", handle.primary_name());
    if !delete_alias {
        println!("  Old name kept as an alias");
    }
    Ok(())
}
