use gaccount_core::person::{resolve_for_create, PersonInput};
use gaccount_directory::password::random_password_hash;
use tracing::info;

use super::context::Context;

/// Run the `create-account` command. Without a password hash the account gets
/// a random one until it is activated.
pub async fn run(config_path: &str, input: &PersonInput, password_hash: Option<&str>) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_for_create(input, ctx.lookup()).await?;

    let password_hash = match password_hash {
        Some(hash) => hash.to_string(),
        None => random_password_hash(),
    };

    info!(person = %person.identifier(), "Creating account");
    let handle = ctx.controller.create(&person, &password_hash).await?;

    println!("Account created: {}", handle.primary_name());
    println!("  Org unit:  {}", handle.org_unit().unwrap_or("-"));
    println!("  Available: {}", handle.time_until_available());
    Ok(())
}
