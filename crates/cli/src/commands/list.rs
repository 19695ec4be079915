use super::context::Context;

/// Run the `list-accounts` command.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let accounts = ctx.controller.list().await?;

    for email in accounts.values() {
        println!("{email}");
    }
    println!();
    println!("{} accounts", accounts.len());
    Ok(())
}
