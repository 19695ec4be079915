use gaccount_core::person::{resolve_identity, PersonInput};

use super::context::Context;

const HISTORY_LIMIT: i64 = 10;

/// Run the `account-status` command: show the account and, when an audit
/// database is configured, its recent history.
pub async fn run(config_path: &str, input: &PersonInput) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let person = resolve_identity(input, ctx.lookup()).await?;

    let Some(handle) = ctx.controller.find(&person).await? else {
        println!("No account exists for {}", person.identifier());
        return Ok(());
    };

    println!("Account Status");
    println!("==============");
    println!("Account:   {}", handle.primary_name());
    println!("Name:      {} {}", handle.first_name(), handle.last_name());
    println!("Org unit:  {}", handle.org_unit().unwrap_or("-"));
    println!(
        "Claimed:   {}",
        if handle.is_anonymous_name() { "no" } else { "yes" }
    );
    println!(
        "Activated: {}",
        if handle.is_activated() { "yes" } else { "no" }
    );
    println!("Available: {}", handle.time_until_available());

    if let Some(log) = &ctx.audit_log {
        let entries = log.list_for_person(handle.person(), HISTORY_LIMIT).await?;
        if !entries.is_empty() {
            println!();
            println!("History");
            println!("-------");
            for entry in entries {
                println!(
                    "{}  {:<6}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.kind.as_str(),
                    entry.message
                );
            }
        }
    }
    Ok(())
}
