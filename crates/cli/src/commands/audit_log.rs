use super::context::Context;

/// Run the `audit-log` command: print the newest audit entries.
pub async fn run(config_path: &str, limit: i64) -> anyhow::Result<()> {
    let ctx = Context::load(config_path).await?;
    let Some(log) = &ctx.audit_log else {
        anyhow::bail!("No audit database configured. Set audit.database_path to keep a history.");
    };

    let entries = log.list_recent(limit).await?;
    if entries.is_empty() {
        println!("No audit entries recorded.");
        return Ok(());
    }

    for entry in entries {
        let who = entry
            .username
            .as_deref()
            .or(entry.numeric_id.as_deref())
            .unwrap_or("-");
        println!(
            "{}  {:<6}  {:<16}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.kind.as_str(),
            who,
            entry.message
        );
    }
    Ok(())
}
