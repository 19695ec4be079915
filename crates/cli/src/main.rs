use clap::Parser;
use tracing_subscriber::EnvFilter;

use gaccount_core::person::PersonInput;

mod commands;

#[derive(Parser)]
#[command(name = "gaccount", about = "Directory account lifecycle administration", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "gaccount.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies an existing person.
#[derive(clap::Args, Debug, Clone, Default)]
struct IdentityArgs {
    /// Eight digit numeric id
    #[arg(long)]
    numeric_id: Option<String>,
    /// Username (login name)
    #[arg(long)]
    username: Option<String>,
}

impl IdentityArgs {
    fn into_input(self) -> PersonInput {
        PersonInput {
            numeric_id: self.numeric_id,
            username: self.username,
            ..Default::default()
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a directory account in the bulk org unit
    CreateAccount {
        #[command(flatten)]
        identity: IdentityArgs,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// SHA-1 hex password hash; a random one is generated when omitted
        #[arg(long)]
        password_hash: Option<String>,
    },
    /// Delete a person's account
    DeleteAccount {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Move an account back to the bulk org unit
    ResetAccount {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Rename an account after a username change
    RenameAccount {
        #[arg(long)]
        numeric_id: Option<String>,
        #[arg(long)]
        old_username: String,
        #[arg(long)]
        new_username: String,
        /// Keep the old name as an alias
        #[arg(long)]
        keep_alias: bool,
    },
    /// List every account in the domain
    ListAccounts,
    /// Claim an account, set its password, and move it to the activated org unit
    ActivateAccount {
        #[command(flatten)]
        identity: IdentityArgs,
        /// SHA-1 hex password hash
        #[arg(long)]
        password_hash: String,
    },
    /// Show an account's name, org unit, and availability
    AccountStatus {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Change the first and last name on an account
    UpdateName {
        #[command(flatten)]
        identity: IdentityArgs,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Show the most recent audit log entries
    AuditLog {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAccount {
            identity,
            first_name,
            last_name,
            password_hash,
        } => {
            let input = PersonInput {
                first_name,
                last_name,
                ..identity.into_input()
            };
            commands::create::run(&cli.config, &input, password_hash.as_deref()).await?;
        }
        Commands::DeleteAccount { identity } => {
            commands::delete::run(&cli.config, &identity.into_input()).await?;
        }
        Commands::ResetAccount { identity } => {
            commands::reset::run(&cli.config, &identity.into_input()).await?;
        }
        Commands::RenameAccount {
            numeric_id,
            old_username,
            new_username,
            keep_alias,
        } => {
            commands::rename::run(
                &cli.config,
                numeric_id.as_deref(),
                &old_username,
                &new_username,
                !keep_alias,
            )
            .await?;
        }
        Commands::ListAccounts => {
            commands::list::run(&cli.config).await?;
        }
        Commands::ActivateAccount {
            identity,
            password_hash,
        } => {
            commands::activate::run(&cli.config, &identity.into_input(), &password_hash).await?;
        }
        Commands::AccountStatus { identity } => {
            commands::status::run(&cli.config, &identity.into_input()).await?;
        }
        Commands::UpdateName {
            identity,
            first_name,
            last_name,
        } => {
            commands::update_name::run(&cli.config, &identity.into_input(), &first_name, &last_name)
                .await?;
        }
        Commands::AuditLog { limit } => {
            commands::audit_log::run(&cli.config, limit).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_default_config() {
        let cli = Cli::parse_from(["gaccount", "list-accounts"]);
        assert_eq!(cli.config, "gaccount.toml");
        assert!(matches!(cli.command, Commands::ListAccounts));
    }

    #[test]
    fn cli_parse_create_account() {
        let cli = Cli::parse_from([
            "gaccount",
            "--config",
            "/etc/gaccount.toml",
            "create-account",
            "--numeric-id",
            "00112233",
            "--username",
            "test1",
            "--first-name",
            "Test",
            "--last-name",
            "Person",
        ]);
        assert_eq!(cli.config, "/etc/gaccount.toml");
        match cli.command {
            Commands::CreateAccount {
                identity,
                first_name,
                last_name,
                password_hash,
            } => {
                assert_eq!(identity.numeric_id.as_deref(), Some("00112233"));
                assert_eq!(identity.username.as_deref(), Some("test1"));
                assert_eq!(first_name.as_deref(), Some("Test"));
                assert_eq!(last_name.as_deref(), Some("Person"));
                assert!(password_hash.is_none());
            }
            _ => panic!("expected CreateAccount command"),
        }
    }

    #[test]
    fn cli_parse_rename_account() {
        let cli = Cli::parse_from([
            "gaccount",
            "rename-account",
            "--old-username",
            "old1",
            "--new-username",
            "new1",
        ]);
        match cli.command {
            Commands::RenameAccount {
                numeric_id,
                old_username,
                new_username,
                keep_alias,
            } => {
                assert!(numeric_id.is_none());
                assert_eq!(old_username, "old1");
                assert_eq!(new_username, "new1");
                assert!(!keep_alias);
            }
            _ => panic!("expected RenameAccount command"),
        }
    }

    #[test]
    fn cli_parse_rename_requires_both_usernames() {
        let result = Cli::try_parse_from(["gaccount", "rename-account", "--old-username", "old1"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_activate_account() {
        let cli = Cli::parse_from([
            "gaccount",
            "activate-account",
            "--username",
            "test1",
            "--password-hash",
            "a9993e364706816aba3e25717850c26c9cd0d89d",
        ]);
        match cli.command {
            Commands::ActivateAccount {
                identity,
                password_hash,
            } => {
                assert_eq!(identity.username.as_deref(), Some("test1"));
                assert!(identity.numeric_id.is_none());
                assert_eq!(password_hash, "a9993e364706816aba3e25717850c26c9cd0d89d");
            }
            _ => panic!("expected ActivateAccount command"),
        }
    }

    #[test]
    fn cli_parse_identity_commands() {
        let cli = Cli::parse_from(["gaccount", "delete-account", "--numeric-id", "00112233"]);
        assert!(matches!(cli.command, Commands::DeleteAccount { .. }));

        let cli = Cli::parse_from(["gaccount", "reset-account", "--username", "test1"]);
        assert!(matches!(cli.command, Commands::ResetAccount { .. }));

        let cli = Cli::parse_from(["gaccount", "account-status", "--username", "test1"]);
        assert!(matches!(cli.command, Commands::AccountStatus { .. }));
    }

    #[test]
    fn cli_parse_update_name() {
        let cli = Cli::parse_from([
            "gaccount",
            "update-name",
            "--username",
            "test1",
            "--first-name",
            "Jane",
            "--last-name",
            "Doe",
        ]);
        match cli.command {
            Commands::UpdateName {
                first_name,
                last_name,
                ..
            } => {
                assert_eq!(first_name, "Jane");
                assert_eq!(last_name, "Doe");
            }
            _ => panic!("expected UpdateName command"),
        }
    }

    #[test]
    fn cli_parse_audit_log_default_limit() {
        let cli = Cli::parse_from(["gaccount", "audit-log"]);
        assert!(matches!(cli.command, Commands::AuditLog { limit: 20 }));
    }

    #[test]
    fn identity_args_into_input() {
        let input = IdentityArgs {
            numeric_id: Some("00112233".into()),
            username: None,
        }
        .into_input();
        assert_eq!(input.numeric_id.as_deref(), Some("00112233"));
        assert!(input.username.is_none());
        assert!(input.first_name.is_none());
    }
}
