//! CLI configuration management.
//!
//! All configuration can be provided via CLI arguments or environment
//! variables; the backend URL and API key are required, and their absence
//! is a fatal configuration error surfaced before anything renders.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;
use uuid::Uuid;
use vantage_core::Role;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "vantage")]
#[command(about = "Role-based-access-control dashboard, in your terminal")]
#[command(version)]
pub struct Cli {
    /// Base URL of the hosted backend.
    #[arg(long, env = "VANTAGE_BACKEND_URL")]
    pub backend_url: String,

    /// Public API key for the hosted backend.
    #[arg(long, env = "VANTAGE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Site base URL used to build email callback links.
    #[arg(long, env = "VANTAGE_SITE_URL")]
    pub site_url: Option<Url>,

    /// Access token of an existing session to reuse.
    #[arg(long, env = "VANTAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Email address to sign in with.
    #[arg(long, env = "VANTAGE_EMAIL")]
    pub email: Option<String>,

    /// Password to sign in with.
    #[arg(long, env = "VANTAGE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Dashboard command to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Loads environment variables from .env (if enabled) and parses CLI
    /// arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from a .env file if the dotenv feature
    /// is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when the dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Top-level dashboard commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the signed-in principal, effective role, and permissions.
    Status,
    /// Manage your own tasks.
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },
    /// List the active organization's members.
    Users,
    /// Manage pending invitations.
    Invites {
        #[command(subcommand)]
        command: InvitesCommand,
    },
    /// Administer user roles.
    Role {
        #[command(subcommand)]
        command: RoleCommand,
    },
}

/// Task subcommands, scoped to the signed-in principal.
#[derive(Debug, Clone, Subcommand)]
pub enum TasksCommand {
    /// List your tasks.
    List,
    /// Add a task.
    Add {
        /// Task title.
        title: String,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
        /// Completion percentage, 0 through 100.
        #[arg(long, default_value_t = 0)]
        progress: u8,
        /// Day the task is scheduled for (defaults to today).
        #[arg(long)]
        date: Option<jiff::civil::Date>,
    },
    /// Mark a task as done.
    Done {
        /// Task id.
        id: Uuid,
    },
    /// Remove a task.
    Remove {
        /// Task id.
        id: Uuid,
    },
}

/// Invitation subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum InvitesCommand {
    /// List pending invitations.
    List,
    /// Create an invitation and email it to the invitee.
    Create {
        /// Invitee email address.
        email: String,
        /// Role to assign upon acceptance.
        #[arg(long, default_value = "user")]
        role: Role,
        /// Target organization (defaults to the active one).
        #[arg(long)]
        org: Option<Uuid>,
        /// Only record the invitation row, without sending an email.
        #[arg(long)]
        row_only: bool,
    },
    /// Revoke a pending invitation.
    Revoke {
        /// Invitation id.
        id: Uuid,
    },
}

/// Role administration subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum RoleCommand {
    /// Set a user's global role.
    Set {
        /// Principal whose role changes.
        user_id: Uuid,
        /// New global role.
        role: Role,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_required_backend_configuration() {
        // Without backend URL and API key the CLI refuses to start.
        let result = Cli::try_parse_from(["vantage", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parses_invite_create() {
        let cli = Cli::try_parse_from([
            "vantage",
            "--backend-url",
            "https://backend.example.com",
            "--api-key",
            "anon-key",
            "invites",
            "create",
            "teammate@example.com",
            "--role",
            "org_admin",
        ])
        .unwrap();
        let Some(Command::Invites {
            command: InvitesCommand::Create { email, role, .. },
        }) = cli.command
        else {
            panic!("expected invite create");
        };
        assert_eq!(email, "teammate@example.com");
        assert_eq!(role, Role::OrgAdmin);
    }
}
