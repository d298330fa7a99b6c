use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "tursoform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative reconciliation of Turso databases, configuration and tokens", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file [default: ./tursoform.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// State file [default: tursoform.state.json next to the config]
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(TargetArgs),

    /// Make remote resources match the configuration
    Apply(ApplyArgs),

    /// Re-read every recorded instance from the remote service
    Refresh(RefreshArgs),

    /// Bring an existing remote object under management
    Import {
        /// Address to record it at (type.label)
        address: String,

        /// Composite identifier, e.g. organization/name
        identifier: String,
    },

    /// Delete every recorded instance
    Destroy(ApplyArgs),

    /// Inspect or edit the state file
    #[command(subcommand)]
    State(StateCommand),

    /// Look up an object through a data source
    Lookup {
        /// Data source: database, database_configuration, database_instance, organization
        source: String,

        /// Lookup keys as key=value
        #[arg(value_name = "KEY=VALUE")]
        keys: Vec<String>,
    },

    /// Print attribute policy tables
    Schema {
        /// Resource or data source name
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only this address or resource type (e.g. database.orders, api_token)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only this address or resource type (e.g. database.orders, api_token)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Args)]
pub struct RefreshArgs {
    /// Only this address or resource type (e.g. database.orders, api_token)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

// ============================================================================
// State Commands
// ============================================================================

#[derive(Subcommand)]
pub enum StateCommand {
    /// List recorded addresses
    List,

    /// Show the attributes recorded for an address
    Show {
        /// Address (type.label)
        address: String,
    },

    /// Forget an address without touching the remote object
    Rm {
        /// Address (type.label)
        address: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_defaults() {
        let cli = Cli::parse_from(["tursoform", "apply"]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.jobs, 4);
        assert!(!args.yes);
        assert!(args.target.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tursoform",
            "state",
            "list",
            "--state",
            "/tmp/s.json",
            "-vv",
        ]);
        assert_eq!(cli.state.as_deref(), Some("/tmp/s.json"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_lookup_keys() {
        let cli = Cli::parse_from([
            "tursoform",
            "lookup",
            "organization",
            "slug=acme",
        ]);
        let Command::Lookup { source, keys } = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(source, "organization");
        assert_eq!(keys, vec!["slug=acme"]);
    }
}
