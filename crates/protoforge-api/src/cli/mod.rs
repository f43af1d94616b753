//! CLI command definitions for the `pforge` binary.
//!
//! Uses clap derive macros. Global flags choose output format and log
//! verbosity, and describe the caller the wizard acts for.

pub mod markup;
pub mod olc;
pub mod prototype;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use protoforge_types::object::Caller;

/// Build and spawn game-object prototypes.
#[derive(Parser)]
#[command(name = "pforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Dbref number of the acting caller.
    #[arg(long, global = true, env = "PROTOFORGE_CALLER_ID", default_value_t = 1)]
    pub caller_id: i64,

    /// Display name of the acting caller.
    #[arg(long, global = true, env = "PROTOFORGE_CALLER_NAME", default_value = "Builder")]
    pub caller_name: String,

    /// Dbref of the room the caller stands in (e.g. "#2").
    #[arg(long, global = true, env = "PROTOFORGE_CALLER_LOCATION")]
    pub caller_location: Option<String>,

    /// Permission held by the caller (repeatable, e.g. --caller-perm Admin).
    #[arg(long = "caller-perm", global = true)]
    pub caller_perms: Vec<String>,

    /// Act as a superuser, bypassing all locks.
    #[arg(long, global = true)]
    pub superuser: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The caller described by the global flags.
    pub fn caller(&self) -> Caller {
        Caller {
            permissions: self.caller_perms.clone(),
            location: self.caller_location.clone(),
            superuser: self.superuser,
            ..Caller::new(self.caller_id, self.caller_name.clone())
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive prototype wizard.
    Olc {
        /// Prototype to edit (created if it does not exist).
        #[arg(long, short)]
        key: Option<String>,

        /// Resume an auto-saved wizard session.
        #[arg(long, conflicts_with = "key")]
        resume: bool,
    },

    /// List saved prototypes.
    #[command(alias = "ls")]
    List,

    /// Show a saved prototype.
    Show {
        /// Prototype key.
        key: String,
    },

    /// Delete a saved prototype.
    #[command(alias = "rm")]
    Delete {
        /// Prototype key.
        key: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Spawn an object from a saved prototype.
    Spawn {
        /// Prototype key.
        key: String,

        /// Location to spawn in, overriding the prototype's own.
        #[arg(long, short)]
        location: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_caller_from_flags() {
        let cli = Cli::parse_from([
            "pforge",
            "--caller-id",
            "7",
            "--caller-name",
            "Ada",
            "--caller-location",
            "#2",
            "--caller-perm",
            "Builder",
            "list",
        ]);
        let caller = cli.caller();
        assert_eq!(caller.id, 7);
        assert_eq!(caller.name, "Ada");
        assert_eq!(caller.location.as_deref(), Some("#2"));
        assert_eq!(caller.permissions, vec!["Builder".to_string()]);
        assert!(!caller.superuser);
    }

    #[test]
    fn test_olc_key_and_resume_conflict() {
        assert!(Cli::try_parse_from(["pforge", "olc", "--key", "lamp", "--resume"]).is_err());
        assert!(Cli::try_parse_from(["pforge", "olc", "-k", "lamp"]).is_ok());
    }
}
