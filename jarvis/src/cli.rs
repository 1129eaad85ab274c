//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_ENVIRONMENT;
use crate::record::{EventCategory, ResourceKind};

/// Jarvis - personal information management
#[derive(Parser, Debug)]
#[command(
    name = "jarvis",
    about = "Create, edit and browse log entries, tags and events in Jarvis",
    version,
    after_help = "Logs are written to: ~/.local/share/jarvis/logs/jarvis.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Environment section of the config file
    #[arg(short, long, global = true, default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Jarvis resource
    New {
        #[command(subcommand)]
        resource: NewCommand,
    },

    /// Edit an existing Jarvis resource
    Edit {
        #[command(subcommand)]
        resource: ResourceCommand,
    },

    /// Display a Jarvis resource
    Show {
        #[command(subcommand)]
        resource: ResourceCommand,
    },

    /// Query and list Jarvis resources
    List {
        #[command(subcommand)]
        listing: ListCommand,
    },

    /// Show data summary
    Summary,

    /// Backup, restore and migrate Jarvis data
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Create or update an environment in the config file
    Init,
}

#[derive(Subcommand, Debug)]
pub enum NewCommand {
    /// Create a new log entry
    Log {
        /// Associated event
        #[arg(long = "event-id")]
        event: Option<String>,
    },

    /// Create a new tag
    Tag {
        /// Tag name
        name: String,
    },

    /// Create a new event
    Event,
}

/// A single resource addressed by its identifier
#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// A log entry by id
    Log { id: String },

    /// A tag by name
    Tag { name: String },

    /// An event by id
    Event { id: String },
}

impl ResourceCommand {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Log { .. } => ResourceKind::LogEntry,
            Self::Tag { .. } => ResourceKind::Tag,
            Self::Event { .. } => ResourceKind::Event,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Log { id } | Self::Event { id } => id,
            Self::Tag { name } => name,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Query and list log entries
    Logs {
        /// Search by tag name
        #[arg(short, long = "tag-name")]
        tag: Option<String>,

        /// Search term
        #[arg(short, long = "search-term")]
        search: Option<String>,
    },

    /// Query and list tags
    Tags {
        /// Search by tag name
        #[arg(short = 'n', long = "tag-name")]
        name: Option<String>,

        /// Search by associated tags
        #[arg(short, long = "assoc-tags")]
        assoc: Option<String>,
    },

    /// Query and list events
    Events {
        /// Event category
        #[arg(long, value_parser = parse_category)]
        category: Option<EventCategory>,

        /// Event weight lower bound
        #[arg(short, long)]
        weight: Option<i64>,
    },
}

fn parse_category(value: &str) -> Result<EventCategory, String> {
    value.parse()
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Snapshot the data directory into the snapshots directory
    Backup,

    /// Unpack a snapshot over the data directory
    Restore {
        /// Snapshot tarball
        snapshot: PathBuf,
    },

    /// Copy every resource of a kind into another environment
    Migrate {
        /// Resource kind to copy
        kind: MigrateKind,

        /// Target environment
        #[arg(long)]
        to: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateKind {
    Tags,
    Logs,
}

impl MigrateKind {
    pub fn resource(self) -> ResourceKind {
        match self {
            Self::Tags => ResourceKind::Tag,
            Self::Logs => ResourceKind::LogEntry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["jarvis", "summary"]);
        assert_eq!(cli.environment, "default");
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert!(matches!(cli.command, Command::Summary));
    }

    #[test]
    fn test_cli_parse_new_tag() {
        let cli = Cli::parse_from(["jarvis", "new", "tag", "Weather"]);
        if let Command::New {
            resource: NewCommand::Tag { name },
        } = cli.command
        {
            assert_eq!(name, "Weather");
        } else {
            panic!("Expected New Tag command");
        }
    }

    #[test]
    fn test_cli_parse_new_log_with_event() {
        let cli = Cli::parse_from(["jarvis", "new", "log", "--event-id", "ev-9"]);
        assert!(matches!(
            cli.command,
            Command::New { resource: NewCommand::Log { event: Some(ref e) } } if e == "ev-9"
        ));
    }

    #[test]
    fn test_cli_parse_edit_log() {
        let cli = Cli::parse_from(["jarvis", "edit", "log", "42"]);
        if let Command::Edit { resource } = cli.command {
            assert_eq!(resource.kind(), ResourceKind::LogEntry);
            assert_eq!(resource.id(), "42");
        } else {
            panic!("Expected Edit command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["jarvis", "show", "tag", "Weather", "-e", "staging", "-l", "debug"]);
        assert_eq!(cli.environment, "staging");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_parse_list_logs() {
        let cli = Cli::parse_from(["jarvis", "list", "logs", "-t", "Weather", "-s", "sunny"]);
        if let Command::List {
            listing: ListCommand::Logs { tag, search },
        } = cli.command
        {
            assert_eq!(tag.as_deref(), Some("Weather"));
            assert_eq!(search.as_deref(), Some("sunny"));
        } else {
            panic!("Expected List Logs command");
        }
    }

    #[test]
    fn test_cli_parse_list_events_category() {
        let cli = Cli::parse_from(["jarvis", "list", "events", "--category", "detected", "-w", "10"]);
        assert!(matches!(
            cli.command,
            Command::List {
                listing: ListCommand::Events {
                    category: Some(EventCategory::Detected),
                    weight: Some(10)
                }
            }
        ));
        assert!(Cli::try_parse_from(["jarvis", "list", "events", "--category", "bogus"]).is_err());
    }

    #[test]
    fn test_cli_parse_admin_migrate() {
        let cli = Cli::parse_from(["jarvis", "admin", "migrate", "tags", "--to", "staging"]);
        if let Command::Admin {
            command: AdminCommand::Migrate { kind, to },
        } = cli.command
        {
            assert_eq!(kind.resource(), ResourceKind::Tag);
            assert_eq!(to, "staging");
        } else {
            panic!("Expected Admin Migrate command");
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["jarvis"]).is_err());
        assert!(Cli::try_parse_from(["jarvis", "new"]).is_err());
    }
}
