//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Local tracker for issue-tracker XML exports
#[derive(Parser, Debug)]
#[command(name = "tdk", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (auto-discover .ticketdeck if not set)
    #[arg(long, global = true, env = "TDK_DIR")]
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a ticketdeck workspace
    Init {
        /// Overwrite an existing task snapshot
        #[arg(long)]
        force: bool,
    },

    /// Import a tracker XML export
    Import(ImportArgs),

    /// List tickets
    List(ListArgs),

    /// Show ticket details
    Show {
        /// Ticket key
        key: String,
    },

    /// Show aggregate statistics
    Stats,

    /// Manage ticket labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },

    /// Mark a ticket done (or clear the override with --undo)
    Done {
        /// Ticket key
        key: String,

        /// Clear the user override and fall back to the tracker status
        #[arg(long)]
        undo: bool,
    },

    /// Set or clear a ticket's due date
    Due {
        /// Ticket key
        key: String,

        /// Date (YYYY-MM-DD, RFC3339) or "none"
        date: String,
    },

    /// Delete a ticket from the collection
    Delete {
        /// Ticket key
        key: String,
    },

    /// Remove every ticket
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },

    /// Manage project detection rules
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },

    /// Manage the ticket blacklist
    Blacklist {
        #[command(subcommand)]
        command: BlacklistCommands,
    },

    /// Manage custom tags
    Tags {
        #[command(subcommand)]
        command: TagsCommands,
    },

    /// Export a snapshot (stdout unless -o)
    Export {
        /// Output file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Load a snapshot, replacing tickets and user config
    Load {
        /// Snapshot file
        file: PathBuf,
    },

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the import command.
///
/// `--policy` stays a plain string so unknown values get a structured hint
/// instead of a clap usage error.
#[derive(Args, Debug, Clone, Default)]
pub struct ImportArgs {
    /// XML export file
    pub file: PathBuf,

    /// Merge policy: add, update, replace
    #[arg(long)]
    pub policy: Option<String>,

    /// Fields to overwrite with --policy update (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Keys to update with --policy update (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    pub keys: Vec<String>,

    /// Update every imported key with --policy update
    #[arg(long)]
    pub all: bool,

    /// Classify and report without saving
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only these projects (repeatable)
    #[arg(long = "project")]
    pub projects: Vec<String>,

    /// Only these reporters (repeatable; "nopeople" for unreported)
    #[arg(long = "person")]
    pub people: Vec<String>,

    /// Tickets carrying any of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Substring match on the summary
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Hide tickets whose status is done
    #[arg(long)]
    pub hide_done: bool,

    /// Hide tickets labeled "done"
    #[arg(long)]
    pub hide_label_done: bool,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Add a label to a ticket
    Add {
        key: String,
        label: String,
    },
    /// Remove a label from a ticket
    Remove {
        key: String,
        label: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List project rules
    List,
    /// Add a rule (or extend an existing one)
    Add {
        name: String,
        /// Title patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Remove a rule
    Remove { name: String },
    /// Rename a rule
    Rename { old: String, new: String },
    /// Add a pattern to a rule
    AddPattern { name: String, pattern: String },
    /// Remove a pattern from a rule
    RemovePattern { name: String, pattern: String },
    /// Assign projects to tickets that have none
    Apply,
}

#[derive(Subcommand, Debug)]
pub enum BlacklistCommands {
    /// Hide a ticket from views and counts
    Add { key: String },
    /// Unhide a ticket
    Remove { key: String },
    /// List blacklisted keys
    List,
}

#[derive(Subcommand, Debug)]
pub enum TagsCommands {
    /// Register a custom tag
    Add { tag: String },
    /// Unregister a custom tag
    Remove { tag: String },
    /// List tags with ticket counts
    List,
}

/// Arguments for the completions command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    PowerShell,
    Elvish,
}
