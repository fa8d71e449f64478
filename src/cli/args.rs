//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::ReferencePolicy;

/// Heir and family-lineage forests for inheritance (Warish) and lineage certificates
#[derive(Parser, Debug)]
#[command(name = "warish")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Record store directory (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Handling of dangling, duplicate and cyclic parent references
    #[arg(long, global = true, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Show member ids in labels
    #[arg(long, global = true)]
    pub ids: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Reject member sets with reference issues
    Strict,
    /// Build a partial forest silently
    Lenient,
}

impl From<PolicyArg> for ReferencePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => ReferencePolicy::Strict,
            PolicyArg::Lenient => ReferencePolicy::Lenient,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work on a flat member-record JSON file
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Submit and show stored applications
    App {
        #[command(subcommand)]
        command: AppCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show status
    Info,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Show the forest as a tree
    Show {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the forest as nested JSON
    Json {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the numbered heir outline
    Outline {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show every root-to-leaf lineage
    Branches {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List members without descendants
    Leaves {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the ancestor chain of one member
    Ancestors {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Member id
        id: String,
    },

    /// Report reference issues (exit 65 when any)
    Validate {
        /// Member records (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    #[default]
    Tree,
    Outline,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum AppCommands {
    /// Store nested member drafts, parents first
    Submit {
        /// Application id
        application: String,
        /// Member drafts (JSON array of nested members)
        #[arg(value_hint = ValueHint::FilePath)]
        drafts: PathBuf,
    },

    /// Rebuild and show the forest of an application
    Show {
        /// Application id
        application: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Tree)]
        format: ShowFormat,
    },

    /// List stored applications
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
