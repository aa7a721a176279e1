//! CLI command definitions using clap.
//!
//! Built-in subcommands:
//! - list: list active tools
//! - info: show one tool's manifest
//! - kit: list kits, show a kit, show active kits
//! - version: print the dispatcher version
//!
//! Any other first word is a tool name; everything after it goes to the tool untouched.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// kitcmd - a dispatcher for a collection of small command-line tools
#[derive(Parser, Debug)]
#[command(name = "kitcmd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root containing projects/ and kits/
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable an extra kit for this run
    #[arg(long = "kit", value_name = "KIT")]
    pub enable_kits: Vec<String>,

    /// Disable an opt-in kit for this run
    #[arg(long = "without-kit", value_name = "KIT")]
    pub disable_kits: Vec<String>,

    /// Subcommand or tool to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available tools
    List {
        /// Only tools in this namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Only tools covered by this kit
        #[arg(short, long)]
        kit: Option<String>,

        /// Only tools carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only tools declaring this platform category
        #[arg(short, long)]
        platform: Option<String>,

        /// Include tools that cannot run on this host
        #[arg(short, long)]
        all_platforms: bool,
    },

    /// Show details for a tool
    Info {
        /// Tool name
        tool: String,
    },

    /// Kit management commands
    Kit {
        #[command(subcommand)]
        command: KitCommands,
    },

    /// Print version information
    Version,

    /// Run a tool, forwarding every following argument unchanged
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

/// Kit subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KitCommands {
    /// List kits, or the tools of one kit
    List {
        /// Kit to show
        kit: Option<String>,
    },

    /// Show active kits
    Status,
}
