//! CLI module for kitcmd - command-line interface and terminal output.
//!
//! Built-in subcommands inspect the registry; any other first word
//! dispatches to a tool.

pub mod commands;
pub mod render;

pub use commands::Cli;
