//! kitcmd - a dispatcher for a collection of small command-line tools
//!
//! Tools live under `projects/<namespace>/<tool>/` with a `.kitcmd.json`
//! manifest. Kits group tools into sets that can be switched on and off.
//! One invocation discovers everything, builds a command table and runs a
//! single tool with its arguments forwarded untouched.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod kits;
pub mod manifest;
pub mod registry;
pub mod scanner;

pub use error::{KitcmdError, Result};
