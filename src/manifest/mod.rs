//! Manifest Model - tool descriptors, runtime variants and platform rules

mod definition;
mod parse;
pub mod platform;

pub use definition::{
    DEFAULT_ENTRY_POINT, DEFAULT_INTERPRETER, DEFAULT_SHELL, MANIFEST_FILE, Manifest, Runtime, Taxonomy,
};
pub use parse::{ManifestOrigin, is_filesystem_safe};
pub use platform::Os;
