//! Kits - named tool sets and the resolver that activates them

mod kit;
mod resolver;

pub use kit::{KIT_SUFFIX, Kit, ToolRef, discover_kits};
pub use resolver::{Activation, CORE_KIT, KitResolver, KitSelection};
