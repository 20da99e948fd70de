pub mod core;
pub mod plugin;
pub mod systems;

pub use crate::core::*;
pub use plugin::*;
pub use systems::*;
