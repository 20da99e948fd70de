// src/core/mod.rs - Chase data model, configuration and events
pub mod components;
pub mod config;
pub mod events;
pub mod grid;
pub mod pellets;
pub mod resources;

pub use components::*;
pub use config::*;
pub use events::*;
pub use grid::*;
pub use pellets::*;
pub use resources::*;
