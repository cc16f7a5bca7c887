//! This is a plugin for Bevy game engine to lazily stream an infinite procedural terrain of sectors around a moving anchor
//!

pub mod terrain;
pub mod bundle;
pub mod plugin;

pub mod prelude;
