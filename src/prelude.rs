//! `use bevy_sector_terrain_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::terrain::{
	cells::*, noise::*, pathing::*, sectors::*, utilities::*, world::*, *,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{streaming_layer::*, *},
};
