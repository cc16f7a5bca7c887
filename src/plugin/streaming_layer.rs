//! Logic for driving [TerrainWorld] convergence from the [Anchor] position
//! each frame and for applying configuration and perspective changes, which
//! tear the world down and regenerate it
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Marks the position terrain streams around, typically attached to the
/// player entity and kept in sync with its movement
#[derive(Component, Default)]
pub struct Anchor(pub Vec2);

/// Used to replace the [WorldConfig] of every terrain world, forcing a full
/// teardown and regeneration from the new values
#[derive(Event)]
pub struct EventReconfigureWorld {
	/// The configuration to apply
	config: WorldConfig,
}

impl EventReconfigureWorld {
	/// Create a new instance of [EventReconfigureWorld]
	#[cfg(not(tarpaulin_include))]
	pub fn new(config: WorldConfig) -> Self {
		EventReconfigureWorld { config }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_config(&self) -> &WorldConfig {
		&self.config
	}
}

/// Used to switch the viewing [Perspective] of every terrain world
#[derive(Event)]
pub struct EventSetPerspective {
	/// The perspective to switch to
	perspective: Perspective,
}

impl EventSetPerspective {
	/// Create a new instance of [EventSetPerspective]
	#[cfg(not(tarpaulin_include))]
	pub fn new(perspective: Perspective) -> Self {
		EventSetPerspective { perspective }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_perspective(&self) -> Perspective {
		self.perspective
	}
}

/// Read [EventReconfigureWorld] and rebuild each [TerrainWorld] (and its
/// [PathGrid]) with the new configuration
#[cfg(not(tarpaulin_include))]
pub fn process_reconfigure_events(
	mut events: EventReader<EventReconfigureWorld>,
	mut query: Query<(&mut TerrainWorld, &mut PathGrid)>,
) {
	for event in events.read() {
		for (mut world, mut grid) in query.iter_mut() {
			if world.reconfigure(event.get_config().clone()) {
				grid.rebuild(&world);
			}
		}
	}
}

/// Read [EventSetPerspective] and rebuild each [TerrainWorld] (and its
/// [PathGrid]) under the new perspective
#[cfg(not(tarpaulin_include))]
pub fn process_perspective_events(
	mut events: EventReader<EventSetPerspective>,
	mut query: Query<(&mut TerrainWorld, &mut PathGrid)>,
) {
	for event in events.read() {
		for (mut world, mut grid) in query.iter_mut() {
			if world.set_perspective(event.get_perspective()) {
				grid.rebuild(&world);
			}
		}
	}
}

/// Converge each [TerrainWorld] on the current [Anchor] position, rebuilding
/// the [PathGrid] whenever the anchor entered a new sector
#[cfg(not(tarpaulin_include))]
pub fn stream_sectors(
	anchors: Query<&Anchor>,
	mut query: Query<(&mut TerrainWorld, &mut PathGrid)>,
) {
	let Some(anchor) = anchors.iter().next() else {
		return;
	};
	for (mut world, mut grid) in query.iter_mut() {
		if world.update(anchor.0) {
			grid.rebuild(&world);
		}
	}
}
