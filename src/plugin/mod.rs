//! Defines the Bevy [Plugin] for sector terrain streaming
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod streaming_layer;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum StreamingSet {
	Configure,
	Stream,
}

pub struct SectorTerrainPlugin;

impl Plugin for SectorTerrainPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<CellKey>()
			.register_type::<SectorKey>()
			.register_type::<SectorPhase>()
			.register_type::<Perspective>()
			.register_type::<RailKind>()
			.add_event::<streaming_layer::EventReconfigureWorld>()
			.add_event::<streaming_layer::EventSetPerspective>()
			.configure_sets(
				Update,
				(StreamingSet::Configure, StreamingSet::Stream).chain(),
			)
			.add_systems(
				Update,
				(
					(
						streaming_layer::process_reconfigure_events,
						streaming_layer::process_perspective_events,
					)
						.in_set(StreamingSet::Configure),
					streaming_layer::stream_sectors.in_set(StreamingSet::Stream),
				),
			);
	}
}
