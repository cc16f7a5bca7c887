//!
//!

use crate::prelude::*;
use bevy::prelude::*;

#[derive(Bundle)]
pub struct SectorTerrainBundle {
	terrain: TerrainWorld,
	path_grid: PathGrid,
}

impl SectorTerrainBundle {
	/// Create a new instance of [SectorTerrainBundle] from a [WorldConfig].
	/// The world starts empty - sectors stream in once an [Anchor] exists
	pub fn new(config: WorldConfig) -> Self {
		let terrain = TerrainWorld::new(config);
		let path_grid = PathGrid::default();
		SectorTerrainBundle { terrain, path_grid }
	}
	/// Create a new instance of [SectorTerrainBundle] where the
	/// [WorldConfig] is derived from a RON file on disk
	#[cfg(feature = "ron")]
	pub fn new_from_disk(path: &str) -> Self {
		let config = WorldConfig::from_file(path.to_string());
		SectorTerrainBundle::new(config)
	}
}
