//! Shared direction handling and packed coordinate keys used by cells,
//! sectors and the pathing grid
//!

use bevy::prelude::*;

/// Offset added to a signed grid coordinate before packing it into a key,
/// allowing coordinates in the range `-32768..=32767` to be stored as an
/// unsigned 16-bit half of the key
pub const KEY_OFFSET: i32 = 32768;

/// Number of pathing grid cells along one axis of a single world cell,
/// allowing paths to route around obstacles at sub-cell granularity
pub const PATH_GRID_SCALE: i32 = 3;

/// Convenience way of accessing the 8 directions of neighbouring cells and
/// sectors. Cliff edges may face any of the 8 directions, ramps only ever
/// face [Ordinal::West] or [Ordinal::East]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Reflect)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
}

impl Ordinal {
	/// All 8 directions, cardinals first
	pub const ALL: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
		Ordinal::NorthEast,
		Ordinal::SouthEast,
		Ordinal::SouthWest,
		Ordinal::NorthWest,
	];
	/// The 4 cardinal directions
	pub const CARDINALS: [Ordinal; 4] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
	];
	/// The directions a ramp may face, in the order they are tested - the
	/// first direction satisfying the ramp rules wins
	pub const RAMP_DIRECTIONS: [Ordinal; 2] = [Ordinal::West, Ordinal::East];
	/// The `(x, y)` world-grid offset of the neighbour in this direction,
	/// where `x` grows eastwards and `y` grows northwards
	pub fn offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, 1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, -1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, 1),
			Ordinal::SouthEast => (1, -1),
			Ordinal::SouthWest => (-1, -1),
			Ordinal::NorthWest => (-1, 1),
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
		}
	}
	/// Whether this is one of the 4 cardinal directions
	pub fn is_cardinal(&self) -> bool {
		matches!(
			self,
			Ordinal::North | Ordinal::East | Ordinal::South | Ordinal::West
		)
	}
}

/// Pack a signed `(x, y)` grid coordinate into a single integer. Bijective
/// for coordinates within `-32768..=32767`
fn pack(x: i32, y: i32) -> u32 {
	debug_assert!(
		(-KEY_OFFSET..KEY_OFFSET).contains(&x) && (-KEY_OFFSET..KEY_OFFSET).contains(&y),
		"Coordinate ({}, {}) is outside the packable range",
		x,
		y
	);
	(((x + KEY_OFFSET) as u32) << 16) | ((y + KEY_OFFSET) as u32 & 0xFFFF)
}

/// Recover the signed `(x, y)` grid coordinate from a packed key
fn unpack(key: u32) -> (i32, i32) {
	let x = (key >> 16) as i32 - KEY_OFFSET;
	let y = (key & 0xFFFF) as i32 - KEY_OFFSET;
	(x, y)
}

/// Unique ID of a [crate::prelude::Cell], packed from its integer world-grid
/// coordinate so it can be used directly as a registry map key
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct CellKey(u32);

impl CellKey {
	/// Create a key from an integer world-grid coordinate
	pub fn from_coords(x: i32, y: i32) -> Self {
		CellKey(pack(x, y))
	}
	/// Create a key from a world position by rounding it to the containing
	/// grid cell - cells are unit squares centred on integer coordinates
	pub fn from_world(position: Vec2) -> Self {
		CellKey::from_coords(position.x.round() as i32, position.y.round() as i32)
	}
	/// Get the packed key value
	pub fn get(&self) -> u32 {
		self.0
	}
	/// Get the `(x, y)` world-grid coordinate of the cell
	pub fn to_coords(&self) -> (i32, i32) {
		unpack(self.0)
	}
	/// The key of the adjacent cell in the given direction
	pub fn neighbour(&self, ordinal: Ordinal) -> CellKey {
		let (x, y) = self.to_coords();
		let (dx, dy) = ordinal.offset();
		CellKey::from_coords(x + dx, y + dy)
	}
	/// The key of the cell `steps` cells away in the given direction
	pub fn neighbour_at(&self, ordinal: Ordinal, steps: i32) -> CellKey {
		let (x, y) = self.to_coords();
		let (dx, dy) = ordinal.offset();
		CellKey::from_coords(x + dx * steps, y + dy * steps)
	}
}

/// Unique ID of a [crate::prelude::Sector], packed from its integer
/// sector-grid coordinate with the same scheme as [CellKey]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct SectorKey(u32);

impl SectorKey {
	/// Create a key from an integer sector-grid coordinate
	pub fn from_coords(x: i32, y: i32) -> Self {
		SectorKey(pack(x, y))
	}
	/// Get the packed key value
	pub fn get(&self) -> u32 {
		self.0
	}
	/// Get the `(x, y)` sector-grid coordinate of the sector
	pub fn to_coords(&self) -> (i32, i32) {
		unpack(self.0)
	}
	/// The key of the adjacent sector in the given direction. Sectors are
	/// referenced by coordinate arithmetic, never by stored pointers
	pub fn neighbour(&self, ordinal: Ordinal) -> SectorKey {
		let (x, y) = self.to_coords();
		let (dx, dy) = ordinal.offset();
		SectorKey::from_coords(x + dx, y + dy)
	}
	/// The keys of all 8 neighbouring sectors
	pub fn neighbours(&self) -> [SectorKey; 8] {
		let mut keys = [SectorKey::default(); 8];
		for (i, ordinal) in Ordinal::ALL.iter().enumerate() {
			keys[i] = self.neighbour(*ordinal);
		}
		keys
	}
}
