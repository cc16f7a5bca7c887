//! Sectors are the unit of lazy terrain loading: fixed-size square grids of
//! cells, each independently advanced through a pipeline of increasingly
//! expensive generation phases as the anchor approaches and degraded back
//! down as it leaves
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The ordered stages of a sector's lazy-computation pipeline. A sector at a
/// given phase has fully valid data for every phase at or below it and no
/// data for any phase above it; transitions only ever move a single step at
/// a time
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum SectorPhase {
	/// No data at all - the state of a freshly referenced sector and the
	/// point at which a degraded sector is destroyed
	#[default]
	Bare,
	/// Cells exist with noise samples and quantized cliff heights
	Noise,
	/// Cells carry cliff-edge flags derived from neighbouring heights
	Cliffs,
	/// Cells carry ramp directions where a valid ramp was detected
	Ramps,
	/// Per-cliff-height renderers and per-cell tile selections exist
	Renderers,
	/// Collision rails exist along cliff edges and ramp flanks
	Rails,
}

impl SectorPhase {
	/// The fully loaded phase
	pub const MAX: SectorPhase = SectorPhase::Rails;
	/// The phase a single advance step moves into, [None] at [Self::MAX]
	pub fn next(&self) -> Option<SectorPhase> {
		match self {
			SectorPhase::Bare => Some(SectorPhase::Noise),
			SectorPhase::Noise => Some(SectorPhase::Cliffs),
			SectorPhase::Cliffs => Some(SectorPhase::Ramps),
			SectorPhase::Ramps => Some(SectorPhase::Renderers),
			SectorPhase::Renderers => Some(SectorPhase::Rails),
			SectorPhase::Rails => None,
		}
	}
	/// The phase a single degrade step moves into, [None] at
	/// [SectorPhase::Bare]
	pub fn previous(&self) -> Option<SectorPhase> {
		match self {
			SectorPhase::Bare => None,
			SectorPhase::Noise => Some(SectorPhase::Bare),
			SectorPhase::Cliffs => Some(SectorPhase::Noise),
			SectorPhase::Ramps => Some(SectorPhase::Cliffs),
			SectorPhase::Renderers => Some(SectorPhase::Ramps),
			SectorPhase::Rails => Some(SectorPhase::Renderers),
		}
	}
	/// The phase the 8 neighbouring sectors must have reached before a
	/// sector may step into this one. Cliff detection reads neighbour cell
	/// heights, ramp detection reads neighbour edge flags and tile selection
	/// reads neighbour ramps - all cross-sector data
	pub fn neighbour_prerequisite(&self) -> Option<SectorPhase> {
		match self {
			SectorPhase::Cliffs => Some(SectorPhase::Noise),
			SectorPhase::Ramps => Some(SectorPhase::Cliffs),
			SectorPhase::Renderers => Some(SectorPhase::Ramps),
			_ => None,
		}
	}
}

/// What a [Rail] is blocking
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Reflect)]
pub enum RailKind {
	/// A drop along a cardinal cliff edge
	CliffEdge,
	/// The flank of a ramp, funnelling movement along its length
	Ramp,
}

/// A physical blocking segment along a cell boundary, consumed by physics
/// collaborators to stop movement off cliffs. Built at the rails phase
#[derive(Clone, Copy, Debug)]
pub struct Rail {
	/// One end of the segment in world space
	start: Vec2,
	/// The other end of the segment in world space
	end: Vec2,
	/// What the segment is blocking
	kind: RailKind,
}

impl Rail {
	/// Create a new instance of [Rail]
	pub fn new(start: Vec2, end: Vec2, kind: RailKind) -> Self {
		Rail { start, end, kind }
	}
	/// Get the start of the segment
	pub fn get_start(&self) -> Vec2 {
		self.start
	}
	/// Get the end of the segment
	pub fn get_end(&self) -> Vec2 {
		self.end
	}
	/// Get what the segment is blocking
	pub fn get_kind(&self) -> RailKind {
		self.kind
	}
}

/// The cells of one cliff height within a sector, grouped for layered
/// drawing by render collaborators. Built at the renderers phase
pub struct CliffRenderer {
	/// The terrain level this renderer draws
	cliff_height: u8,
	/// Member cells in sector scan order, giving a deterministic draw order
	cells: Vec<CellKey>,
}

impl CliffRenderer {
	/// Create a new instance of [CliffRenderer]
	pub fn new(cliff_height: u8, cells: Vec<CellKey>) -> Self {
		CliffRenderer {
			cliff_height,
			cells,
		}
	}
	/// Get the terrain level this renderer draws
	pub fn get_cliff_height(&self) -> u8 {
		self.cliff_height
	}
	/// Get the member cells in scan order
	pub fn get_cells(&self) -> &Vec<CellKey> {
		&self.cells
	}
}

/// A fixed-size square grid of cells and the phase state machine bookkeeping
/// that lazily computes and destroys their derived data
pub struct Sector {
	/// Unique ID in the sector grid
	key: SectorKey,
	/// The actually materialised phase
	phase: SectorPhase,
	/// The externally demanded phase the manager converges `phase` towards
	min_phase: SectorPhase,
	/// Owned cells in scan order: rows descending in `y`, columns ascending
	/// in `x`, pre-sorted for deterministic render order
	cells: Vec<CellKey>,
	/// Sector-local `(column, row)` coordinates of impassable cells (water),
	/// projected into the pathing grid
	path_obstacles: Vec<(usize, usize)>,
	/// Per-cliff-height draw groupings, present at the renderers phase
	renderers: Vec<CliffRenderer>,
	/// Collision segments, present at the rails phase
	rails: Vec<Rail>,
}

impl Sector {
	/// Create a new bare instance of [Sector]
	pub fn new(key: SectorKey) -> Self {
		Sector {
			key,
			phase: SectorPhase::Bare,
			min_phase: SectorPhase::Bare,
			cells: Vec::new(),
			path_obstacles: Vec::new(),
			renderers: Vec::new(),
			rails: Vec::new(),
		}
	}
	/// Get the unique ID of the sector
	pub fn get_key(&self) -> SectorKey {
		self.key
	}
	/// Get the materialised phase
	pub fn get_phase(&self) -> SectorPhase {
		self.phase
	}
	/// Get the demanded minimum phase
	pub fn get_min_phase(&self) -> SectorPhase {
		self.min_phase
	}
	/// Get the owned cells in scan order
	pub fn get_cells(&self) -> &Vec<CellKey> {
		&self.cells
	}
	/// Get the sector-local coordinates of impassable cells
	pub fn get_path_obstacles(&self) -> &Vec<(usize, usize)> {
		&self.path_obstacles
	}
	/// Get the per-cliff-height renderers
	pub fn get_renderers(&self) -> &Vec<CliffRenderer> {
		&self.renderers
	}
	/// Get the collision rails
	pub fn get_rails(&self) -> &Vec<Rail> {
		&self.rails
	}
	/// Record a completed single-step phase transition
	pub(crate) fn set_phase(&mut self, phase: SectorPhase) {
		self.phase = phase;
	}
	/// Reset the demanded phase, done for every live sector at the start of
	/// a convergence pass
	pub(crate) fn reset_min_phase(&mut self) {
		self.min_phase = SectorPhase::Bare;
	}
	/// Raise the demanded phase - never lowers it mid-pass
	pub(crate) fn raise_min_phase(&mut self, phase: SectorPhase) {
		if phase > self.min_phase {
			self.min_phase = phase;
		}
	}
	/// Store the generated cells and obstacle list at the noise phase
	pub(crate) fn set_cells(&mut self, cells: Vec<CellKey>, obstacles: Vec<(usize, usize)>) {
		self.cells = cells;
		self.path_obstacles = obstacles;
	}
	/// Drop cell bookkeeping when degrading out of the noise phase
	pub(crate) fn clear_cells(&mut self) {
		self.cells.clear();
		self.path_obstacles.clear();
	}
	/// Store the draw groupings at the renderers phase
	pub(crate) fn set_renderers(&mut self, renderers: Vec<CliffRenderer>) {
		self.renderers = renderers;
	}
	/// Drop the draw groupings when degrading out of the renderers phase
	pub(crate) fn clear_renderers(&mut self) {
		self.renderers.clear();
	}
	/// Store the collision segments at the rails phase
	pub(crate) fn set_rails(&mut self, rails: Vec<Rail>) {
		self.rails = rails;
	}
	/// Drop the collision segments when degrading out of the rails phase
	pub(crate) fn clear_rails(&mut self) {
		self.rails.clear();
	}
}
