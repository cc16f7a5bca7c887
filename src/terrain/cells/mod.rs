//! The atomic terrain unit and the rules deriving its data.
//!
//! A [Cell] is a unit square of terrain centred on an integer world
//! coordinate. Its noise sample is quantized into an integer cliff height by
//! bucketing against the configured boundary thresholds. Cells then gain
//! cliff-edge flags (which of the 8 neighbours sit strictly lower), possibly
//! a ramp direction (a traversable slope between two adjacent cliff
//! heights), and finally render-only tile data - each computed at a later
//! sector phase and cleared again when the owning sector degrades, never
//! left stale.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Tile index used by ramp cells facing west
pub const TILE_RAMP_WEST: usize = 16;
/// Tile index used by ramp cells facing east
pub const TILE_RAMP_EAST: usize = 17;

/// A single terrain grid unit
pub struct Cell {
	/// Integer world-grid coordinate
	world: (i32, i32),
	/// `(column, row)` position within the owning sector, row 0 at the top
	local: (usize, usize),
	/// Raw noise sample in `0.0..=1.0`
	noise: f32,
	/// Quantized terrain level, 0 is water
	cliff_height: u8,
	/// Directions in which the neighbouring cell sits strictly lower.
	/// [None] until the owning sector reaches the cliffs phase
	cliff_edges: Option<Vec<Ordinal>>,
	/// Direction of the higher neighbour this cell ramps up towards, only
	/// ever [Ordinal::West] or [Ordinal::East]. Computed at the ramps phase
	ramp: Option<Ordinal>,
	/// Render-stage tile selection and draw position. [None] until the
	/// owning sector reaches the renderers phase
	render: Option<CellRender>,
}

impl Cell {
	/// Create a new instance of [Cell] from its generation-phase data
	pub fn new(world: (i32, i32), local: (usize, usize), noise: f32, cliff_height: u8) -> Self {
		Cell {
			world,
			local,
			noise,
			cliff_height,
			cliff_edges: None,
			ramp: None,
			render: None,
		}
	}
	/// Get the integer world-grid coordinate
	pub fn get_world_coords(&self) -> (i32, i32) {
		self.world
	}
	/// Get the `(column, row)` position within the owning sector
	pub fn get_local_coords(&self) -> (usize, usize) {
		self.local
	}
	/// Get the registry key of this cell
	pub fn key(&self) -> CellKey {
		CellKey::from_coords(self.world.0, self.world.1)
	}
	/// Get the raw noise sample
	pub fn get_noise(&self) -> f32 {
		self.noise
	}
	/// Get the quantized terrain level
	pub fn get_cliff_height(&self) -> u8 {
		self.cliff_height
	}
	/// Get the cliff-edge directions, [None] if the owning sector hasn't
	/// reached the cliffs phase
	pub fn get_cliff_edges(&self) -> Option<&Vec<Ordinal>> {
		self.cliff_edges.as_ref()
	}
	/// Whether this cell is a cliff edge in the given direction
	pub fn is_cliff_edge(&self, ordinal: Ordinal) -> bool {
		self.cliff_edges
			.as_ref()
			.is_some_and(|edges| edges.contains(&ordinal))
	}
	/// Get the ramp direction, [None] if the cell is not a ramp or the
	/// owning sector hasn't reached the ramps phase
	pub fn get_ramp(&self) -> Option<Ordinal> {
		self.ramp
	}
	/// Get the render data, [None] until the owning sector reaches the
	/// renderers phase
	pub fn get_render(&self) -> Option<&CellRender> {
		self.render.as_ref()
	}
	/// Record the computed cliff-edge directions
	pub(crate) fn set_cliff_edges(&mut self, edges: Vec<Ordinal>) {
		self.cliff_edges = Some(edges);
	}
	/// Clear cliff-edge data when the owning sector degrades below cliffs
	pub(crate) fn clear_cliff_edges(&mut self) {
		self.cliff_edges = None;
	}
	/// Record the detected ramp direction
	pub(crate) fn set_ramp(&mut self, ramp: Option<Ordinal>) {
		self.ramp = ramp;
	}
	/// Clear ramp data when the owning sector degrades below ramps
	pub(crate) fn clear_ramp(&mut self) {
		self.ramp = None;
	}
	/// Record the render-stage data
	pub(crate) fn set_render(&mut self, render: CellRender) {
		self.render = Some(render);
	}
	/// Clear render data when the owning sector degrades below renderers
	pub(crate) fn clear_render(&mut self) {
		self.render = None;
	}
}

/// Render-stage data of a cell, only present once the owning sector has
/// reached the renderers phase
pub struct CellRender {
	/// Index into the collaborator's tile sheet
	tile: usize,
	/// Where the tile should be drawn, accounting for the perspective
	draw_position: Vec2,
}

impl CellRender {
	/// Create a new instance of [CellRender]
	pub fn new(tile: usize, draw_position: Vec2) -> Self {
		CellRender {
			tile,
			draw_position,
		}
	}
	/// Get the tile sheet index
	pub fn get_tile(&self) -> usize {
		self.tile
	}
	/// Get the draw position
	pub fn get_draw_position(&self) -> Vec2 {
		self.draw_position
	}
}

/// Bucket a noise sample against an ascending array of boundary thresholds,
/// returning the index of the first boundary the sample does not exceed, or
/// `boundaries.len()` if it exceeds all of them.
///
/// The boundaries being sorted ascending is a precondition of the caller
/// (validated once at world-config construction), not re-checked here
pub fn quantize(sample: f32, boundaries: &[f32]) -> u8 {
	for (index, boundary) in boundaries.iter().enumerate() {
		if sample <= *boundary {
			return index as u8;
		}
	}
	boundaries.len() as u8
}

/// Find the directions in which a cell's neighbour sits at a strictly lower
/// cliff height. Neighbouring cells must already exist (their sectors having
/// reached at least the noise phase) - which is exactly why advancing a
/// sector to cliffs first pulls its neighbours to noise
pub fn detect_cliff_edges<'a, F>(cell: &Cell, lookup: F) -> Vec<Ordinal>
where
	F: Fn(CellKey) -> Option<&'a Cell>,
{
	let mut edges = Vec::new();
	for ordinal in Ordinal::ALL {
		match lookup(cell.key().neighbour(ordinal)) {
			Some(neighbour) => {
				if neighbour.get_cliff_height() < cell.get_cliff_height() {
					edges.push(ordinal);
				}
			}
			None => {
				debug_assert!(
					false,
					"Cliff detection for {:?} requires neighbour {:?} to exist",
					cell.get_world_coords(),
					cell.key().neighbour(ordinal).to_coords()
				);
			}
		}
	}
	edges
}

/// Detect whether a cell is a valid ramp and in which direction, testing
/// [Ordinal::RAMP_DIRECTIONS] in order - the first direction satisfying
/// every rule wins.
///
/// For a direction `d` the rules are:
/// * the cell sits at cliff height 2 or above - ramps never touch water or
///   exit directly into it
/// * the neighbour in `d` is exactly one level higher and is itself a cliff
///   edge facing back at this cell
/// * the high landing (two cells away in `d`) matches the neighbour's level
///   and the low landing (one cell away opposite `d`) matches this cell's
///   level, so the ramp has flat ground at both ends rather than forming a
///   staircase
/// * the slope - the noise difference to the higher neighbour over the noise
///   range spanned by the boundary thresholds two levels apart - does not
///   exceed the configured threshold (inclusive)
pub fn detect_ramp<'a, F>(
	cell: &Cell,
	boundaries: &[f32],
	slope_threshold: f32,
	lookup: F,
) -> Option<Ordinal>
where
	F: Fn(CellKey) -> Option<&'a Cell>,
{
	let height = cell.get_cliff_height();
	if height < 2 {
		return None;
	}
	for direction in Ordinal::RAMP_DIRECTIONS {
		let Some(neighbour) = lookup(cell.key().neighbour(direction)) else {
			continue;
		};
		if neighbour.get_cliff_height() != height + 1
			|| !neighbour.is_cliff_edge(direction.inverse())
		{
			continue;
		}
		let Some(high_landing) = lookup(cell.key().neighbour_at(direction, 2)) else {
			continue;
		};
		if high_landing.get_cliff_height() != neighbour.get_cliff_height() {
			continue;
		}
		let Some(low_landing) = lookup(cell.key().neighbour(direction.inverse())) else {
			continue;
		};
		if low_landing.get_cliff_height() != height {
			continue;
		}
		// noise span between the boundary thresholds bracketing the climb;
		// `height >= 2` keeps the lower index valid and the +1 neighbour
		// check keeps the upper one within the boundary array
		let Some(upper) = boundaries.get(height as usize) else {
			continue;
		};
		let span = upper - boundaries[height as usize - 2];
		let slope = (neighbour.get_noise() - cell.get_noise()) / span;
		if slope <= slope_threshold {
			return Some(direction);
		}
	}
	None
}

/// Select the tile sheet index for a cell: ramps use their dedicated tiles,
/// everything else maps its cardinal cliff edges into a 16-tile autotile
/// strip indexed by the edge bitmask (north = 1, east = 2, south = 4,
/// west = 8)
pub fn select_tile(cell: &Cell) -> usize {
	if let Some(ramp) = cell.get_ramp() {
		return match ramp {
			Ordinal::West => TILE_RAMP_WEST,
			_ => TILE_RAMP_EAST,
		};
	}
	let mut bits = 0;
	if cell.is_cliff_edge(Ordinal::North) {
		bits |= 1;
	}
	if cell.is_cliff_edge(Ordinal::East) {
		bits |= 2;
	}
	if cell.is_cliff_edge(Ordinal::South) {
		bits |= 4;
	}
	if cell.is_cliff_edge(Ordinal::West) {
		bits |= 8;
	}
	bits
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	/// Boundary array used across these tests: heights 0..=4
	const BOUNDARIES: [f32; 4] = [0.2, 0.4, 0.6, 0.8];
	/// Register a cell at a coordinate with a chosen noise value, deriving
	/// its height from [BOUNDARIES]
	fn place(cells: &mut HashMap<CellKey, Cell>, world: (i32, i32), noise: f32) {
		let cell = Cell::new(world, (0, 0), noise, quantize(noise, &BOUNDARIES));
		cells.insert(cell.key(), cell);
	}
	/// Run cliff-edge detection for every placed cell that has all 8
	/// neighbours available
	fn compute_edges(cells: &mut HashMap<CellKey, Cell>, targets: &[(i32, i32)]) {
		for world in targets {
			let key = CellKey::from_coords(world.0, world.1);
			let edges = detect_cliff_edges(&cells[&key], |k| cells.get(&k));
			cells.get_mut(&key).unwrap().set_cliff_edges(edges);
		}
	}
	#[test]
	fn quantize_buckets() {
		assert_eq!(0, quantize(0.0, &BOUNDARIES));
		assert_eq!(0, quantize(0.2, &BOUNDARIES));
		assert_eq!(1, quantize(0.21, &BOUNDARIES));
		assert_eq!(2, quantize(0.5, &BOUNDARIES));
		assert_eq!(3, quantize(0.8, &BOUNDARIES));
		assert_eq!(4, quantize(0.9, &BOUNDARIES));
	}
	#[test]
	fn quantize_is_monotonic() {
		let mut previous = 0;
		for step in 0..=100 {
			let height = quantize(step as f32 / 100.0, &BOUNDARIES);
			assert!(height >= previous);
			previous = height;
		}
	}
	#[test]
	fn quantize_empty_boundaries() {
		assert_eq!(0, quantize(0.7, &[]));
	}
	#[test]
	fn cliff_edge_requires_strictly_lower() {
		let mut cells = HashMap::new();
		// centre at height 2, west neighbour lower, east neighbour equal,
		// north neighbour higher, everything else equal
		for x in -1..=1 {
			for y in -1..=1 {
				place(&mut cells, (x, y), 0.5);
			}
		}
		place(&mut cells, (-1, 0), 0.3);
		place(&mut cells, (0, 1), 0.7);
		let centre = &cells[&CellKey::from_coords(0, 0)];
		let edges = detect_cliff_edges(centre, |k| cells.get(&k));
		assert_eq!(vec![Ordinal::West], edges);
	}
	#[test]
	fn cliff_edge_symmetry() {
		// if A lists an edge towards B then B must be strictly lower
		let mut cells = HashMap::new();
		for x in -2..=2 {
			for y in -1..=1 {
				place(&mut cells, (x, y), if x >= 0 { 0.5 } else { 0.3 });
			}
		}
		let a = &cells[&CellKey::from_coords(0, 0)];
		let edges = detect_cliff_edges(a, |k| cells.get(&k));
		for edge in edges {
			let neighbour = &cells[&a.key().neighbour(edge)];
			assert!(neighbour.get_cliff_height() < a.get_cliff_height());
		}
	}
	/// Build the canonical west-facing ramp arrangement: a height-3 plateau
	/// to the west dropping to a height-2 shelf, with the candidate at the
	/// shelf's western end
	fn ramp_world() -> HashMap<CellKey, Cell> {
		let mut cells = HashMap::new();
		for x in -3..=2 {
			for y in -1..=1 {
				// plateau west of the candidate, shelf under and east of it
				let noise = if x < 0 { 0.65 } else { 0.5 };
				place(&mut cells, (x, y), noise);
			}
		}
		compute_edges(&mut cells, &[(-1, 0), (-2, 0), (0, 0), (1, 0)]);
		cells
	}
	#[test]
	fn ramp_detected_westwards() {
		let cells = ramp_world();
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		assert_eq!(2, candidate.get_cliff_height());
		let ramp = detect_ramp(candidate, &BOUNDARIES, 0.5, |k| cells.get(&k));
		assert_eq!(Some(Ordinal::West), ramp);
	}
	#[test]
	fn ramp_slope_threshold_is_inclusive() {
		let cells = ramp_world();
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		// slope = (0.65 - 0.5) / (boundaries[2] - boundaries[0]) = 0.375
		let at_threshold = detect_ramp(candidate, &BOUNDARIES, 0.375, |k| cells.get(&k));
		assert_eq!(Some(Ordinal::West), at_threshold);
		let below_threshold = detect_ramp(candidate, &BOUNDARIES, 0.374, |k| cells.get(&k));
		assert_eq!(None, below_threshold);
	}
	#[test]
	fn ramp_rejects_water_adjacent_heights() {
		let mut cells = HashMap::new();
		// candidate at height 1 with a height-2 plateau west of it
		for x in -3..=2 {
			for y in -1..=1 {
				let noise = if x < 0 { 0.5 } else { 0.3 };
				place(&mut cells, (x, y), noise);
			}
		}
		compute_edges(&mut cells, &[(-1, 0)]);
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		assert_eq!(None, detect_ramp(candidate, &BOUNDARIES, 1.0, |k| cells.get(&k)));
	}
	#[test]
	fn ramp_requires_flat_high_landing() {
		let mut cells = ramp_world();
		// spike the high landing one level up, breaking the flat top
		place(&mut cells, (-2, 0), 0.85);
		compute_edges(&mut cells, &[(-1, 0)]);
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		assert_eq!(None, detect_ramp(candidate, &BOUNDARIES, 0.5, |k| cells.get(&k)));
	}
	#[test]
	fn ramp_requires_flat_low_landing() {
		let mut cells = ramp_world();
		// sink the low landing, breaking the flat bottom
		place(&mut cells, (1, 0), 0.3);
		compute_edges(&mut cells, &[(-1, 0)]);
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		assert_eq!(None, detect_ramp(candidate, &BOUNDARIES, 0.5, |k| cells.get(&k)));
	}
	#[test]
	fn ramp_requires_facing_edge() {
		let mut cells = ramp_world();
		// strip the neighbour's edge data as if cliffs were never computed
		let neighbour_key = CellKey::from_coords(-1, 0);
		cells.get_mut(&neighbour_key).unwrap().set_cliff_edges(Vec::new());
		let candidate = &cells[&CellKey::from_coords(0, 0)];
		assert_eq!(None, detect_ramp(candidate, &BOUNDARIES, 0.5, |k| cells.get(&k)));
	}
	#[test]
	fn tile_from_edge_bitmask() {
		let mut cell = Cell::new((0, 0), (0, 0), 0.5, 2);
		cell.set_cliff_edges(vec![Ordinal::North, Ordinal::West, Ordinal::NorthWest]);
		// diagonal edges don't contribute to the autotile bitmask
		assert_eq!(9, select_tile(&cell));
	}
	#[test]
	fn tile_for_ramp() {
		let mut cell = Cell::new((0, 0), (0, 0), 0.5, 2);
		cell.set_cliff_edges(vec![Ordinal::North]);
		cell.set_ramp(Some(Ordinal::East));
		assert_eq!(TILE_RAMP_EAST, select_tile(&cell));
	}
}
