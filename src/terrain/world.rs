//! The world manager: owns the sector and cell registries, decides which
//! sectors must exist at which phase from the anchor position and converges
//! every sector towards its demanded phase each tick.
//!
//! All phase work is synchronous and runs to completion within the tick that
//! requests it - crossing a sector boundary pays the full generation cost up
//! front rather than time-slicing it across frames.
//!

use std::collections::HashMap;

use crate::prelude::*;
use bevy::prelude::*;

/// Vertical draw offset per cliff height level under the oblique perspective
const OBLIQUE_LIFT: f32 = 0.5;

/// How the world is viewed, which changes cell draw positions and therefore
/// cannot be patched incrementally - switching forces a full regeneration
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum Perspective {
	/// Straight top-down view, cells draw at their world position
	#[default]
	TopDown,
	/// Obliquely angled view, cells draw lifted by their cliff height
	Oblique,
}

/// The complete configuration of a terrain world. Cell geometry and tile
/// selection depend on these values, so any edit forces a full
/// degrade-to-bare sweep before the new values apply
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct WorldConfig {
	/// Camera zoom factor, passed through to render collaborators
	pub camera_zoom: f32,
	/// Whether the renderers phase produces any draw data - a headless
	/// server turns this off
	pub render_terrain: bool,
	/// Whether cells select autotile indices or leave the tile at 0
	pub use_tiles: bool,
	/// How the world is viewed
	pub perspective: Perspective,
	/// Cells from a sector's centre to its edge - a sector is a square of
	/// `(2 * sector_extent + 1)^2` cells
	pub sector_extent: u16,
	/// Sectors from the anchor sector (per axis) loaded to the full phase
	pub sector_render_extent: u16,
	/// Sectors from the anchor sector (per axis) covered by the pathing grid
	pub sector_pathing_extent: u16,
	/// World seed - everything derives deterministically from it
	pub seed: u64,
	/// Noise coordinate divisor, larger values stretch terrain features
	pub noise_scale: f32,
	/// Number of noise octaves summed per sample
	pub noise_octaves: u32,
	/// Per-octave amplitude multiplier
	pub noise_persistence: f32,
	/// Per-octave frequency multiplier
	pub noise_lacunarity: f32,
	/// World-space x offset into the noise field
	pub noise_offset_x: f32,
	/// World-space y offset into the noise field
	pub noise_offset_y: f32,
	/// Fraction of the theoretical noise amplitude discarded by clamping,
	/// in `0.0..1.0`
	pub clamp_fraction: f32,
	/// Ascending noise thresholds bucketing samples into cliff heights,
	/// each in `0.0..=1.0`
	pub cliff_boundaries: Vec<f32>,
	/// Maximum slope at which a cliff transition still produces a ramp
	pub ramp_slope_threshold: f32,
}

impl Default for WorldConfig {
	fn default() -> Self {
		WorldConfig {
			camera_zoom: 1.0,
			render_terrain: true,
			use_tiles: true,
			perspective: Perspective::TopDown,
			sector_extent: 7,
			sector_render_extent: 1,
			sector_pathing_extent: 1,
			seed: 0,
			noise_scale: 25.0,
			noise_octaves: 4,
			noise_persistence: 0.5,
			noise_lacunarity: 2.0,
			noise_offset_x: 0.0,
			noise_offset_y: 0.0,
			clamp_fraction: 0.1,
			cliff_boundaries: vec![0.17, 0.33, 0.5, 0.67, 0.83],
			ramp_slope_threshold: 0.6,
		}
	}
}

impl WorldConfig {
	/// Validate the contract every other part of the system relies on,
	/// panicking on violation - these are development-time mistakes, not
	/// recoverable runtime errors
	pub fn assert_valid(&self) {
		if self.sector_extent < 1 {
			panic!("World config sector extent must be at least 1");
		}
		if self.noise_octaves < 1 {
			panic!("World config must use at least one noise octave");
		}
		if self.noise_scale <= 0.0 {
			panic!(
				"World config noise scale must be positive, got {}",
				self.noise_scale
			);
		}
		if self.noise_persistence <= 0.0 || self.noise_lacunarity <= 0.0 {
			panic!(
				"World config noise persistence and lacunarity must be positive, got {} and {}",
				self.noise_persistence, self.noise_lacunarity
			);
		}
		if !(0.0..1.0).contains(&self.clamp_fraction) {
			panic!(
				"World config clamp fraction must be within 0.0..1.0, got {}",
				self.clamp_fraction
			);
		}
		for pair in self.cliff_boundaries.windows(2) {
			if pair[0] > pair[1] {
				panic!(
					"World config cliff boundaries must be sorted ascending, got {:?}",
					self.cliff_boundaries
				);
			}
		}
		for boundary in self.cliff_boundaries.iter() {
			if !(0.0..=1.0).contains(boundary) {
				panic!(
					"World config cliff boundaries must be fractions within 0.0..=1.0, got {:?}",
					self.cliff_boundaries
				);
			}
		}
	}
	/// Cells along one side of a sector
	pub fn sector_side(&self) -> i32 {
		2 * self.sector_extent as i32 + 1
	}
	/// Load a [WorldConfig] from a RON file on disk
	#[cfg(feature = "ron")]
	pub fn from_file(path: String) -> Self {
		let file = std::fs::File::open(&path).expect("Failed opening world config file");
		let config: WorldConfig = match ron::de::from_reader(file) {
			Ok(config) => config,
			Err(error) => panic!("Failed deserializing world config: {}", error),
		};
		config.assert_valid();
		config
	}
}

/// A paired advance/degrade step of the sector pipeline
struct PhaseStep {
	/// Builds the data of the phase being entered
	up: fn(&mut TerrainWorld, SectorKey),
	/// Destroys the data of the phase being left
	down: fn(&mut TerrainWorld, SectorKey),
}

/// Transition table indexed by [step_index] of the phase a step enters
/// (advancing) or leaves (degrading)
const PHASE_STEPS: [PhaseStep; 5] = [
	PhaseStep {
		up: TerrainWorld::build_noise,
		down: TerrainWorld::drop_noise,
	},
	PhaseStep {
		up: TerrainWorld::build_cliffs,
		down: TerrainWorld::drop_cliffs,
	},
	PhaseStep {
		up: TerrainWorld::build_ramps,
		down: TerrainWorld::drop_ramps,
	},
	PhaseStep {
		up: TerrainWorld::build_renderers,
		down: TerrainWorld::drop_renderers,
	},
	PhaseStep {
		up: TerrainWorld::build_rails,
		down: TerrainWorld::drop_rails,
	},
];

/// Index into [PHASE_STEPS] for a non-bare phase
fn step_index(phase: SectorPhase) -> usize {
	phase as usize - 1
}

/// The live terrain: configuration, noise field and the sector/cell
/// registries, owned as explicit state rather than ambient singletons
#[derive(Component)]
pub struct TerrainWorld {
	/// Active configuration
	config: WorldConfig,
	/// Sampler derived from the active configuration
	noise: NoiseField,
	/// Registry of live sectors
	sectors: HashMap<SectorKey, Sector>,
	/// Registry of live cells - a secondary index by world coordinate,
	/// lifecycle driven by the owning sectors
	cells: HashMap<CellKey, Cell>,
	/// Sector containing the anchor at the last completed update, the
	/// primary per-tick throttle
	anchor_sector: Option<SectorKey>,
	/// Anchor position at the last completed update, replayed after a
	/// reconfiguration
	anchor_position: Option<Vec2>,
}

impl TerrainWorld {
	/// Create a new instance of [TerrainWorld] from a validated config
	pub fn new(config: WorldConfig) -> Self {
		config.assert_valid();
		let noise = Self::noise_from(&config);
		TerrainWorld {
			config,
			noise,
			sectors: HashMap::new(),
			cells: HashMap::new(),
			anchor_sector: None,
			anchor_position: None,
		}
	}
	/// Build the noise sampler a config describes
	fn noise_from(config: &WorldConfig) -> NoiseField {
		NoiseField::new(
			config.seed,
			config.noise_scale,
			config.noise_octaves,
			config.noise_persistence,
			config.noise_lacunarity,
			config.noise_offset_x,
			config.noise_offset_y,
			config.clamp_fraction,
		)
	}
	/// Get the active configuration
	pub fn get_config(&self) -> &WorldConfig {
		&self.config
	}
	/// Get the registry of live sectors
	pub fn get_sectors(&self) -> &HashMap<SectorKey, Sector> {
		&self.sectors
	}
	/// Get the registry of live cells
	pub fn get_cells(&self) -> &HashMap<CellKey, Cell> {
		&self.cells
	}
	/// Get the sector containing the anchor at the last completed update
	pub fn get_anchor_sector(&self) -> Option<SectorKey> {
		self.anchor_sector
	}
	/// The sector key containing a world position
	pub fn sector_key_for_position(&self, position: Vec2) -> SectorKey {
		let side = self.config.sector_side();
		let extent = self.config.sector_extent as i32;
		let cell_x = position.x.round() as i32;
		let cell_y = position.y.round() as i32;
		SectorKey::from_coords(
			(cell_x + extent).div_euclid(side),
			(cell_y + extent).div_euclid(side),
		)
	}
	/// The world cell coordinate of a sector's bottom-left (minimum) corner
	pub fn sector_min_corner(&self, key: SectorKey) -> (i32, i32) {
		let side = self.config.sector_side();
		let extent = self.config.sector_extent as i32;
		let (sx, sy) = key.to_coords();
		(sx * side - extent, sy * side - extent)
	}
	/// Fetch a sector, creating it bare on first reference
	fn get_or_create_sector(&mut self, key: SectorKey) -> &mut Sector {
		self.sectors.entry(key).or_insert_with(|| Sector::new(key))
	}
	/// Converge the world on a new anchor position: load every sector
	/// within the render extent to the full phase (pulling in dependency
	/// neighbours transitively) and degrade everything no longer demanded.
	/// Returns whether any work was performed - if the anchor is still in
	/// the sector it was in last tick this is a no-op, the system's primary
	/// throttle
	pub fn update(&mut self, anchor: Vec2) -> bool {
		let anchor_key = self.sector_key_for_position(anchor);
		if Some(anchor_key) == self.anchor_sector {
			return false;
		}
		self.anchor_sector = Some(anchor_key);
		self.anchor_position = Some(anchor);
		// every demand is recomputed from scratch each pass
		for sector in self.sectors.values_mut() {
			sector.reset_min_phase();
		}
		let render_extent = self.config.sector_render_extent as i32;
		let (ax, ay) = anchor_key.to_coords();
		for dy in -render_extent..=render_extent {
			for dx in -render_extent..=render_extent {
				let key = SectorKey::from_coords(ax + dx, ay + dy);
				self.get_or_create_sector(key)
					.raise_min_phase(SectorPhase::MAX);
				let mut visited = HashMap::new();
				self.advance_sector_to(key, SectorPhase::MAX, &mut visited);
			}
		}
		// degrade towards the recomputed demands, destroying sectors whose
		// demand dropped all the way to bare
		let keys: Vec<SectorKey> = self.sectors.keys().copied().collect();
		for key in keys {
			if let Some(target) = self.sectors.get(&key).map(|sector| sector.get_min_phase()) {
				self.degrade_sector_to(key, target);
			}
		}
		true
	}
	/// Apply a new configuration: degrade every sector to bare first, swap
	/// the config and noise field in, then re-run the convergence pass from
	/// the remembered anchor. Returns whether a rebuild took place
	pub fn reconfigure(&mut self, config: WorldConfig) -> bool {
		config.assert_valid();
		let keys: Vec<SectorKey> = self.sectors.keys().copied().collect();
		for key in keys {
			self.degrade_sector_to(key, SectorPhase::Bare);
		}
		self.noise = Self::noise_from(&config);
		self.config = config;
		self.anchor_sector = None;
		if let Some(anchor) = self.anchor_position {
			self.update(anchor)
		} else {
			false
		}
	}
	/// Switch the viewing perspective, forcing the full rebuild sweep cell
	/// draw data requires. Returns whether a rebuild took place
	pub fn set_perspective(&mut self, perspective: Perspective) -> bool {
		if perspective == self.config.perspective {
			return false;
		}
		let mut config = self.config.clone();
		config.perspective = perspective;
		self.reconfigure(config)
	}
	/// Advance a sector one step at a time until it reaches `target`,
	/// recursively pulling the 8 neighbouring sectors to each step's
	/// prerequisite phase first. `visited` spans one top-level call and
	/// records the highest target already satisfied per sector, guaranteeing
	/// termination when two adjacent sectors would otherwise pull on each
	/// other forever while still allowing a revisit at a higher target - a
	/// sector pulled to noise early in the pass may legitimately be pulled
	/// again to cliffs later in the same pass
	pub fn advance_sector_to(
		&mut self,
		key: SectorKey,
		target: SectorPhase,
		visited: &mut HashMap<SectorKey, SectorPhase>,
	) {
		if visited.get(&key).is_some_and(|reached| *reached >= target) {
			return;
		}
		visited.insert(key, target);
		loop {
			let phase = match self.sectors.get(&key) {
				Some(sector) => sector.get_phase(),
				None => return,
			};
			if phase >= target {
				return;
			}
			let Some(next) = phase.next() else {
				return;
			};
			if let Some(prerequisite) = next.neighbour_prerequisite() {
				for neighbour in key.neighbours() {
					self.get_or_create_sector(neighbour)
						.raise_min_phase(prerequisite);
					self.advance_sector_to(neighbour, prerequisite, visited);
				}
			}
			(PHASE_STEPS[step_index(next)].up)(self, key);
			if let Some(sector) = self.sectors.get_mut(&key) {
				sector.set_phase(next);
			}
		}
	}
	/// Degrade a sector one step at a time until it reaches `target`,
	/// destroying it entirely once fully bare
	pub fn degrade_sector_to(&mut self, key: SectorKey, target: SectorPhase) {
		loop {
			let Some(sector) = self.sectors.get(&key) else {
				return;
			};
			let phase = sector.get_phase();
			if phase <= target {
				break;
			}
			(PHASE_STEPS[step_index(phase)].down)(self, key);
			if let Some(previous) = phase.previous() {
				if let Some(sector) = self.sectors.get_mut(&key) {
					sector.set_phase(previous);
				}
			}
		}
		if target == SectorPhase::Bare {
			self.sectors.remove(&key);
		}
	}
	/// Noise phase: batch-sample the sector's cell grid, quantize the cliff
	/// heights, create the cells in scan order and collect the impassable
	/// water cells as path obstacles
	fn build_noise(&mut self, key: SectorKey) {
		let side = self.config.sector_side() as usize;
		let (min_x, min_y) = self.sector_min_corner(key);
		let samples = self.noise.sample_region(min_x, min_y, side);
		let mut cell_keys = Vec::with_capacity(samples.len());
		let mut obstacles = Vec::new();
		let mut index = 0;
		for row in 0..side {
			let y = min_y + (side as i32 - 1) - row as i32;
			for column in 0..side {
				let x = min_x + column as i32;
				let sample = samples[index];
				index += 1;
				let height = quantize(sample, &self.config.cliff_boundaries);
				let cell = Cell::new((x, y), (column, row), sample, height);
				if height < 1 {
					obstacles.push((column, row));
				}
				cell_keys.push(cell.key());
				self.cells.insert(cell.key(), cell);
			}
		}
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.set_cells(cell_keys, obstacles);
		}
	}
	/// Inverse of [Self::build_noise]: remove the sector's cells from the
	/// registry
	fn drop_noise(&mut self, key: SectorKey) {
		let cell_keys = self.sector_cell_keys(key);
		for cell_key in cell_keys {
			self.cells.remove(&cell_key);
		}
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.clear_cells();
		}
	}
	/// Cliffs phase: flag each cell with the directions in which its
	/// neighbour sits strictly lower. Neighbour sectors are already at
	/// noise via the prerequisite pull
	fn build_cliffs(&mut self, key: SectorKey) {
		let cell_keys = self.sector_cell_keys(key);
		let mut computed = Vec::with_capacity(cell_keys.len());
		for cell_key in cell_keys.iter() {
			if let Some(cell) = self.cells.get(cell_key) {
				let edges = detect_cliff_edges(cell, |neighbour| self.cells.get(&neighbour));
				computed.push((*cell_key, edges));
			}
		}
		for (cell_key, edges) in computed {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.set_cliff_edges(edges);
			}
		}
	}
	/// Inverse of [Self::build_cliffs]: clear the edge flags
	fn drop_cliffs(&mut self, key: SectorKey) {
		for cell_key in self.sector_cell_keys(key) {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.clear_cliff_edges();
			}
		}
	}
	/// Ramps phase: detect valid east/west ramps from neighbour heights,
	/// edges and landings. Neighbour sectors are already at cliffs via the
	/// prerequisite pull
	fn build_ramps(&mut self, key: SectorKey) {
		let cell_keys = self.sector_cell_keys(key);
		let mut computed = Vec::with_capacity(cell_keys.len());
		for cell_key in cell_keys.iter() {
			if let Some(cell) = self.cells.get(cell_key) {
				let ramp = detect_ramp(
					cell,
					&self.config.cliff_boundaries,
					self.config.ramp_slope_threshold,
					|neighbour| self.cells.get(&neighbour),
				);
				computed.push((*cell_key, ramp));
			}
		}
		for (cell_key, ramp) in computed {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.set_ramp(ramp);
			}
		}
	}
	/// Inverse of [Self::build_ramps]: clear the ramp directions
	fn drop_ramps(&mut self, key: SectorKey) {
		for cell_key in self.sector_cell_keys(key) {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.clear_ramp();
			}
		}
	}
	/// Renderers phase: group the sector's cells by cliff height for
	/// layered drawing and give each cell its tile selection and draw
	/// position. Produces nothing when terrain rendering is disabled
	fn build_renderers(&mut self, key: SectorKey) {
		if !self.config.render_terrain {
			return;
		}
		let cell_keys = self.sector_cell_keys(key);
		let mut groups: std::collections::BTreeMap<u8, Vec<CellKey>> =
			std::collections::BTreeMap::new();
		let mut renders = Vec::with_capacity(cell_keys.len());
		for cell_key in cell_keys.iter() {
			if let Some(cell) = self.cells.get(cell_key) {
				groups
					.entry(cell.get_cliff_height())
					.or_default()
					.push(*cell_key);
				let tile = if self.config.use_tiles {
					select_tile(cell)
				} else {
					0
				};
				let (x, y) = cell.get_world_coords();
				let lift = match self.config.perspective {
					Perspective::TopDown => 0.0,
					Perspective::Oblique => cell.get_cliff_height() as f32 * OBLIQUE_LIFT,
				};
				let draw_position = Vec2::new(x as f32, y as f32 + lift);
				renders.push((*cell_key, CellRender::new(tile, draw_position)));
			}
		}
		for (cell_key, render) in renders {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.set_render(render);
			}
		}
		let renderers = groups
			.into_iter()
			.map(|(height, cells)| CliffRenderer::new(height, cells))
			.collect();
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.set_renderers(renderers);
		}
	}
	/// Inverse of [Self::build_renderers]: destroy the draw groupings and
	/// per-cell render data
	fn drop_renderers(&mut self, key: SectorKey) {
		for cell_key in self.sector_cell_keys(key) {
			if let Some(cell) = self.cells.get_mut(&cell_key) {
				cell.clear_render();
			}
		}
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.clear_renderers();
		}
	}
	/// Rails phase: build the collision segments blocking movement over
	/// cardinal cliff edges, leaving an opening wherever a lower neighbour
	/// ramps up into the cell, and flank every ramp so traversal is
	/// funnelled along its length
	fn build_rails(&mut self, key: SectorKey) {
		let cell_keys = self.sector_cell_keys(key);
		let mut rails = Vec::new();
		for cell_key in cell_keys.iter() {
			let Some(cell) = self.cells.get(cell_key) else {
				continue;
			};
			let (x, y) = cell.get_world_coords();
			let centre = Vec2::new(x as f32, y as f32);
			if let Some(edges) = cell.get_cliff_edges() {
				for edge in edges.iter().filter(|edge| edge.is_cardinal()) {
					let neighbour_key = cell.key().neighbour(*edge);
					let is_ramp_opening = self
						.cells
						.get(&neighbour_key)
						.is_some_and(|neighbour| neighbour.get_ramp() == Some(edge.inverse()));
					if is_ramp_opening {
						continue;
					}
					rails.push(edge_rail(centre, *edge, RailKind::CliffEdge));
				}
			}
			if cell.get_ramp().is_some() {
				rails.push(edge_rail(centre, Ordinal::North, RailKind::Ramp));
				rails.push(edge_rail(centre, Ordinal::South, RailKind::Ramp));
			}
		}
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.set_rails(rails);
		}
	}
	/// Inverse of [Self::build_rails]: destroy the collision segments
	fn drop_rails(&mut self, key: SectorKey) {
		if let Some(sector) = self.sectors.get_mut(&key) {
			sector.clear_rails();
		}
	}
	/// Clone a sector's cell key list so phase steps can walk it while
	/// mutating the cell registry
	fn sector_cell_keys(&self, key: SectorKey) -> Vec<CellKey> {
		self.sectors
			.get(&key)
			.map(|sector| sector.get_cells().clone())
			.unwrap_or_default()
	}
	/// Exact cell lookup by world position. Returns [None] (with an error
	/// log) if no cell is loaded there - the caller is responsible for the
	/// containing sector being sufficiently advanced for the data it wants:
	/// at least cliffs for edge flags, at least ramps for ramp data
	pub fn get_cell(&self, position: Vec2) -> Option<&Cell> {
		let cell = self.cells.get(&CellKey::from_world(position));
		if cell.is_none() {
			error!(
				"No cell loaded at ({}, {}), is the containing sector advanced far enough?",
				position.x, position.y
			);
		}
		cell
	}
	/// Fractional height within the cell at a world position, `0.0..=1.0`
	/// rising along the ramp if the cell is a ramp, otherwise `0.0`
	pub fn get_ramp_height(&self, position: Vec2) -> f32 {
		let Some(cell) = self.cells.get(&CellKey::from_world(position)) else {
			return 0.0;
		};
		let (cell_x, _) = cell.get_world_coords();
		let fraction = (position.x - (cell_x as f32 - 0.5)).clamp(0.0, 1.0);
		match cell.get_ramp() {
			Some(Ordinal::East) => fraction,
			Some(Ordinal::West) => 1.0 - fraction,
			_ => 0.0,
		}
	}
}

/// The collision segment along one cardinal side of the unit cell centred
/// at `centre`
fn edge_rail(centre: Vec2, side: Ordinal, kind: RailKind) -> Rail {
	let (start, end) = match side {
		Ordinal::North => (
			Vec2::new(centre.x - 0.5, centre.y + 0.5),
			Vec2::new(centre.x + 0.5, centre.y + 0.5),
		),
		Ordinal::South => (
			Vec2::new(centre.x - 0.5, centre.y - 0.5),
			Vec2::new(centre.x + 0.5, centre.y - 0.5),
		),
		Ordinal::East => (
			Vec2::new(centre.x + 0.5, centre.y - 0.5),
			Vec2::new(centre.x + 0.5, centre.y + 0.5),
		),
		_ => (
			Vec2::new(centre.x - 0.5, centre.y - 0.5),
			Vec2::new(centre.x - 0.5, centre.y + 0.5),
		),
	};
	Rail::new(start, end, kind)
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// A small world of 5x5-cell sectors used across these tests
	fn small_config() -> WorldConfig {
		WorldConfig {
			sector_extent: 2,
			sector_render_extent: 1,
			sector_pathing_extent: 1,
			seed: 5486,
			..Default::default()
		}
	}
	#[test]
	#[should_panic]
	fn unsorted_boundaries_rejected() {
		let config = WorldConfig {
			cliff_boundaries: vec![0.5, 0.3, 0.8],
			..Default::default()
		};
		config.assert_valid();
	}
	#[test]
	#[should_panic]
	fn zero_extent_rejected() {
		let config = WorldConfig {
			sector_extent: 0,
			..Default::default()
		};
		config.assert_valid();
	}
	#[test]
	#[should_panic]
	fn zero_octaves_rejected() {
		let config = WorldConfig {
			noise_octaves: 0,
			..Default::default()
		};
		config.assert_valid();
	}
	#[test]
	fn sector_key_from_position() {
		let world = TerrainWorld::new(small_config());
		// extent 2 means sector (0, 0) spans cells -2..=2 on both axes
		assert_eq!(
			SectorKey::from_coords(0, 0),
			world.sector_key_for_position(Vec2::new(2.2, -1.9))
		);
		assert_eq!(
			SectorKey::from_coords(1, 0),
			world.sector_key_for_position(Vec2::new(2.6, 0.0))
		);
		assert_eq!(
			SectorKey::from_coords(-1, -1),
			world.sector_key_for_position(Vec2::new(-3.0, -4.0))
		);
	}
	#[test]
	fn sector_min_corner_matches_key() {
		let world = TerrainWorld::new(small_config());
		assert_eq!((-2, -2), world.sector_min_corner(SectorKey::from_coords(0, 0)));
		assert_eq!((3, -7), world.sector_min_corner(SectorKey::from_coords(1, -1)));
	}
	#[test]
	fn advance_builds_full_sector() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		let sector = world.get_sectors().get(&origin).unwrap();
		assert_eq!(SectorPhase::Rails, sector.get_phase());
		assert_eq!(25, sector.get_cells().len());
		for cell_key in sector.get_cells() {
			let cell = world.get_cells().get(cell_key).unwrap();
			assert!(cell.get_cliff_height() <= 5);
			assert!(cell.get_cliff_edges().is_some());
		}
	}
	#[test]
	fn advance_pulls_neighbour_dependencies() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		// stepping into renderers demanded the 8 neighbours at ramps
		for neighbour in origin.neighbours() {
			let sector = world.get_sectors().get(&neighbour).unwrap();
			assert!(sector.get_phase() >= SectorPhase::Ramps);
			assert!(sector.get_min_phase() >= SectorPhase::Ramps);
		}
	}
	#[test]
	fn advance_is_idempotent() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		let sectors_before = world.get_sectors().len();
		let cells_before = world.get_cells().len();
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		assert_eq!(sectors_before, world.get_sectors().len());
		assert_eq!(cells_before, world.get_cells().len());
	}
	#[test]
	fn degrade_to_bare_destroys_cells() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		let cell_keys = world.sector_cell_keys(origin);
		assert_eq!(25, cell_keys.len());
		world.degrade_sector_to(origin, SectorPhase::Bare);
		assert!(!world.get_sectors().contains_key(&origin));
		for cell_key in cell_keys {
			assert!(!world.get_cells().contains_key(&cell_key));
		}
	}
	#[test]
	fn degrade_clears_stage_data_without_dropping_cells() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		world.degrade_sector_to(origin, SectorPhase::Noise);
		let sector = world.get_sectors().get(&origin).unwrap();
		assert_eq!(SectorPhase::Noise, sector.get_phase());
		assert!(sector.get_renderers().is_empty());
		assert!(sector.get_rails().is_empty());
		for cell_key in sector.get_cells() {
			let cell = world.get_cells().get(cell_key).unwrap();
			assert!(cell.get_cliff_edges().is_none());
			assert!(cell.get_ramp().is_none());
			assert!(cell.get_render().is_none());
		}
	}
	#[test]
	fn regeneration_is_deterministic() {
		let mut world = TerrainWorld::new(small_config());
		let origin = SectorKey::from_coords(0, 0);
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		let first: Vec<(CellKey, f32, u8)> = world
			.sector_cell_keys(origin)
			.iter()
			.map(|k| {
				let cell = &world.get_cells()[k];
				(*k, cell.get_noise(), cell.get_cliff_height())
			})
			.collect();
		// tear the whole world down and rebuild from scratch
		let keys: Vec<SectorKey> = world.get_sectors().keys().copied().collect();
		for key in keys {
			world.degrade_sector_to(key, SectorPhase::Bare);
		}
		assert!(world.get_cells().is_empty());
		world.get_or_create_sector(origin);
		let mut visited = HashMap::new();
		world.advance_sector_to(origin, SectorPhase::MAX, &mut visited);
		for (key, noise, height) in first {
			let cell = &world.get_cells()[&key];
			assert_eq!(noise, cell.get_noise());
			assert_eq!(height, cell.get_cliff_height());
		}
	}
	#[test]
	fn update_throttles_on_anchor_sector() {
		let mut world = TerrainWorld::new(small_config());
		assert!(world.update(Vec2::ZERO));
		// same sector, even though the exact position moved
		assert!(!world.update(Vec2::new(1.0, -1.0)));
		// crossing a sector boundary works again
		assert!(world.update(Vec2::new(40.0, 0.0)));
	}
	#[test]
	fn update_converges_and_unloads() {
		let mut world = TerrainWorld::new(small_config());
		world.update(Vec2::ZERO);
		let origin = SectorKey::from_coords(0, 0);
		assert_eq!(
			SectorPhase::Rails,
			world.get_sectors().get(&origin).unwrap().get_phase()
		);
		// no sector is ever left mid-transition after a pass
		for sector in world.get_sectors().values() {
			assert!(sector.get_phase() >= sector.get_min_phase());
		}
		// move far away, the origin sector must be torn down entirely
		world.update(Vec2::new(500.0, 500.0));
		assert!(!world.get_sectors().contains_key(&origin));
	}
	#[test]
	fn reconfigure_rebuilds_from_anchor() {
		let mut world = TerrainWorld::new(small_config());
		world.update(Vec2::ZERO);
		let mut config = small_config();
		config.seed = 99;
		assert!(world.reconfigure(config));
		let origin = SectorKey::from_coords(0, 0);
		assert_eq!(
			SectorPhase::Rails,
			world.get_sectors().get(&origin).unwrap().get_phase()
		);
	}
	#[test]
	fn perspective_switch_lifts_draw_positions() {
		let mut world = TerrainWorld::new(small_config());
		world.update(Vec2::ZERO);
		let flat = world
			.get_cell(Vec2::ZERO)
			.and_then(|cell| cell.get_render().map(|render| render.get_draw_position()))
			.unwrap();
		assert!(world.set_perspective(Perspective::Oblique));
		let cell = world.get_cell(Vec2::ZERO).unwrap();
		let lifted = cell.get_render().unwrap().get_draw_position();
		let expected = flat.y + cell.get_cliff_height() as f32 * OBLIQUE_LIFT;
		assert_eq!(expected, lifted.y);
		// unchanged perspective is a no-op
		assert!(!world.set_perspective(Perspective::Oblique));
	}
	#[test]
	fn ramp_height_is_zero_off_ramps() {
		let mut world = TerrainWorld::new(small_config());
		world.update(Vec2::ZERO);
		// water or flat ground at the origin either way - no ramp was
		// planted there by this seed
		let cell = world.get_cell(Vec2::ZERO).unwrap();
		if cell.get_ramp().is_none() {
			assert_eq!(0.0, world.get_ramp_height(Vec2::ZERO));
		}
	}
	#[test]
	fn ramp_height_rises_along_ramp() {
		let mut world = TerrainWorld::new(small_config());
		world.update(Vec2::ZERO);
		// find any ramp cell among the loaded cells and probe both ends
		let ramp_cell = world
			.get_cells()
			.values()
			.find(|cell| cell.get_ramp().is_some());
		if let Some(cell) = ramp_cell {
			let (x, y) = cell.get_world_coords();
			let west = world.get_ramp_height(Vec2::new(x as f32 - 0.45, y as f32));
			let east = world.get_ramp_height(Vec2::new(x as f32 + 0.45, y as f32));
			match cell.get_ramp() {
				Some(Ordinal::East) => assert!(east > west),
				Some(Ordinal::West) => assert!(west > east),
				_ => {}
			}
		}
	}
}
