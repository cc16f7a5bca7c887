//! Bridges the terrain into a walkability grid for pathfinding.
//!
//! The grid covers the square of sectors within the pathing extent of the
//! anchor sector at [PATH_GRID_SCALE] grid cells per world cell, so paths can
//! route around obstacles at sub-cell granularity. It is rebuilt from scratch
//! whenever the world converges on a new anchor sector - obstacle data is
//! small and a full rebuild is cheaper to reason about than patching.
//!

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::prelude::*;
use bevy::prelude::*;

/// Movement cost between cardinally adjacent grid cells
const COST_CARDINAL: u32 = 10;
/// Movement cost between diagonally adjacent grid cells, `~10 * sqrt(2)`
const COST_DIAGONAL: u32 = 14;

/// A fixed-size walkability grid derived from the loaded sectors around the
/// anchor, queried with an A* search
#[derive(Component, Default)]
pub struct PathGrid {
	/// World cell coordinate of the grid's bottom-left (minimum) world cell
	origin_cell: (i32, i32),
	/// World cells along one side of the covered square
	side_world_cells: usize,
	/// Blocked flags in row-major order from the bottom-left, at
	/// [PATH_GRID_SCALE] grid cells per world cell
	blocked: Vec<bool>,
}

impl PathGrid {
	/// Grid cells along one side
	fn grid_side(&self) -> usize {
		self.side_world_cells * PATH_GRID_SCALE as usize
	}
	/// Get the world cell coordinate of the grid's minimum corner
	pub fn get_origin_cell(&self) -> (i32, i32) {
		self.origin_cell
	}
	/// Get the number of world cells along one side of the covered square
	pub fn get_side_world_cells(&self) -> usize {
		self.side_world_cells
	}
	/// Discard and rebuild the grid from the sectors within the pathing
	/// extent of the world's anchor sector. Sectors not yet carrying cells
	/// contribute no obstacles - their area reads as open until they load
	pub fn rebuild(&mut self, world: &TerrainWorld) {
		let Some(anchor_sector) = world.get_anchor_sector() else {
			self.side_world_cells = 0;
			self.blocked.clear();
			return;
		};
		let pathing_extent = world.get_config().sector_pathing_extent as i32;
		let side = world.get_config().sector_side();
		let span = 2 * pathing_extent + 1;
		let (ax, ay) = anchor_sector.to_coords();
		let origin_sector = SectorKey::from_coords(ax - pathing_extent, ay - pathing_extent);
		self.origin_cell = world.sector_min_corner(origin_sector);
		self.side_world_cells = (span * side) as usize;
		let grid_side = self.grid_side();
		self.blocked = vec![false; grid_side * grid_side];
		for sector_y in (ay - pathing_extent)..=(ay + pathing_extent) {
			for sector_x in (ax - pathing_extent)..=(ax + pathing_extent) {
				let key = SectorKey::from_coords(sector_x, sector_y);
				let Some(sector) = world.get_sectors().get(&key) else {
					continue;
				};
				let (min_x, min_y) = world.sector_min_corner(key);
				for (column, row) in sector.get_path_obstacles() {
					let x = min_x + *column as i32;
					let y = min_y + (side - 1) - *row as i32;
					self.block_world_cell(x, y);
				}
			}
		}
	}
	/// Mark the block of grid cells covering one world cell as impassable
	fn block_world_cell(&mut self, x: i32, y: i32) {
		let grid_side = self.grid_side();
		let base_x = (x - self.origin_cell.0) * PATH_GRID_SCALE;
		let base_y = (y - self.origin_cell.1) * PATH_GRID_SCALE;
		for dy in 0..PATH_GRID_SCALE {
			for dx in 0..PATH_GRID_SCALE {
				let gx = base_x + dx;
				let gy = base_y + dy;
				if gx < 0 || gy < 0 || gx as usize >= grid_side || gy as usize >= grid_side {
					continue;
				}
				self.blocked[gy as usize * grid_side + gx as usize] = true;
			}
		}
	}
	/// The grid cell containing a world position, [None] outside the
	/// covered square
	pub fn world_to_grid(&self, position: Vec2) -> Option<(usize, usize)> {
		let grid_side = self.grid_side();
		let origin_x = self.origin_cell.0 as f32 - 0.5;
		let origin_y = self.origin_cell.1 as f32 - 0.5;
		let gx = ((position.x - origin_x) * PATH_GRID_SCALE as f32).floor() as i32;
		let gy = ((position.y - origin_y) * PATH_GRID_SCALE as f32).floor() as i32;
		if gx < 0 || gy < 0 || gx as usize >= grid_side || gy as usize >= grid_side {
			return None;
		}
		Some((gx as usize, gy as usize))
	}
	/// The world position of a grid cell's centre
	pub fn grid_to_world(&self, grid_cell: (usize, usize)) -> Vec2 {
		let origin_x = self.origin_cell.0 as f32 - 0.5;
		let origin_y = self.origin_cell.1 as f32 - 0.5;
		Vec2::new(
			origin_x + (grid_cell.0 as f32 + 0.5) / PATH_GRID_SCALE as f32,
			origin_y + (grid_cell.1 as f32 + 0.5) / PATH_GRID_SCALE as f32,
		)
	}
	/// Whether a grid cell is impassable
	fn is_blocked(&self, grid_cell: (usize, usize)) -> bool {
		self.blocked[grid_cell.1 * self.grid_side() + grid_cell.0]
	}
	/// Find a path between two world positions as a series of grid cell
	/// centres from `from` to `to`. Returns [None] when either endpoint is
	/// outside the covered square, the destination is impassable, or the
	/// search exhausts without reaching the destination - unreachable is an
	/// answer, not an error
	pub fn get_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
		let start = self.world_to_grid(from)?;
		let goal = self.world_to_grid(to)?;
		if self.is_blocked(goal) {
			trace!("Path destination ({}, {}) is impassable", to.x, to.y);
			return None;
		}
		if start == goal {
			return Some(vec![self.grid_to_world(goal)]);
		}
		let mut open = BinaryHeap::new();
		let mut best_cost: HashMap<(usize, usize), u32> = HashMap::new();
		let mut came_from: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
		best_cost.insert(start, 0);
		open.push(Reverse((heuristic(start, goal), start)));
		while let Some(Reverse((_, current))) = open.pop() {
			if current == goal {
				let mut path = vec![self.grid_to_world(goal)];
				let mut step = goal;
				while let Some(previous) = came_from.get(&step) {
					step = *previous;
					path.push(self.grid_to_world(step));
				}
				path.reverse();
				return Some(path);
			}
			let current_cost = best_cost[&current];
			for (neighbour, step_cost) in self.neighbours(current) {
				let tentative = current_cost + step_cost;
				if best_cost
					.get(&neighbour)
					.is_none_or(|&known| tentative < known)
				{
					best_cost.insert(neighbour, tentative);
					came_from.insert(neighbour, current);
					open.push(Reverse((tentative + heuristic(neighbour, goal), neighbour)));
				}
			}
		}
		trace!(
			"Path search from ({}, {}) to ({}, {}) exhausted without reaching the destination",
			from.x,
			from.y,
			to.x,
			to.y
		);
		None
	}
	/// The passable neighbours of a grid cell with their step costs.
	/// Diagonal steps are only offered when both adjacent cardinal cells
	/// are passable, preventing paths cutting corners through obstacles
	fn neighbours(&self, grid_cell: (usize, usize)) -> Vec<((usize, usize), u32)> {
		let grid_side = self.grid_side() as i32;
		let (x, y) = (grid_cell.0 as i32, grid_cell.1 as i32);
		let open = |cx: i32, cy: i32| {
			cx >= 0
				&& cy >= 0 && cx < grid_side
				&& cy < grid_side
				&& !self.is_blocked((cx as usize, cy as usize))
		};
		let mut neighbours = Vec::with_capacity(8);
		for ordinal in Ordinal::ALL {
			let (dx, dy) = ordinal.offset();
			let (nx, ny) = (x + dx, y + dy);
			if !open(nx, ny) {
				continue;
			}
			if ordinal.is_cardinal() {
				neighbours.push(((nx as usize, ny as usize), COST_CARDINAL));
			} else if open(x + dx, y) && open(x, y + dy) {
				neighbours.push(((nx as usize, ny as usize), COST_DIAGONAL));
			}
		}
		neighbours
	}
}

/// Octile distance between two grid cells in movement-cost units, admissible
/// for the 8-way step costs
fn heuristic(from: (usize, usize), to: (usize, usize)) -> u32 {
	let dx = (from.0 as i32 - to.0 as i32).unsigned_abs();
	let dy = (from.1 as i32 - to.1 as i32).unsigned_abs();
	let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
	COST_CARDINAL * (long - short) + COST_DIAGONAL * short
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// A small world where every cell quantizes above water, so the whole
	/// grid is open
	fn open_world() -> TerrainWorld {
		let config = WorldConfig {
			sector_extent: 2,
			sector_render_extent: 1,
			sector_pathing_extent: 1,
			seed: 5486,
			cliff_boundaries: vec![0.0],
			..Default::default()
		};
		TerrainWorld::new(config)
	}
	/// A small world where every cell quantizes to water, so the whole grid
	/// is blocked
	fn flooded_world() -> TerrainWorld {
		let config = WorldConfig {
			sector_extent: 2,
			sector_render_extent: 1,
			sector_pathing_extent: 1,
			seed: 5486,
			cliff_boundaries: vec![1.0],
			..Default::default()
		};
		TerrainWorld::new(config)
	}
	#[test]
	fn rebuild_covers_pathing_extent() {
		let mut world = open_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		// 3 sectors of 5 cells per axis around the anchor sector
		assert_eq!(15, grid.get_side_world_cells());
		assert_eq!((-7, -7), grid.get_origin_cell());
		assert_eq!(45 * 45, grid.blocked.len());
	}
	#[test]
	fn rebuild_without_anchor_is_empty() {
		let world = open_world();
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		assert_eq!(0, grid.get_side_world_cells());
		assert!(grid.world_to_grid(Vec2::ZERO).is_none());
	}
	#[test]
	fn coordinate_round_trip() {
		let mut world = open_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		let position = Vec2::new(1.3, -2.7);
		let grid_cell = grid.world_to_grid(position).unwrap();
		let centre = grid_to_world_distance(&grid, grid_cell, position);
		// the centre of the containing grid cell is within a sixth of a
		// world cell on each axis
		assert!(centre <= (1.0 / 6.0) * std::f32::consts::SQRT_2 + f32::EPSILON);
	}
	/// Distance between a grid cell's centre and a position
	fn grid_to_world_distance(grid: &PathGrid, grid_cell: (usize, usize), position: Vec2) -> f32 {
		grid.grid_to_world(grid_cell).distance(position)
	}
	#[test]
	fn out_of_bounds_has_no_path() {
		let mut world = open_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		// far outside the 15x15 world cell coverage
		assert!(grid.get_path(Vec2::ZERO, Vec2::new(100.0, 0.0)).is_none());
		assert!(grid.get_path(Vec2::new(-100.0, 0.0), Vec2::ZERO).is_none());
	}
	#[test]
	fn open_ground_paths_connect() {
		let mut world = open_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		let from = Vec2::new(-5.0, -5.0);
		let to = Vec2::new(5.0, 5.0);
		let path = grid.get_path(from, to).unwrap();
		assert!(path.len() >= 2);
		// endpoints resolve to the grid cells containing the request
		assert!(path.first().unwrap().distance(from) < 1.0);
		assert!(path.last().unwrap().distance(to) < 1.0);
		// consecutive points are adjacent grid cells
		for pair in path.windows(2) {
			assert!(pair[0].distance(pair[1]) < 1.0);
		}
	}
	#[test]
	fn impassable_destination_has_no_path() {
		let mut world = flooded_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		assert!(grid.get_path(Vec2::ZERO, Vec2::new(3.0, 3.0)).is_none());
	}
	#[test]
	fn trivial_path_is_single_point() {
		let mut world = open_world();
		world.update(Vec2::ZERO);
		let mut grid = PathGrid::default();
		grid.rebuild(&world);
		let path = grid.get_path(Vec2::ZERO, Vec2::new(0.05, 0.05)).unwrap();
		assert_eq!(1, path.len());
	}
	#[test]
	fn heuristic_is_octile() {
		assert_eq!(0, heuristic((3, 3), (3, 3)));
		assert_eq!(COST_CARDINAL * 4, heuristic((0, 0), (4, 0)));
		assert_eq!(COST_DIAGONAL * 4, heuristic((0, 0), (4, 4)));
		assert_eq!(
			COST_DIAGONAL * 2 + COST_CARDINAL * 3,
			heuristic((0, 0), (5, 2))
		);
	}
}
