//! Seeded multi-octave noise sampling which drives all terrain generation.
//!
//! A [NoiseField] sums a number of Perlin octaves, each at a growing
//! frequency (`lacunarity`) and shrinking amplitude (`persistence`), with a
//! per-octave jitter offset derived from the seed so octaves don't sample the
//! same underlying lattice. The raw sum is clamped to a fraction of its
//! theoretical amplitude before being rescaled to `0.0..=1.0` - extreme sums
//! are statistically rare, so discarding them stops the usable dynamic range
//! being dominated by values that are almost never produced.
//!
//! Sampling is fully deterministic: the same seed, parameters and coordinate
//! always produce the same value, which is what makes a world reproducible
//! from its config alone.
//!

use noise::{NoiseFn, Perlin};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Span of the per-octave jitter offsets derived from the seed
const JITTER_RANGE: f32 = 100_000.0;

/// A seeded fractal noise sampler producing values in `0.0..=1.0`
pub struct NoiseField {
	/// The underlying gradient noise function
	perlin: Perlin,
	/// Per-octave jitter offsets, derived once from the seed so repeated
	/// sampling passes stay deterministic
	octave_offsets: Vec<(f32, f32)>,
	/// Coordinate divisor - larger values stretch features out
	scale: f32,
	/// Amplitude multiplier applied per octave
	persistence: f32,
	/// Frequency multiplier applied per octave
	lacunarity: f32,
	/// The clamped amplitude bound, `max_amplitude * (1 - clamp_fraction)`
	limit: f32,
}

impl NoiseField {
	/// Create a sampler for the given seed and fractal parameters. The
	/// caller (world config validation) guarantees `octaves >= 1`,
	/// `scale > 0` and `clamp_fraction` in `0.0..1.0`
	pub fn new(
		seed: u64,
		scale: f32,
		octaves: u32,
		persistence: f32,
		lacunarity: f32,
		offset_x: f32,
		offset_y: f32,
		clamp_fraction: f32,
	) -> Self {
		let mut rng = StdRng::seed_from_u64(seed);
		let mut octave_offsets = Vec::with_capacity(octaves as usize);
		for _ in 0..octaves {
			let jitter_x: f32 = rng.gen_range(-JITTER_RANGE..JITTER_RANGE);
			let jitter_y: f32 = rng.gen_range(-JITTER_RANGE..JITTER_RANGE);
			octave_offsets.push((jitter_x + offset_x, jitter_y + offset_y));
		}
		// theoretical amplitude of the octave sum, geometric series in the
		// persistence (or just the octave count when persistence is 1)
		let max_amplitude = if persistence == 1.0 {
			octaves as f32
		} else {
			(1.0 - persistence.powi(octaves as i32)) / (1.0 - persistence)
		};
		NoiseField {
			perlin: Perlin::new(seed as u32),
			octave_offsets,
			scale,
			persistence,
			lacunarity,
			limit: max_amplitude * (1.0 - clamp_fraction),
		}
	}
	/// Sample the field at a world coordinate, producing a value in
	/// `0.0..=1.0`
	pub fn sample(&self, x: f32, y: f32) -> f32 {
		let mut amplitude = 1.0;
		let mut frequency = 1.0;
		let mut total = 0.0;
		for (jitter_x, jitter_y) in self.octave_offsets.iter() {
			let sample_x = (x + jitter_x) / self.scale * frequency;
			let sample_y = (y + jitter_y) / self.scale * frequency;
			total +=
				self.perlin.get([sample_x as f64, sample_y as f64]) as f32 * amplitude;
			amplitude *= self.persistence;
			frequency *= self.lacunarity;
		}
		let clamped = total.clamp(-self.limit, self.limit);
		(clamped + self.limit) / (2.0 * self.limit)
	}
	/// Sample a square region of `side x side` integer cell coordinates in
	/// one batch, in sector scan order: rows from the top (largest `y`)
	/// downwards, columns from `min_x` eastwards. One batch call per sector
	/// keeps generation a single pass over the jitter offsets
	pub fn sample_region(&self, min_x: i32, min_y: i32, side: usize) -> Vec<f32> {
		let mut samples = Vec::with_capacity(side * side);
		for row in 0..side {
			let y = min_y + (side as i32 - 1) - row as i32;
			for column in 0..side {
				let x = min_x + column as i32;
				samples.push(self.sample(x as f32, y as f32));
			}
		}
		samples
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// A field with typical world-gen parameters
	fn field(seed: u64) -> NoiseField {
		NoiseField::new(seed, 25.0, 4, 0.5, 2.0, 0.0, 0.0, 0.1)
	}
	#[test]
	fn samples_are_normalised() {
		let noise = field(5486);
		for x in -50..50 {
			for y in -50..50 {
				let value = noise.sample(x as f32, y as f32);
				assert!((0.0..=1.0).contains(&value), "sample {} out of range", value);
			}
		}
	}
	#[test]
	fn samples_are_deterministic() {
		let first = field(5486);
		let second = field(5486);
		for x in -10..10 {
			for y in -10..10 {
				assert_eq!(first.sample(x as f32, y as f32), second.sample(x as f32, y as f32));
			}
		}
	}
	#[test]
	fn seeds_diverge() {
		let first = field(1);
		let second = field(2);
		let mut differing = 0;
		for x in 0..20 {
			if first.sample(x as f32, 0.0) != second.sample(x as f32, 0.0) {
				differing += 1;
			}
		}
		assert!(differing > 0);
	}
	#[test]
	fn region_matches_point_samples() {
		let noise = field(99);
		let samples = noise.sample_region(-2, -2, 5);
		assert_eq!(25, samples.len());
		// scan order is rows descending in y, columns ascending in x
		assert_eq!(noise.sample(-2.0, 2.0), samples[0]);
		assert_eq!(noise.sample(2.0, 2.0), samples[4]);
		assert_eq!(noise.sample(-2.0, -2.0), samples[20]);
		assert_eq!(noise.sample(2.0, -2.0), samples[24]);
	}
	#[test]
	fn unit_persistence_amplitude() {
		// persistence of exactly 1 must use the octave count as the
		// amplitude bound rather than a divide-by-zero geometric series
		let noise = NoiseField::new(7, 25.0, 3, 1.0, 2.0, 0.0, 0.0, 0.1);
		let value = noise.sample(12.0, -7.0);
		assert!(value.is_finite());
		assert!((0.0..=1.0).contains(&value));
	}
}
