//! An infinite terrain is streamed as a grid of Sectors generated on demand
//! around an anchor (typically the player).
//!
//! Each sector is a fixed-size square of unit Cells and progresses through a
//! pipeline of phases, each derived deterministically from a world seed:
//!
//! * Bare - referenced but carrying no data
//! * Noise - cells sampled from seeded multi-octave noise and quantized into
//!   discrete cliff heights
//! * Cliffs - cells flagged with the directions their neighbours sit lower
//! * Ramps - walkable east/west transitions detected between cliff levels
//! * Renderers - per-cliff-height draw groupings and autotile selections
//! * Rails - collision segments along cliff edges and ramp flanks
//!
//! ```text
//!  _____________________________
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! ```
//!
//! Phases near a sector boundary read cells of the neighbouring sectors, so
//! advancing a sector transitively pulls its 8 neighbours to the prerequisite
//! phase first. Moving away degrades sectors back down step by step until a
//! bare sector is destroyed, keeping memory proportional to the loaded area.
//!
//! A walkability grid is rebuilt over the sectors nearest the anchor whenever
//! the world converges on a new anchor sector, answering path queries at
//! sub-cell granularity.
//!

pub mod cells;
pub mod noise;
pub mod pathing;
pub mod sectors;
pub mod utilities;
pub mod world;
