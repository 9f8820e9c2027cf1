//! # towerstim - tower stimulus generation
//!
//! Builds towers of blocks for physics-perception experiments, colors them
//! reproducibly, and hands each tower to a host 3D engine to simulate and
//! render as a frame sequence.
//!
//! towerstim does not simulate or render anything itself. It reads stimulus
//! tables, decides what the scene should contain, and drives a
//! [`HostEngine`] that does the heavy lifting.
//!
//! ## Quick Start
//!
//! ```ignore
//! use towerstim::prelude::*;
//!
//! fn main() -> Result<(), DriverError> {
//!     let config = RunConfig::default(); // stimuli/willitfall.csv, uniform hues
//!     let mut driver = Driver::new(ManifestEngine::new(), config)?;
//!     let summary = driver.run()?;
//!     println!("{} rendered, {} skipped", summary.rendered, summary.skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Stimulus tables
//!
//! Each dataset is a CSV file with one row per block. Rows are grouped by
//! stimulus name (and ratio variant) into a [`StimulusSpec`] whose blocks are
//! ordered by object name. See [`table`] for the column list.
//!
//! ### Seeds
//!
//! Every stimulus name maps to a fixed 9-digit [`Seed`]. A fresh
//! [`StimulusRng`] is built from it for every job, so colors never depend on
//! which other stimuli were rendered before.
//!
//! ### Material strategies
//!
//! | Strategy | Uses blocktype | Look |
//! |----------|----------------|------|
//! | [`MaterialStrategy::UniformHue`] | no | random saturated hue |
//! | [`MaterialStrategy::RedBlue`] | yes | jittered red or blue |
//! | [`MaterialStrategy::StonePlastic`] | yes | striped or granite texture, jittered tint |
//!
//! ### Resuming
//!
//! A job's output directory is its only completion marker. The [`Driver`]
//! skips any job whose directory exists, so rerunning after an interruption
//! only renders what is missing.

pub mod color;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod materials;
pub mod rng;
pub mod scene;
pub mod seed;
pub mod table;
pub mod textures;

pub use config::RunConfig;
pub use driver::{render_stimulus, Driver, JobOutcome, RunSummary};
pub use engine::{EngineCall, HostEngine, ManifestEngine, ObjectHandle, RecordingEngine};
pub use error::{ConfigError, DriverError, EngineError, MaterialError, TableError};
pub use geometry::{instance_blocks, BlockDefaults, BlockInstance, PhysicsSource, RigidBody, Transform};
pub use materials::{Material, MaterialStrategy};
pub use rng::StimulusRng;
pub use scene::{setup_scene, Pose, SceneConfig};
pub use seed::Seed;
pub use table::{BlockSpec, BlockType, StimulusSpec, StimulusTable};
pub use textures::TextureSet;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use towerstim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::driver::{Driver, JobOutcome, RunSummary};
    pub use crate::engine::{HostEngine, ManifestEngine, RecordingEngine};
    pub use crate::error::DriverError;
    pub use crate::materials::MaterialStrategy;
    pub use crate::rng::StimulusRng;
    pub use crate::seed::Seed;
    pub use crate::table::{StimulusSpec, StimulusTable};
    pub use glam::{DQuat, DVec3};
}
