//! Run configuration.
//!
//! A run is described by a JSON file: where the stimulus tables live, where
//! frames go, which material strategy each dataset uses, and the stage
//! settings. Every field has a default, so an empty object `{}` is a valid
//! config that renders the `willitfall` dataset with uniform hues.

use crate::error::ConfigError;
use crate::geometry::{BlockDefaults, PhysicsSource};
use crate::materials::MaterialStrategy;
use crate::scene::SceneConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration for a dataset run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding `<dataset>.csv` tables.
    pub stimuli_dir: PathBuf,
    /// Root of the per-job output directories.
    pub output_root: PathBuf,
    /// Where the procedural textures are written.
    pub texture_dir: PathBuf,
    /// Dataset name to material strategy name.
    pub datasets: BTreeMap<String, String>,
    pub physics_source: PhysicsSource,
    pub blocks: BlockDefaults,
    pub scene: SceneConfig,
    /// External command run after each manifest is written. Empty to skip.
    pub render_command: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert("willitfall".to_string(), MaterialStrategy::UniformHue.name().to_string());
        Self {
            stimuli_dir: PathBuf::from("stimuli"),
            output_root: PathBuf::from("render/frames"),
            texture_dir: PathBuf::from("resources/textures"),
            datasets,
            physics_source: PhysicsSource::PerBlock,
            blocks: BlockDefaults::default(),
            scene: SceneConfig::default(),
            render_command: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.strategies()?;
        Ok(config)
    }

    /// Resolve every dataset's strategy, failing on the first unknown name.
    pub fn strategies(&self) -> Result<BTreeMap<String, MaterialStrategy>, ConfigError> {
        self.datasets
            .iter()
            .map(|(dataset, strategy)| {
                MaterialStrategy::for_dataset(dataset, strategy).map(|s| (dataset.clone(), s))
            })
            .collect()
    }

    /// Path of a dataset's stimulus table.
    pub fn table_path(&self, dataset: &str) -> PathBuf {
        self.stimuli_dir.join(format!("{dataset}.csv"))
    }

    /// Output directory for one job.
    ///
    /// `<output_root>/<dataset>/<stimulus>/` or, for a ratio variant,
    /// `<output_root>/<dataset>/<stimulus>/ratio_<ratio>/`.
    pub fn output_dir(&self, dataset: &str, stimulus: &str, ratio: Option<&str>) -> PathBuf {
        let dir = self.output_root.join(dataset).join(stimulus);
        match ratio {
            Some(r) => dir.join(format!("ratio_{r}")),
            None => dir,
        }
    }
}
