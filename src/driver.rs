//! Dataset driver.
//!
//! Walks every configured dataset in name order, every stimulus in its
//! table, and every ratio variant of that stimulus. A job whose output
//! directory already exists is skipped before any engine call, which makes
//! an interrupted run safe to restart.

use crate::config::RunConfig;
use crate::engine::HostEngine;
use crate::error::{ConfigError, DriverError};
use crate::geometry::{instance_blocks, BlockInstance};
use crate::materials::MaterialStrategy;
use crate::scene::setup_scene;
use crate::seed::Seed;
use crate::table::{StimulusSpec, StimulusTable};
use crate::textures::TextureSet;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Rendered(PathBuf),
    Skipped(PathBuf),
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rendered: usize,
    pub skipped: usize,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: RunSummary) {
        self.rendered += other.rendered;
        self.skipped += other.skipped;
    }
}

impl AddAssign<&JobOutcome> for RunSummary {
    fn add_assign(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Rendered(_) => self.rendered += 1,
            JobOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Runs render jobs against a host engine.
///
/// ```ignore
/// let mut driver = Driver::new(ManifestEngine::new(), RunConfig::default())?;
/// let summary = driver.run()?;
/// println!("{} rendered, {} skipped", summary.rendered, summary.skipped);
/// ```
pub struct Driver<E: HostEngine> {
    engine: E,
    config: RunConfig,
    strategies: BTreeMap<String, MaterialStrategy>,
    textures: TextureSet,
    textures_ready: bool,
}

impl<E: HostEngine> Driver<E> {
    /// Create a driver, validating the dataset-to-strategy mapping.
    pub fn new(engine: E, config: RunConfig) -> Result<Self, DriverError> {
        let strategies = config.strategies()?;
        let textures = TextureSet::in_dir(&config.texture_dir);
        Ok(Self {
            engine,
            config,
            strategies,
            textures,
            textures_ready: false,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Consume the driver, returning the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Strategy configured for a dataset.
    pub fn strategy(&self, dataset: &str) -> Result<MaterialStrategy, ConfigError> {
        self.strategies
            .get(dataset)
            .copied()
            .ok_or_else(|| ConfigError::UnknownDataset(dataset.to_string()))
    }

    /// Render every configured dataset.
    pub fn run(&mut self) -> Result<RunSummary, DriverError> {
        let datasets: Vec<String> = self.strategies.keys().cloned().collect();
        self.run_datasets(&datasets)
    }

    /// Render the named datasets, in sorted order.
    ///
    /// Every name must be configured; this is checked before any job runs.
    pub fn run_datasets(&mut self, datasets: &[String]) -> Result<RunSummary, DriverError> {
        let mut sorted: Vec<&String> = datasets.iter().collect();
        sorted.sort();
        sorted.dedup();
        for dataset in &sorted {
            self.strategy(dataset)?;
        }

        let mut summary = RunSummary::default();
        for dataset in sorted {
            summary += self.run_dataset(dataset)?;
        }
        Ok(summary)
    }

    /// Render one dataset.
    pub fn run_dataset(&mut self, dataset: &str) -> Result<RunSummary, DriverError> {
        let strategy = self.strategy(dataset)?;
        let path = self.config.table_path(dataset);
        let table = StimulusTable::load(&path)?;
        info!(
            "Dataset {} ({}): {} stimuli from {}",
            dataset,
            strategy,
            table.names().len(),
            path.display()
        );

        let mut summary = RunSummary::default();
        for name in table.names() {
            for ratio in table.ratios(name) {
                let outcome = self.run_job(dataset, strategy, &table, name, ratio.as_deref())?;
                summary += &outcome;
            }
        }
        info!(
            "Dataset {}: {} rendered, {} skipped",
            dataset, summary.rendered, summary.skipped
        );
        Ok(summary)
    }

    /// Render one (stimulus, ratio) job unless its output already exists.
    pub fn run_job(
        &mut self,
        dataset: &str,
        strategy: MaterialStrategy,
        table: &StimulusTable,
        name: &str,
        ratio: Option<&str>,
    ) -> Result<JobOutcome, DriverError> {
        let output = self.config.output_dir(dataset, name, ratio);
        if output.exists() {
            info!("Skipping {} (already rendered)", output.display());
            return Ok(JobOutcome::Skipped(output));
        }

        let spec = table.spec(name, ratio)?;
        if strategy.needs_textures() && !self.textures_ready {
            self.textures.ensure_generated().map_err(DriverError::engine)?;
            self.textures_ready = true;
        }

        info!("Rendering {} -> {}", name, output.display());
        render_stimulus(
            &mut self.engine,
            &self.config,
            strategy,
            &spec,
            &self.textures,
            &output,
        )?;
        Ok(JobOutcome::Rendered(output))
    }
}

/// Build, color, simulate and render one stimulus.
///
/// Returns the blocks with their assigned materials.
pub fn render_stimulus<E: HostEngine>(
    engine: &mut E,
    config: &RunConfig,
    strategy: MaterialStrategy,
    spec: &StimulusSpec,
    textures: &TextureSet,
    output: &Path,
) -> Result<Vec<BlockInstance<E::Handle>>, DriverError> {
    setup_scene(engine, &config.scene).map_err(DriverError::engine)?;
    let mut blocks = instance_blocks(engine, spec, &config.blocks, config.physics_source)
        .map_err(DriverError::engine)?;

    let seed = Seed::from_name(&spec.name);
    let mut rng = seed.rng();
    debug!("Stimulus {} seed {}", spec.name, seed);

    let materials = strategy.assign(&mut rng, &blocks, textures)?;
    for (block, material) in blocks.iter_mut().zip(materials) {
        engine
            .set_material(&block.handle, &material)
            .map_err(DriverError::engine)?;
        block.material = Some(material);
    }

    engine
        .bake(config.scene.frame_count())
        .map_err(DriverError::engine)?;
    engine.render(output).map_err(DriverError::engine)?;
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, RecordingEngine};
    use std::fs;

    const TABLE: &str = "name,object,pos_x,pos_y,pos_z,quat_w,quat_x,quat_y,quat_z,scale_x,scale_y,scale_z,mass,friction,restitution\n\
        tower_00,block_1,0,0,1,1,0,0,0,2,2,2,1,0.5,0\n\
        tower_00,block_0,0,0,0,1,0,0,0,2,2,2,1,0.5,0\n\
        tower_01,block_0,0,0,0,1,0,0,0,2,2,2,1,0.5,0\n";

    fn setup(datasets: &[(&str, &str)]) -> (tempfile::TempDir, RunConfig) {
        let dir = tempfile::tempdir().unwrap();
        let stimuli = dir.path().join("stimuli");
        fs::create_dir_all(&stimuli).unwrap();

        let mut config = RunConfig {
            stimuli_dir: stimuli.clone(),
            output_root: dir.path().join("frames"),
            texture_dir: dir.path().join("textures"),
            datasets: BTreeMap::new(),
            ..RunConfig::default()
        };
        for (dataset, strategy) in datasets {
            fs::write(stimuli.join(format!("{dataset}.csv")), TABLE).unwrap();
            config.datasets.insert(dataset.to_string(), strategy.to_string());
        }
        (dir, config)
    }

    #[test]
    fn test_summary_accumulates() {
        let mut summary = RunSummary::default();
        summary += &JobOutcome::Rendered(PathBuf::from("a"));
        summary += &JobOutcome::Skipped(PathBuf::from("b"));
        summary += RunSummary { rendered: 2, skipped: 3 };
        assert_eq!(summary, RunSummary { rendered: 3, skipped: 4 });
    }

    #[test]
    fn test_skip_existing_output_makes_no_engine_calls() {
        let (_dir, config) = setup(&[("willitfall", "uniform_hue")]);
        fs::create_dir_all(config.output_dir("willitfall", "tower_00", None)).unwrap();
        fs::create_dir_all(config.output_dir("willitfall", "tower_01", None)).unwrap();

        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        let summary = driver.run().unwrap();

        assert_eq!(summary, RunSummary { rendered: 0, skipped: 2 });
        assert!(driver.engine().calls().is_empty());
    }

    #[test]
    fn test_renders_each_stimulus_once() {
        let (_dir, config) = setup(&[("willitfall", "uniform_hue")]);
        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        let summary = driver.run().unwrap();
        assert_eq!(summary.rendered, 2);

        let renders: Vec<&EngineCall> = driver
            .engine()
            .calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Render { .. }))
            .collect();
        assert_eq!(renders.len(), 2);
    }

    #[test]
    fn test_datasets_run_in_sorted_order() {
        let (_dir, config) = setup(&[("zeta", "uniform_hue"), ("alpha", "uniform_hue")]);
        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        driver.run().unwrap();

        let outputs: Vec<PathBuf> = driver
            .engine()
            .calls()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Render { output } => Some(output.clone()),
                _ => None,
            })
            .collect();
        assert!(outputs[0].to_string_lossy().contains("alpha"));
        assert!(outputs[3].to_string_lossy().contains("zeta"));
    }

    #[test]
    fn test_unconfigured_dataset_is_fatal() {
        let (_dir, config) = setup(&[("willitfall", "uniform_hue")]);
        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        let err = driver.run_datasets(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, DriverError::Config(ConfigError::UnknownDataset(ref d)) if d == "nope"));
        assert!(driver.engine().calls().is_empty());
    }

    #[test]
    fn test_unknown_strategy_rejected_at_startup() {
        let (_dir, config) = setup(&[("willitfall", "neon")]);
        let err = Driver::new(RecordingEngine::new(), config).err().unwrap();
        assert!(err.to_string().contains("willitfall"));
    }

    #[test]
    fn test_missing_blocktype_aborts_run() {
        let (_dir, config) = setup(&[("colors", "red_blue")]);
        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        assert!(matches!(driver.run(), Err(DriverError::Material(_))));
    }

    #[test]
    fn test_missing_table_aborts_run() {
        let (dir, config) = setup(&[("willitfall", "uniform_hue")]);
        fs::remove_file(dir.path().join("stimuli").join("willitfall.csv")).unwrap();
        let mut driver = Driver::new(RecordingEngine::new(), config).unwrap();
        assert!(matches!(driver.run(), Err(DriverError::Table(_))));
    }
}
