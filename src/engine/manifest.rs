//! Engine backend that writes a scene manifest per job.
//!
//! The manifest is the full list of calls for one job, serialized as JSON
//! into `<output>/scene.json`. If a render command is configured it runs
//! after the manifest is written, with `{manifest}` and `{output}`
//! substituted in its arguments, and must exit successfully.
//!
//! The output directory is the job's completion marker, so everything is
//! written into a sibling `<output>.partial` directory first. It is renamed
//! to `<output>` only once the render command has succeeded, and removed if
//! the command fails. `{output}` names that staging directory.

use super::{EngineCall, HostEngine, ObjectHandle, RecordingEngine};
use crate::error::EngineError;
use crate::geometry::{Bevel, RigidBody, Transform};
use crate::materials::Material;
use crate::scene::{Camera, Light, PhysicsWorld, Pose, RenderSettings, World};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// File name of the manifest inside each output directory.
pub const MANIFEST_FILE: &str = "scene.json";

/// Location of the manifest for a job's output directory.
pub fn manifest_path(output: &Path) -> PathBuf {
    output.join(MANIFEST_FILE)
}

/// Directory a job is written into before it is complete.
pub fn staging_dir(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    output.with_file_name(name)
}

#[derive(Serialize)]
struct SceneManifest<'a> {
    version: u32,
    output: &'a Path,
    calls: &'a [EngineCall],
}

/// Engine backend producing `scene.json` manifests.
#[derive(Debug, Default)]
pub struct ManifestEngine {
    recorder: RecordingEngine,
    command: Vec<String>,
}

impl ManifestEngine {
    /// Manifest-only backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `command` (program followed by arguments) after each manifest.
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    fn run_command(&self, manifest: &Path, output: &Path) -> Result<(), EngineError> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };
        let substitute = |arg: &String| {
            arg.replace("{manifest}", &manifest.display().to_string())
                .replace("{output}", &output.display().to_string())
        };
        let args: Vec<String> = args.iter().map(substitute).collect();

        info!("Running render command: {} {}", program, args.join(" "));
        let status = Command::new(program).args(&args).status()?;
        if !status.success() {
            return Err(EngineError::RenderCommand {
                command: program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl HostEngine for ManifestEngine {
    type Handle = ObjectHandle;
    type Error = EngineError;

    fn clear_scene(&mut self) -> Result<(), EngineError> {
        // Only the current job belongs in the next manifest
        self.recorder.take_calls();
        self.recorder.clear_scene()
    }

    fn add_box(
        &mut self,
        name: &str,
        transform: &Transform,
        bevel: &Bevel,
    ) -> Result<ObjectHandle, EngineError> {
        self.recorder.add_box(name, transform, bevel)
    }

    fn copy_box(
        &mut self,
        source: &ObjectHandle,
        name: &str,
        transform: &Transform,
    ) -> Result<ObjectHandle, EngineError> {
        self.recorder.copy_box(source, name, transform)
    }

    fn add_cylinder(&mut self, name: &str, transform: &Transform) -> Result<ObjectHandle, EngineError> {
        self.recorder.add_cylinder(name, transform)
    }

    fn set_rigid_body(&mut self, target: &ObjectHandle, body: &RigidBody) -> Result<(), EngineError> {
        self.recorder.set_rigid_body(target, body)
    }

    fn set_material(&mut self, target: &ObjectHandle, material: &Material) -> Result<(), EngineError> {
        self.recorder.set_material(target, material)
    }

    fn add_camera(&mut self, camera: &Camera, pose: &Pose) -> Result<ObjectHandle, EngineError> {
        self.recorder.add_camera(camera, pose)
    }

    fn add_light(&mut self, light: &Light, pose: &Pose) -> Result<ObjectHandle, EngineError> {
        self.recorder.add_light(light, pose)
    }

    fn configure_world(&mut self, world: &World) -> Result<(), EngineError> {
        self.recorder.configure_world(world)
    }

    fn configure_render(
        &mut self,
        render: &RenderSettings,
        physics: &PhysicsWorld,
    ) -> Result<(), EngineError> {
        self.recorder.configure_render(render, physics)
    }

    fn bake(&mut self, frames: u32) -> Result<(), EngineError> {
        debug!("Recording bake of {} frames", frames);
        self.recorder.bake(frames)
    }

    fn render(&mut self, output: &Path) -> Result<(), EngineError> {
        self.recorder.render(output)?;

        let staging = staging_dir(output);
        if staging.exists() {
            // Left over from an interrupted run
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let manifest_path = manifest_path(&staging);
        let manifest = SceneManifest {
            version: 1,
            output,
            calls: self.recorder.calls(),
        };
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
        debug!("Wrote {}", manifest_path.display());

        if let Err(e) = self.run_command(&manifest_path, &staging) {
            warn!("Removing {} after failed render", staging.display());
            fs::remove_dir_all(&staging)?;
            return Err(e);
        }

        fs::rename(&staging, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames").join("stim");

        let mut engine = ManifestEngine::new();
        engine.clear_scene().unwrap();
        engine.add_box("block_0", &Transform::default(), &Bevel::default()).unwrap();
        engine.bake(120).unwrap();
        engine.render(&out).unwrap();

        let text = fs::read_to_string(out.join(MANIFEST_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let ops: Vec<&str> = json["calls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["op"].as_str().unwrap())
            .collect();
        assert_eq!(ops, vec!["clear_scene", "add_box", "bake", "render"]);
    }

    #[test]
    fn test_manifest_holds_only_current_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ManifestEngine::new();

        engine.clear_scene().unwrap();
        engine.add_box("old", &Transform::default(), &Bevel::default()).unwrap();
        engine.render(&dir.path().join("a")).unwrap();

        engine.clear_scene().unwrap();
        engine.render(&dir.path().join("b")).unwrap();

        let text = fs::read_to_string(dir.path().join("b").join(MANIFEST_FILE)).unwrap();
        assert!(!text.contains("\"old\""));
    }

    #[test]
    fn test_staging_dir_is_sibling() {
        assert_eq!(
            staging_dir(Path::new("frames/mass/t/ratio_1")),
            PathBuf::from("frames/mass/t/ratio_1.partial")
        );
    }

    #[test]
    fn test_stale_staging_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stim");
        fs::create_dir_all(staging_dir(&out)).unwrap();
        fs::write(staging_dir(&out).join("0001.png"), b"stale").unwrap();

        let mut engine = ManifestEngine::new();
        engine.clear_scene().unwrap();
        engine.render(&out).unwrap();

        assert!(out.join(MANIFEST_FILE).exists());
        assert!(!out.join("0001.png").exists());
        assert!(!staging_dir(&out).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_render_command_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stim");
        let mut engine = ManifestEngine::new().with_command(vec!["false".to_string()]);
        engine.clear_scene().unwrap();
        let err = engine.render(&out).unwrap_err();
        assert!(matches!(err, EngineError::RenderCommand { .. }));
        assert!(!out.exists());
        assert!(!staging_dir(&out).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_render_command_writes_into_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stim");
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "test -f {manifest} && touch {output}/0001.png".to_string(),
        ];
        let mut engine = ManifestEngine::new().with_command(command);
        engine.clear_scene().unwrap();
        engine.render(&out).unwrap();

        assert!(out.join("0001.png").exists());
        assert!(out.join(MANIFEST_FILE).exists());
        assert!(!staging_dir(&out).exists());
    }
}
