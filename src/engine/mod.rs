//! Host engine boundary.
//!
//! Physics, rendering, meshes and the material model all live in the host
//! 3D application. This crate only describes what to build and hands the
//! description over through [`HostEngine`]. Every construction call returns
//! an explicit handle; there is no "current scene" or "active object".
//!
//! Two backends ship with the crate:
//!
//! - [`RecordingEngine`] keeps an in-memory log of calls. Used for dry runs
//!   and tests.
//! - [`ManifestEngine`] writes the job as a JSON scene manifest into the
//!   output directory and can hand it to an external render command.

mod manifest;
mod recording;

pub use manifest::{manifest_path, staging_dir, ManifestEngine, MANIFEST_FILE};
pub use recording::RecordingEngine;

use crate::geometry::{Bevel, RigidBody, Transform};
use crate::materials::Material;
use crate::scene::{Camera, Light, PhysicsWorld, Pose, RenderSettings, World};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque reference to an object created by an engine backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub usize);

/// Operations the crate needs from the host application.
pub trait HostEngine {
    /// Handle to an object in the host scene.
    type Handle: Clone + std::fmt::Debug;
    /// Backend failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Remove every object from the scene.
    fn clear_scene(&mut self) -> Result<(), Self::Error>;

    /// Create a beveled box.
    fn add_box(
        &mut self,
        name: &str,
        transform: &Transform,
        bevel: &Bevel,
    ) -> Result<Self::Handle, Self::Error>;

    /// Create an independent copy of an existing box's shape.
    fn copy_box(
        &mut self,
        source: &Self::Handle,
        name: &str,
        transform: &Transform,
    ) -> Result<Self::Handle, Self::Error>;

    /// Create a cylinder.
    fn add_cylinder(&mut self, name: &str, transform: &Transform)
        -> Result<Self::Handle, Self::Error>;

    /// Give an object a rigid-body role.
    fn set_rigid_body(&mut self, target: &Self::Handle, body: &RigidBody)
        -> Result<(), Self::Error>;

    /// Attach a material to an object.
    fn set_material(&mut self, target: &Self::Handle, material: &Material)
        -> Result<(), Self::Error>;

    /// Add a camera at `pose` and make it the scene camera.
    fn add_camera(&mut self, camera: &Camera, pose: &Pose) -> Result<Self::Handle, Self::Error>;

    /// Add a light at `pose`.
    fn add_light(&mut self, light: &Light, pose: &Pose) -> Result<Self::Handle, Self::Error>;

    /// Configure world lighting.
    fn configure_world(&mut self, world: &World) -> Result<(), Self::Error>;

    /// Configure output resolution, frame range and rigid-body world.
    fn configure_render(
        &mut self,
        render: &RenderSettings,
        physics: &PhysicsWorld,
    ) -> Result<(), Self::Error>;

    /// Run the time-stepped simulation for `frames` frames. Blocks.
    fn bake(&mut self, frames: u32) -> Result<(), Self::Error>;

    /// Render every frame into `output`. Blocks.
    fn render(&mut self, output: &Path) -> Result<(), Self::Error>;
}

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCall {
    ClearScene,
    AddBox {
        handle: ObjectHandle,
        name: String,
        transform: Transform,
        bevel: Bevel,
    },
    CopyBox {
        handle: ObjectHandle,
        source: ObjectHandle,
        name: String,
        transform: Transform,
    },
    AddCylinder {
        handle: ObjectHandle,
        name: String,
        transform: Transform,
    },
    SetRigidBody {
        target: ObjectHandle,
        body: RigidBody,
    },
    SetMaterial {
        target: ObjectHandle,
        material: Material,
    },
    AddCamera {
        handle: ObjectHandle,
        camera: Camera,
        pose: Pose,
    },
    AddLight {
        handle: ObjectHandle,
        light: Light,
        pose: Pose,
    },
    ConfigureWorld {
        world: World,
    },
    ConfigureRender {
        render: RenderSettings,
        physics: PhysicsWorld,
    },
    Bake {
        frames: u32,
    },
    Render {
        output: PathBuf,
    },
}

impl EngineCall {
    /// Short operation name, for logs.
    pub fn op(&self) -> &'static str {
        match self {
            EngineCall::ClearScene => "clear_scene",
            EngineCall::AddBox { .. } => "add_box",
            EngineCall::CopyBox { .. } => "copy_box",
            EngineCall::AddCylinder { .. } => "add_cylinder",
            EngineCall::SetRigidBody { .. } => "set_rigid_body",
            EngineCall::SetMaterial { .. } => "set_material",
            EngineCall::AddCamera { .. } => "add_camera",
            EngineCall::AddLight { .. } => "add_light",
            EngineCall::ConfigureWorld { .. } => "configure_world",
            EngineCall::ConfigureRender { .. } => "configure_render",
            EngineCall::Bake { .. } => "bake",
            EngineCall::Render { .. } => "render",
        }
    }
}
