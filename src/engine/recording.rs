//! In-memory engine backend that records every call.

use super::{EngineCall, HostEngine, ObjectHandle};
use crate::error::EngineError;
use crate::geometry::{Bevel, RigidBody, Transform};
use crate::materials::Material;
use crate::scene::{Camera, Light, PhysicsWorld, Pose, RenderSettings, World};
use std::collections::BTreeMap;
use std::path::Path;

/// Engine backend that builds nothing and remembers everything.
///
/// Handles are validated, so a call against an object that was never
/// created (or was cleared) fails the same way a real host would.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Vec<EngineCall>,
    live: BTreeMap<ObjectHandle, String>,
    next_id: usize,
    scene_only: bool,
    total: usize,
}

impl RecordingEngine {
    /// Create an empty recorder that keeps every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that drops the previous scene's calls on `clear_scene`.
    ///
    /// Memory stays bounded by one job; [`total_calls`](Self::total_calls)
    /// still counts everything.
    pub fn scene_only() -> Self {
        Self {
            scene_only: true,
            ..Self::default()
        }
    }

    /// Number of calls recorded since creation, including dropped ones.
    pub fn total_calls(&self) -> usize {
        self.total
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Calls made since the most recent `clear_scene`.
    pub fn current_scene(&self) -> &[EngineCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, EngineCall::ClearScene))
            .unwrap_or(0);
        &self.calls[start..]
    }

    /// Name of a live object.
    pub fn object_name(&self, handle: ObjectHandle) -> Option<&str> {
        self.live.get(&handle).map(String::as_str)
    }

    /// Drop the call log.
    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    fn push(&mut self, call: EngineCall) {
        self.total += 1;
        self.calls.push(call);
    }

    fn create(&mut self, name: &str) -> ObjectHandle {
        let handle = ObjectHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(handle, name.to_string());
        handle
    }

    fn check(&self, handle: &ObjectHandle) -> Result<(), EngineError> {
        if self.live.contains_key(handle) {
            Ok(())
        } else {
            Err(EngineError::UnknownHandle(handle.0))
        }
    }
}

impl HostEngine for RecordingEngine {
    type Handle = ObjectHandle;
    type Error = EngineError;

    fn clear_scene(&mut self) -> Result<(), EngineError> {
        self.live.clear();
        if self.scene_only {
            self.calls.clear();
        }
        self.push(EngineCall::ClearScene);
        Ok(())
    }

    fn add_box(
        &mut self,
        name: &str,
        transform: &Transform,
        bevel: &Bevel,
    ) -> Result<ObjectHandle, EngineError> {
        let handle = self.create(name);
        self.push(EngineCall::AddBox {
            handle,
            name: name.to_string(),
            transform: *transform,
            bevel: *bevel,
        });
        Ok(handle)
    }

    fn copy_box(
        &mut self,
        source: &ObjectHandle,
        name: &str,
        transform: &Transform,
    ) -> Result<ObjectHandle, EngineError> {
        self.check(source)?;
        let handle = self.create(name);
        self.push(EngineCall::CopyBox {
            handle,
            source: *source,
            name: name.to_string(),
            transform: *transform,
        });
        Ok(handle)
    }

    fn add_cylinder(&mut self, name: &str, transform: &Transform) -> Result<ObjectHandle, EngineError> {
        let handle = self.create(name);
        self.push(EngineCall::AddCylinder {
            handle,
            name: name.to_string(),
            transform: *transform,
        });
        Ok(handle)
    }

    fn set_rigid_body(&mut self, target: &ObjectHandle, body: &RigidBody) -> Result<(), EngineError> {
        self.check(target)?;
        self.push(EngineCall::SetRigidBody {
            target: *target,
            body: *body,
        });
        Ok(())
    }

    fn set_material(&mut self, target: &ObjectHandle, material: &Material) -> Result<(), EngineError> {
        self.check(target)?;
        self.push(EngineCall::SetMaterial {
            target: *target,
            material: material.clone(),
        });
        Ok(())
    }

    fn add_camera(&mut self, camera: &Camera, pose: &Pose) -> Result<ObjectHandle, EngineError> {
        let handle = self.create(&camera.name);
        self.push(EngineCall::AddCamera {
            handle,
            camera: camera.clone(),
            pose: *pose,
        });
        Ok(handle)
    }

    fn add_light(&mut self, light: &Light, pose: &Pose) -> Result<ObjectHandle, EngineError> {
        let handle = self.create(&light.name);
        self.push(EngineCall::AddLight {
            handle,
            light: light.clone(),
            pose: *pose,
        });
        Ok(handle)
    }

    fn configure_world(&mut self, world: &World) -> Result<(), EngineError> {
        self.push(EngineCall::ConfigureWorld { world: *world });
        Ok(())
    }

    fn configure_render(
        &mut self,
        render: &RenderSettings,
        physics: &PhysicsWorld,
    ) -> Result<(), EngineError> {
        self.push(EngineCall::ConfigureRender {
            render: *render,
            physics: *physics,
        });
        Ok(())
    }

    fn bake(&mut self, frames: u32) -> Result<(), EngineError> {
        self.push(EngineCall::Bake { frames });
        Ok(())
    }

    fn render(&mut self, output: &Path) -> Result<(), EngineError> {
        self.push(EngineCall::Render {
            output: output.to_path_buf(),
        });
        Ok(())
    }
}
