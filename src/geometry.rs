//! Geometry instancing.
//!
//! Turns a [`StimulusSpec`] into blocks in the host scene. The first block
//! (smallest object name) is created as a beveled box; every other block is
//! an independent copy of that shape with its own transform. Each block then
//! gets a rigid body built from its own row.

use crate::engine::HostEngine;
use crate::materials::Material;
use crate::table::{BlockSpec, BlockType, StimulusSpec};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Position, orientation and half-extent scale of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    /// Transform of a table block (scale already halved by the reader).
    pub fn from_block(block: &BlockSpec) -> Self {
        Self {
            position: block.position,
            rotation: block.rotation,
            scale: block.scale,
        }
    }
}

/// Edge bevel applied to the base box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bevel {
    /// Bevel width as a percentage of the edge length.
    pub offset_percent: f64,
    pub segments: u32,
}

impl Default for Bevel {
    fn default() -> Self {
        Self {
            offset_percent: 3.0,
            segments: 15,
        }
    }
}

/// Whether the simulation moves the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigidBodyRole {
    /// Simulated body.
    #[default]
    Active,
    /// Static collider (the floor).
    Passive,
}

/// Collision geometry used by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionShape {
    #[default]
    Box,
    ConvexHull,
}

/// Rigid-body parameters for one object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub role: RigidBodyRole,
    pub mass: f64,
    pub friction: f64,
    pub restitution: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub use_deactivation: bool,
    pub collision_shape: CollisionShape,
}

/// Settings shared by every block of every stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDefaults {
    pub bevel: Bevel,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub use_deactivation: bool,
    pub collision_shape: CollisionShape,
}

impl Default for BlockDefaults {
    fn default() -> Self {
        Self {
            bevel: Bevel::default(),
            linear_damping: 0.1,
            angular_damping: 0.75,
            use_deactivation: true,
            collision_shape: CollisionShape::Box,
        }
    }
}

/// Which row supplies a block's mass, friction and restitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsSource {
    /// Each block uses its own row.
    #[default]
    PerBlock,
    /// Every block uses the last object's row. Reproduces renders made by
    /// the old script, which leaked its loop variable into the physics pass.
    LastRow,
}

/// A block created in the host scene for one job.
#[derive(Debug, Clone)]
pub struct BlockInstance<H> {
    pub name: String,
    pub handle: H,
    pub transform: Transform,
    pub body: RigidBody,
    pub blocktype: Option<BlockType>,
    pub material: Option<Material>,
}

fn body_for(block: &BlockSpec, defaults: &BlockDefaults) -> RigidBody {
    RigidBody {
        role: RigidBodyRole::Active,
        mass: block.mass,
        friction: block.friction,
        restitution: block.restitution,
        linear_damping: defaults.linear_damping,
        angular_damping: defaults.angular_damping,
        use_deactivation: defaults.use_deactivation,
        collision_shape: defaults.collision_shape,
    }
}

/// Create one block per object of `spec`, in object-name order.
///
/// Returns the blocks in the same order. An empty spec creates nothing.
pub fn instance_blocks<E: HostEngine>(
    engine: &mut E,
    spec: &StimulusSpec,
    defaults: &BlockDefaults,
    physics: PhysicsSource,
) -> Result<Vec<BlockInstance<E::Handle>>, E::Error> {
    let mut blocks: Vec<BlockInstance<E::Handle>> = Vec::with_capacity(spec.len());
    let mut base: Option<E::Handle> = None;

    for (name, block) in &spec.blocks {
        let transform = Transform::from_block(block);
        let handle = match &base {
            None => {
                let handle = engine.add_box(name, &transform, &defaults.bevel)?;
                base = Some(handle.clone());
                handle
            }
            Some(source) => engine.copy_box(source, name, &transform)?,
        };
        debug!("Instanced {} at {:?}", name, transform.position);

        blocks.push(BlockInstance {
            name: name.clone(),
            handle,
            transform,
            body: body_for(block, defaults),
            blocktype: block.blocktype,
            material: None,
        });
    }

    if physics == PhysicsSource::LastRow {
        if let Some(last) = spec.blocks.values().next_back() {
            warn!(
                "Stimulus {}: applying last row's physics to every block (legacy mode)",
                spec.name
            );
            let shared = body_for(last, defaults);
            for block in &mut blocks {
                block.body = shared;
            }
        }
    }

    for block in &blocks {
        engine.set_rigid_body(&block.handle, &block.body)?;
    }

    Ok(blocks)
}
