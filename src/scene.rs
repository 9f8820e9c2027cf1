//! Scene setup shared by every stimulus.
//!
//! Each job starts from an empty scene and rebuilds the same stage: one
//! camera, three lamps, a dark sky, a textured floor and fixed render and
//! physics-world settings. [`SceneConfig::default`] reproduces the stage
//! used for the published datasets.

use crate::engine::HostEngine;
use crate::geometry::{CollisionShape, RigidBody, RigidBodyRole, Transform};
use crate::materials::{Material, SpecularShader, TextureBlend, TextureCoords, TextureMapping, TextureSlot};
use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Orientation that points an object's -Z axis at `target`, keeping +Y as
/// close to world up (+Z) as possible.
pub fn look_at(from: DVec3, target: DVec3) -> DQuat {
    let forward = (target - from).normalize_or_zero();
    if forward == DVec3::ZERO {
        return DQuat::IDENTITY;
    }
    let z = -forward;
    let up = if z.cross(DVec3::Z).length_squared() < 1e-12 {
        DVec3::Y
    } else {
        DVec3::Z
    };
    let y = (up - z * up.dot(z)).normalize();
    let x = y.cross(z);
    DQuat::from_mat3(&DMat3::from_cols(x, y, z))
}

/// World placement of a camera or lamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub location: DVec3,
    pub rotation: DQuat,
}

/// The scene camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub name: String,
    pub location: DVec3,
    pub target: DVec3,
}

impl Camera {
    /// Orientation looking at the target.
    pub fn rotation(&self) -> DQuat {
        look_at(self.location, self.target)
    }

    pub fn pose(&self) -> Pose {
        Pose {
            location: self.location,
            rotation: self.rotation(),
        }
    }
}

/// Kind of lamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightKind {
    Point,
    Spot { target: DVec3 },
}

/// Where a lamp sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPlacement {
    /// Same position as the camera.
    AtCamera,
    At(DVec3),
}

/// A lamp in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub energy: f64,
    pub placement: LightPlacement,
}

impl Light {
    /// World position, resolving camera-relative placement.
    pub fn location(&self, camera: &Camera) -> DVec3 {
        match self.placement {
            LightPlacement::AtCamera => camera.location,
            LightPlacement::At(p) => p,
        }
    }

    /// Resolved placement. Spot lamps aim at their target; point lamps keep
    /// the identity orientation.
    pub fn pose(&self, camera: &Camera) -> Pose {
        let location = self.location(camera);
        let rotation = match self.kind {
            LightKind::Point => DQuat::IDENTITY,
            LightKind::Spot { target } => look_at(location, target),
        };
        Pose { location, rotation }
    }
}

/// Sky and environment lighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub use_environment_light: bool,
    pub use_sky_blend: bool,
    pub use_sky_real: bool,
    pub horizon_color: DVec3,
    pub zenith_color: DVec3,
    pub ambient_color: DVec3,
}

impl Default for World {
    fn default() -> Self {
        Self {
            use_environment_light: true,
            use_sky_blend: true,
            use_sky_real: false,
            horizon_color: DVec3::new(0.061, 0.08, 0.1),
            zenith_color: DVec3::new(0.01, 0.004, 0.023),
            ambient_color: DVec3::ZERO,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Last frame of the animation (frames start at 1).
    pub frame_end: u32,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_percentage: u32,
    /// PNG compression level, 0-100.
    pub compression: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            frame_end: 120,
            resolution_x: 800,
            resolution_y: 600,
            resolution_percentage: 100,
            compression: 15,
        }
    }
}

/// Rigid-body world settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsWorld {
    pub gravity: DVec3,
    pub steps_per_second: u32,
    pub solver_iterations: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            // Scene units are decimeters
            gravity: DVec3::new(0.0, 0.0, -98.1),
            steps_per_second: 1000,
            solver_iterations: 100,
        }
    }
}

/// The floor the tower stands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub location: DVec3,
    pub scale: DVec3,
    pub friction: f64,
    pub texture: PathBuf,
}

impl Default for Floor {
    fn default() -> Self {
        Self {
            location: DVec3::new(0.0, 0.0, -0.1),
            scale: DVec3::new(5.0, 5.0, 0.1),
            friction: 0.89442718029,
            texture: PathBuf::from("resources/wood_tile_polar.png"),
        }
    }
}

impl Floor {
    /// Static rigid body for the floor.
    pub fn body(&self) -> RigidBody {
        RigidBody {
            role: RigidBodyRole::Passive,
            mass: 0.0,
            friction: self.friction,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            use_deactivation: false,
            collision_shape: CollisionShape::Box,
        }
    }

    /// Matte wood material.
    pub fn material(&self) -> Material {
        Material {
            name: "wood_floor_material".to_string(),
            diffuse_color: DVec3::splat(0.8),
            diffuse_intensity: 0.8,
            specular_color: DVec3::splat(0.8),
            specular_intensity: 0.5,
            specular_shader: SpecularShader::CookTorrance,
            ambient: 0.0,
            texture: Some(TextureSlot {
                image: self.texture.clone(),
                scale: 1.0,
                blend: TextureBlend::Mix,
                coords: TextureCoords::Orco,
                mapping: TextureMapping::Flat,
            }),
        }
    }
}

/// Everything about the stage that does not depend on the stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub world: World,
    pub floor: Floor,
    pub render: RenderSettings,
    pub physics: PhysicsWorld,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let focus = DVec3::new(0.0, 0.0, 1.5);
        Self {
            camera: Camera {
                name: "Camera".to_string(),
                location: DVec3::new(2.0, -8.0, 2.75),
                target: focus,
            },
            lights: vec![
                Light {
                    name: "Lamp1".to_string(),
                    kind: LightKind::Point,
                    energy: 2.0,
                    placement: LightPlacement::AtCamera,
                },
                Light {
                    name: "Lamp2".to_string(),
                    kind: LightKind::Point,
                    energy: 4.0,
                    placement: LightPlacement::At(DVec3::new(1.75, -4.0, 11.5)),
                },
                Light {
                    name: "Lamp3".to_string(),
                    kind: LightKind::Spot { target: focus },
                    energy: 2.0,
                    placement: LightPlacement::At(DVec3::new(8.0, -8.0, 10.0)),
                },
            ],
            world: World::default(),
            floor: Floor::default(),
            render: RenderSettings::default(),
            physics: PhysicsWorld::default(),
        }
    }
}

impl SceneConfig {
    /// Number of frames to simulate and render.
    pub fn frame_count(&self) -> u32 {
        self.render.frame_end
    }
}

/// Clear the scene and build the stage. Returns the floor handle.
pub fn setup_scene<E: HostEngine>(engine: &mut E, config: &SceneConfig) -> Result<E::Handle, E::Error> {
    engine.clear_scene()?;

    engine.add_camera(&config.camera, &config.camera.pose())?;
    for light in &config.lights {
        engine.add_light(light, &light.pose(&config.camera))?;
    }
    engine.configure_world(&config.world)?;

    let floor = &config.floor;
    let transform = Transform {
        position: floor.location,
        rotation: DQuat::IDENTITY,
        scale: floor.scale,
    };
    let handle = engine.add_cylinder("Floor", &transform)?;
    engine.set_material(&handle, &floor.material())?;
    engine.set_rigid_body(&handle, &floor.body())?;

    engine.configure_render(&config.render, &config.physics)?;
    Ok(handle)
}
