//! Material assignment strategies.
//!
//! Each dataset is rendered with one of three color schemes. All of them
//! draw from the stimulus's seeded stream one block at a time, in block
//! order, with a fixed draw sequence per block:
//!
//! | strategy | draws per block |
//! |----------|-----------------|
//! | [`MaterialStrategy::UniformHue`] | 1 uniform (hue) |
//! | [`MaterialStrategy::RedBlue`] | 2 normals (saturation, then value) |
//! | [`MaterialStrategy::StonePlastic`] | 4 normals (shared jitter, then r, g, b) |
//!
//! The same seed and block list therefore always yield the same materials.

use crate::color::{clamp_unit, from_hex, hsv_to_rgb, rgb_to_hsv};
use crate::error::{ConfigError, MaterialError};
use crate::geometry::BlockInstance;
use crate::rng::StimulusRng;
use crate::table::BlockType;
use crate::textures::TextureSet;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Reference color for blocktype 0 in the red/blue scheme.
pub const RED_REFERENCE: &str = "#CA0020";
/// Reference color for blocktype 1 in the red/blue scheme.
pub const BLUE_REFERENCE: &str = "#0571B0";
/// Standard deviation of the saturation/value jitter in the red/blue scheme.
pub const RED_BLUE_JITTER: f64 = 1.0 / 8.0;

/// Texture scale for blocktype 0 in the stone/plastic scheme.
pub const STRIPES_SCALE: f64 = 0.5;
/// Texture scale for blocktype 1 in the stone/plastic scheme.
pub const GRANITE_SCALE: f64 = 0.575;
/// Standard deviation of the shared tint jitter.
pub const SHARED_TINT_JITTER: f64 = 0.05;
/// Standard deviation of the per-channel tint jitter, by blocktype.
pub const CHANNEL_TINT_JITTER: [f64; 2] = [0.05, 0.05];
/// Untinted base color, by blocktype.
pub const TINT_BASE: [[f64; 3]; 2] = [[0.85, 0.85, 0.85], [0.6, 0.6, 0.6]];

/// Specular model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecularShader {
    #[default]
    CookTorrance,
    Phong,
    Wardiso,
}

/// How a texture combines with the diffuse color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureBlend {
    #[default]
    Mix,
    Multiply,
    Overlay,
}

/// Texture coordinate source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureCoords {
    /// Original (undeformed) object coordinates.
    #[default]
    Orco,
    Generated,
    Uv,
}

/// Projection of a texture onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMapping {
    #[default]
    Flat,
    Cube,
}

/// An image texture attached to a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub image: PathBuf,
    pub scale: f64,
    pub blend: TextureBlend,
    pub coords: TextureCoords,
    pub mapping: TextureMapping,
}

/// Surface description handed to the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub diffuse_color: DVec3,
    pub diffuse_intensity: f64,
    pub specular_color: DVec3,
    pub specular_intensity: f64,
    pub specular_shader: SpecularShader,
    pub ambient: f64,
    pub texture: Option<TextureSlot>,
}

impl Material {
    /// Glossy plastic look shared by the untextured schemes.
    pub fn plastic(name: impl Into<String>, color: DVec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color: color,
            diffuse_intensity: 0.8,
            specular_color: DVec3::splat(0.5),
            specular_intensity: 0.1,
            specular_shader: SpecularShader::Wardiso,
            ambient: 0.0,
            texture: None,
        }
    }
}

/// Color scheme used for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialStrategy {
    /// Random fully saturated hue per block.
    UniformHue,
    /// Red or blue by blocktype, with jittered saturation and value.
    RedBlue,
    /// Striped or granite texture by blocktype, with a jittered tint.
    StonePlastic,
}

impl MaterialStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [MaterialStrategy; 3] = [
        MaterialStrategy::UniformHue,
        MaterialStrategy::RedBlue,
        MaterialStrategy::StonePlastic,
    ];

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            MaterialStrategy::UniformHue => "uniform_hue",
            MaterialStrategy::RedBlue => "red_blue",
            MaterialStrategy::StonePlastic => "stone_plastic",
        }
    }

    /// Whether the strategy references the procedural textures.
    pub fn needs_textures(&self) -> bool {
        matches!(self, MaterialStrategy::StonePlastic)
    }

    /// Compute one material per block, drawing from `rng` in block order.
    pub fn assign<H>(
        &self,
        rng: &mut StimulusRng,
        blocks: &[BlockInstance<H>],
        textures: &TextureSet,
    ) -> Result<Vec<Material>, MaterialError> {
        let mut materials = Vec::with_capacity(blocks.len());
        for block in blocks {
            let name = format!("{}_material", block.name);
            let material = match self {
                MaterialStrategy::UniformHue => {
                    Material::plastic(name, hsv_to_rgb(rng.uniform(), 1.0, 1.0))
                }
                MaterialStrategy::RedBlue => {
                    let reference = match self.blocktype_of(block)? {
                        BlockType::Zero => from_hex(RED_REFERENCE)?,
                        BlockType::One => from_hex(BLUE_REFERENCE)?,
                    };
                    Material::plastic(name, jitter_sv(rng, reference))
                }
                MaterialStrategy::StonePlastic => {
                    let kind = self.blocktype_of(block)?;
                    stone_plastic(rng, name, kind, textures)
                }
            };
            materials.push(material);
        }
        Ok(materials)
    }

    fn blocktype_of<H>(&self, block: &BlockInstance<H>) -> Result<BlockType, MaterialError> {
        block.blocktype.ok_or_else(|| MaterialError::MissingBlockType {
            strategy: self.name(),
            object: block.name.clone(),
        })
    }
}

/// Perturb saturation then value of `rgb` with independent normal draws.
fn jitter_sv(rng: &mut StimulusRng, rgb: DVec3) -> DVec3 {
    let (h, s, v) = rgb_to_hsv(rgb);
    let s = clamp_unit(s + rng.normal(0.0, RED_BLUE_JITTER));
    let v = clamp_unit(v + rng.normal(0.0, RED_BLUE_JITTER));
    hsv_to_rgb(h, s, v)
}

fn stone_plastic(
    rng: &mut StimulusRng,
    name: String,
    kind: BlockType,
    textures: &TextureSet,
) -> Material {
    let i = kind.index();
    let shared = rng.normal(0.0, SHARED_TINT_JITTER);
    let mut tint = [0.0; 3];
    for (c, channel) in tint.iter_mut().enumerate() {
        let jitter = rng.normal(0.0, CHANNEL_TINT_JITTER[i]);
        *channel = clamp_unit(TINT_BASE[i][c] + shared + jitter);
    }

    let (image, scale, blend, specular) = match kind {
        BlockType::Zero => (textures.stripes.clone(), STRIPES_SCALE, TextureBlend::Multiply, 0.3),
        BlockType::One => (textures.granite.clone(), GRANITE_SCALE, TextureBlend::Mix, 0.05),
    };

    Material {
        specular_intensity: specular,
        texture: Some(TextureSlot {
            image,
            scale,
            blend,
            coords: TextureCoords::Orco,
            mapping: TextureMapping::Cube,
        }),
        ..Material::plastic(name, DVec3::from_array(tint))
    }
}

impl fmt::Display for MaterialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialStrategy::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl MaterialStrategy {
    /// Parse the strategy configured for `dataset`.
    pub fn for_dataset(dataset: &str, strategy: &str) -> Result<Self, ConfigError> {
        strategy.parse().map_err(|strategy| ConfigError::UnknownStrategy {
            dataset: dataset.to_string(),
            strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RigidBody, Transform};

    fn blocks(types: &[Option<BlockType>]) -> Vec<BlockInstance<()>> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| BlockInstance {
                name: format!("block_{i}"),
                handle: (),
                transform: Transform::default(),
                body: RigidBody {
                    role: Default::default(),
                    mass: 1.0,
                    friction: 0.5,
                    restitution: 0.0,
                    linear_damping: 0.1,
                    angular_damping: 0.75,
                    use_deactivation: true,
                    collision_shape: Default::default(),
                },
                blocktype: *t,
                material: None,
            })
            .collect()
    }

    fn textures() -> TextureSet {
        TextureSet::in_dir("textures")
    }

    #[test]
    fn test_uniform_hue_matches_stream() {
        let b = blocks(&[None, None, None]);
        let mut rng = StimulusRng::new(214_068_433);
        let materials = MaterialStrategy::UniformHue.assign(&mut rng, &b, &textures()).unwrap();

        let mut reference = StimulusRng::new(214_068_433);
        for m in &materials {
            assert_eq!(m.diffuse_color, hsv_to_rgb(reference.uniform(), 1.0, 1.0));
        }
        assert_eq!(rng.uniform_draws(), 3);

        // Known values for this seed
        let first = materials[0].diffuse_color;
        assert!((first - DVec3::new(0.48932220293092765, 1.0, 0.0)).abs().max_element() < 1e-12);
        assert_eq!(materials[1].name, "block_1_material");
    }

    #[test]
    fn test_red_blue_known_values() {
        let b = blocks(&[Some(BlockType::Zero), Some(BlockType::One)]);
        let mut rng = StimulusRng::new(214_068_433);
        let materials = MaterialStrategy::RedBlue.assign(&mut rng, &b, &textures()).unwrap();

        let red = materials[0].diffuse_color;
        assert!((red - DVec3::new(0.62121635439373, 0.0, 0.09841051158712563)).abs().max_element() < 1e-12);
        let blue = materials[1].diffuse_color;
        assert!((blue - DVec3::new(0.02336443418686989, 0.40616344701526536, 0.6294628711651625)).abs().max_element() < 1e-12);
    }

    #[test]
    fn test_red_blue_follows_reference_transform() {
        let b = blocks(&[Some(BlockType::Zero)]);
        let mut rng = StimulusRng::new(99);
        let got = MaterialStrategy::RedBlue.assign(&mut rng, &b, &textures()).unwrap();

        let mut reference = StimulusRng::new(99);
        let (h, s, v) = rgb_to_hsv(from_hex(RED_REFERENCE).unwrap());
        let s = (s + reference.normal(0.0, 0.125)).clamp(0.0, 1.0);
        let v = (v + reference.normal(0.0, 0.125)).clamp(0.0, 1.0);
        assert_eq!(got[0].diffuse_color, hsv_to_rgb(h, s, v));
    }

    #[test]
    fn test_stone_plastic_textures_and_tint() {
        let b = blocks(&[Some(BlockType::Zero), Some(BlockType::One)]);
        let mut rng = StimulusRng::new(5);
        let materials = MaterialStrategy::StonePlastic.assign(&mut rng, &b, &textures()).unwrap();

        let stripes = materials[0].texture.as_ref().unwrap();
        assert_eq!(stripes.scale, STRIPES_SCALE);
        assert!(stripes.image.ends_with("stripes.png"));
        let granite = materials[1].texture.as_ref().unwrap();
        assert_eq!(granite.scale, GRANITE_SCALE);
        assert!(granite.image.ends_with("granite.png"));

        for m in &materials {
            let c = m.diffuse_color;
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }

    #[test]
    fn test_stone_plastic_draw_order() {
        let b = blocks(&[Some(BlockType::One)]);
        let mut rng = StimulusRng::new(11);
        let got = MaterialStrategy::StonePlastic.assign(&mut rng, &b, &textures()).unwrap();

        let mut reference = StimulusRng::new(11);
        let shared = reference.normal(0.0, 0.05);
        let expected: Vec<f64> = (0..3)
            .map(|c| (TINT_BASE[1][c] + shared + reference.normal(0.0, 0.05)).clamp(0.0, 1.0))
            .collect();
        assert_eq!(got[0].diffuse_color.to_array().to_vec(), expected);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let b = blocks(&[Some(BlockType::Zero), Some(BlockType::One), Some(BlockType::Zero)]);
        for strategy in MaterialStrategy::ALL {
            let a = strategy.assign(&mut StimulusRng::new(123), &b, &textures()).unwrap();
            let c = strategy.assign(&mut StimulusRng::new(123), &b, &textures()).unwrap();
            assert_eq!(a, c, "{strategy} is not deterministic");
        }
    }

    #[test]
    fn test_missing_blocktype() {
        let b = blocks(&[Some(BlockType::Zero), None]);
        let err = MaterialStrategy::RedBlue
            .assign(&mut StimulusRng::new(1), &b, &textures())
            .unwrap_err();
        assert!(matches!(err, MaterialError::MissingBlockType { ref object, .. } if object == "block_1"));
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("red_blue".parse::<MaterialStrategy>(), Ok(MaterialStrategy::RedBlue));
        let err = MaterialStrategy::for_dataset("towers", "sparkly").unwrap_err();
        assert!(err.to_string().contains("towers"));
    }
}
