//! Procedural textures for the stone/plastic material theme.
//!
//! The stone/plastic strategy references two tileable textures: a striped
//! pattern for blocktype 0 and a grayscale granite for blocktype 1. They are
//! generated here rather than shipped, written once as PNG files, and then
//! referenced by path from every material that uses them.
//!
//! Generation is fully deterministic, so a texture directory can be deleted
//! and regenerated without changing any render.

use crate::error::EngineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the striped texture.
pub const STRIPES_FILE: &str = "stripes.png";
/// File name of the granite texture.
pub const GRANITE_FILE: &str = "granite.png";

const TEXTURE_SIZE: u32 = 256;
const GRANITE_SEED: u32 = 0x6772_616e;

/// An RGBA image held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureImage {
    /// Diagonal stripes alternating between two colors.
    ///
    /// `period` is the width of one stripe in pixels. With `size` a multiple
    /// of `2 * period` the pattern tiles seamlessly.
    pub fn stripes(size: u32, period: u32, color1: [u8; 4], color2: [u8; 4]) -> Self {
        let period = period.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let band = ((x + y) / period) % 2;
                let color = if band == 0 { color1 } else { color2 };
                data.extend_from_slice(&color);
            }
        }
        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Grayscale granite: layered value noise with dark and light flecks.
    pub fn granite(size: u32, seed: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                // Coarse to fine octaves, halving the weight each time
                let mut value = 0.0f32;
                let mut weight = 0.5f32;
                for octave in (0..4u32).rev() {
                    let n = hash_noise(x >> octave, y >> octave, seed.wrapping_add(octave));
                    value += weight * (n as f32 / 255.0);
                    weight *= 0.5;
                }
                let value = 0.25 + value * 0.6;

                let fleck = hash_noise(x, y, seed ^ 0xf1ec);
                let v = match fleck {
                    0..=6 => 0.08,
                    249..=255 => 0.95,
                    _ => value,
                };
                let v = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Write the image as a PNG file.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

/// Simple hash-based noise function.
fn hash_noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut n = x
        .wrapping_mul(374761393)
        .wrapping_add(y.wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1013904223));
    n = (n ^ (n >> 13)).wrapping_mul(1274126177);
    n = n ^ (n >> 16);
    (n & 255) as u8
}

/// Locations of the procedural textures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSet {
    pub stripes: PathBuf,
    pub granite: PathBuf,
}

impl TextureSet {
    /// Texture paths inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            stripes: dir.join(STRIPES_FILE),
            granite: dir.join(GRANITE_FILE),
        }
    }

    /// Write any texture that does not exist yet.
    pub fn ensure_generated(&self) -> Result<(), EngineError> {
        if !self.stripes.exists() {
            write_texture(
                &self.stripes,
                &TextureImage::stripes(TEXTURE_SIZE, 16, [235, 235, 235, 255], [150, 150, 150, 255]),
            )?;
        }
        if !self.granite.exists() {
            write_texture(&self.granite, &TextureImage::granite(TEXTURE_SIZE, GRANITE_SEED))?;
        }
        Ok(())
    }
}

fn write_texture(path: &Path, image: &TextureImage) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    info!("Generated texture {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripes_alternate() {
        let tex = TextureImage::stripes(8, 2, [255, 0, 0, 255], [0, 0, 255, 255]);
        assert_eq!(tex.data.len(), 8 * 8 * 4);
        assert_eq!(&tex.data[0..4], &[255, 0, 0, 255]);
        // Pixel (2, 0) is in the second band
        assert_eq!(&tex.data[8..12], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_granite_is_gray_and_deterministic() {
        let a = TextureImage::granite(32, 7);
        let b = TextureImage::granite(32, 7);
        assert_eq!(a, b);
        for px in a.data.chunks(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
        assert_ne!(a, TextureImage::granite(32, 8));
    }

    #[test]
    fn test_ensure_generated_writes_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let set = TextureSet::in_dir(dir.path().join("textures"));
        set.ensure_generated().unwrap();
        assert!(set.stripes.exists());
        assert!(set.granite.exists());

        let img = image::open(&set.granite).unwrap();
        assert_eq!(img.width(), TEXTURE_SIZE);
    }
}
