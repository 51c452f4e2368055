//! Reduces an image to indices into a derived 16-color palette.

use image::RgbaImage;
use log::debug;

use crate::cluster::{self, Histogram};
use crate::color;
use crate::dither;
use crate::palette::{Palette, PALETTE_SIZE};
use crate::{JurokuError, Result};

/// Palette construction effort: 1 is the most thorough, 10 the fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Speed(u8);

impl Speed {
    pub const SLOWEST: Speed = Speed(1);
    pub const FASTEST: Speed = Speed(10);

    pub fn new(speed: u8) -> Result<Self> {
        if !(Self::SLOWEST.0..=Self::FASTEST.0).contains(&speed) {
            return Err(JurokuError::InvalidOption(format!(
                "speed must be between 1 and 10, got {speed}"
            )));
        }
        Ok(Self(speed))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Low bits dropped from each channel when building the histogram.
    fn posterize(self) -> u8 {
        match self.0 {
            0..=7 => 0,
            8 | 9 => 1,
            _ => 2,
        }
    }

    /// K-means rounds run after the median cut.
    fn refine_iterations(self) -> u32 {
        const ROUNDS: [u32; 10] = [16, 12, 10, 8, 6, 4, 3, 2, 1, 0];
        ROUNDS[(self.0.clamp(1, 10) - 1) as usize]
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::SLOWEST
    }
}

/// Image of palette indices, same size as the image it was mapped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
    width: u32,
    height: u32,
    indices: Vec<u8>,
}

impl QuantizedImage {
    /// Wraps row-major `indices`. Every index must address the palette.
    pub fn new(width: u32, height: u32, indices: Vec<u8>) -> Result<Self> {
        if indices.len() != width as usize * height as usize {
            return Err(JurokuError::InvalidImage {
                role: "quantized",
                reason: format!(
                    "{} indices do not fill a {width}x{height} image",
                    indices.len()
                ),
            });
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= PALETTE_SIZE) {
            return Err(JurokuError::InvalidImage {
                role: "quantized",
                reason: format!("palette index {bad} out of range"),
            });
        }
        Ok(Self { width, height, indices })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self, x: u32, y: u32) -> u8 {
        self.indices[y as usize * self.width as usize + x as usize]
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }
}

pub(crate) fn check_image(image: &RgbaImage, role: &'static str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(JurokuError::InvalidImage {
            role,
            reason: format!("{}x{} has no pixels", image.width(), image.height()),
        });
    }
    Ok(())
}

/// Derives a 16-color palette from the colors of `reference`.
pub fn build_palette(reference: &RgbaImage, speed: Speed) -> Result<Palette> {
    check_image(reference, "reference")?;

    let histogram = Histogram::from_image(reference, speed.posterize());
    if histogram.is_empty() {
        return Err(JurokuError::PaletteConstruction(
            "reference image has no colors".into(),
        ));
    }
    debug!("reference histogram has {} colors", histogram.len());

    if histogram.len() <= PALETTE_SIZE {
        let mut entries = histogram.entries().to_vec();
        entries.sort_by(|a, b| b.weight.cmp(&a.weight));
        let colors: Vec<_> = entries.iter().map(|e| color::to_rgb(e.color)).collect();
        return Palette::from_colors(&colors);
    }

    let mut centroids = cluster::median_cut(&histogram, PALETTE_SIZE);
    cluster::refine(&histogram, &mut centroids, speed.refine_iterations());

    let weights = cluster::weights(&histogram, &centroids);
    let mut ranked: Vec<_> = centroids.into_iter().zip(weights).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let colors: Vec<_> = ranked.into_iter().map(|(c, _)| color::to_rgb(c)).collect();
    Palette::from_colors(&colors)
}

/// Builds the palette from `reference` and maps every pixel of `target` onto
/// it. `dither` in 0.0..=1.0 scales the diffused quantization error.
pub fn quantize(
    reference: &RgbaImage,
    target: &RgbaImage,
    speed: Speed,
    dither: f32,
) -> Result<(Palette, QuantizedImage)> {
    if !(0.0..=1.0).contains(&dither) {
        return Err(JurokuError::InvalidOption(format!(
            "dither must be between 0 and 1, got {dither}"
        )));
    }
    check_image(reference, "reference")?;
    check_image(target, "target")?;

    let palette = build_palette(reference, speed)?;
    let indices = if dither > 0.0 {
        dither::diffuse(target, &palette, dither)
    } else {
        dither::remap(target, &palette)
    };

    let image = QuantizedImage::new(target.width(), target.height(), indices)?;
    Ok((palette, image))
}
