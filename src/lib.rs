//! Image to 16-color character-grid converter.
//!
//! An image is reduced to a derived 16-color palette, cut into 2x3 pixel
//! blocks, and each block is drawn with one glyph plus a foreground and a
//! background color. The resulting [`FrameGrid`] serializes to the compact
//! binary frame in [`frame`].

pub mod chunk;
pub mod cluster;
pub mod color;
pub mod dither;
pub mod frame;
pub mod glyph;
pub mod palette;
pub mod quantize;

pub use chunk::{check_dimensions, chunk, match_block, Cell, FrameGrid, ImageChunker};
pub use frame::{decode, encode, write_frame, FrameHeader};
pub use palette::Palette;
pub use quantize::{build_palette, quantize, QuantizedImage, Speed};

use std::fmt;

use image::DynamicImage;
use log::info;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

#[derive(Error, Debug)]
pub enum JurokuError {
    #[error("Invalid {role} image: {reason}")]
    InvalidImage { role: &'static str, reason: String },
    #[error("Palette construction failed: {0}")]
    PaletteConstruction(String),
    #[error("Image {axis} of {size} pixels is not a multiple of the block {axis} ({block})")]
    Dimension { axis: Axis, size: u32, block: u32 },
    #[error("Grid {axis} of {cells} cells does not fit the 16-bit frame header")]
    Range { axis: Axis, cells: u32 },
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JurokuError>;

/// Runs the whole pipeline: quantize, then chunk.
pub struct Converter {
    speed: Speed,
    dither: f32,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Self { speed: Speed::SLOWEST, dither: 0.2 }
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Error diffusion strength in 0.0..=1.0, checked when converting.
    pub fn with_dither(mut self, amount: f32) -> Self {
        self.dither = amount;
        self
    }

    /// Converts `image`, deriving the palette from `reference` when given and
    /// from `image` itself otherwise. Dimensions are checked before any
    /// quantization work starts.
    pub fn convert(
        &self,
        image: &DynamicImage,
        reference: Option<&DynamicImage>,
    ) -> Result<FrameGrid> {
        let target = image.to_rgba8();
        quantize::check_image(&target, "target")?;
        check_dimensions(target.width(), target.height())?;

        let reference = reference.map(DynamicImage::to_rgba8);
        let reference = reference.as_ref().unwrap_or(&target);

        info!(
            "Quantizing {}x{} image (speed {}, dither {})",
            target.width(),
            target.height(),
            self.speed.get(),
            self.dither
        );
        let (palette, quantized) = quantize(reference, &target, self.speed, self.dither)?;

        info!(
            "Chunking into {}x{} cells",
            target.width() / glyph::BLOCK_WIDTH,
            target.height() / glyph::BLOCK_HEIGHT
        );
        chunk(&quantized, &palette)
    }
}
