//! The fixed 16-entry palette addressed by every cell.

use crate::color;
use crate::{JurokuError, Result};
use image::Rgb;

pub const PALETTE_SIZE: usize = 16;

/// Ordered set of exactly 16 colors. Indices are stable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb<u8>; PALETTE_SIZE],
}

impl Palette {
    pub fn new(colors: [Rgb<u8>; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// Builds a palette from 1 to 16 colors, padding the tail with copies of
    /// the first color. Padding never wins a nearest-color lookup because
    /// ties resolve to the lower index.
    pub fn from_colors(colors: &[Rgb<u8>]) -> Result<Self> {
        let first = *colors
            .first()
            .ok_or_else(|| JurokuError::PaletteConstruction("no colors to build from".into()))?;
        if colors.len() > PALETTE_SIZE {
            return Err(JurokuError::PaletteConstruction(format!(
                "{} colors given, at most {} fit",
                colors.len(),
                PALETTE_SIZE
            )));
        }

        let mut entries = [first; PALETTE_SIZE];
        entries[..colors.len()].copy_from_slice(colors);
        Ok(Self::new(entries))
    }

    /// Color at `index`, if it addresses the palette.
    pub fn get(&self, index: u8) -> Option<Rgb<u8>> {
        self.colors.get(index as usize).copied()
    }

    /// Color at an index already known to be below 16.
    pub(crate) fn color(&self, index: u8) -> Rgb<u8> {
        self.colors[index as usize]
    }

    pub fn colors(&self) -> &[Rgb<u8>; PALETTE_SIZE] {
        &self.colors
    }

    /// Perceptually nearest entry to `color`.
    pub fn nearest(&self, color: [f32; 3]) -> u8 {
        color::nearest(&self.as_f32(), color) as u8
    }

    pub(crate) fn as_f32(&self) -> [[f32; 3]; PALETTE_SIZE] {
        self.colors.map(color::to_f32)
    }
}
