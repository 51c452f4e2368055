//! Mapping pixels onto the palette, with optional Floyd-Steinberg error diffusion.

use image::RgbaImage;
use rayon::prelude::*;

use crate::color;
use crate::palette::Palette;

/// Quantization error carried to the current and next scanline.
///
/// Both rows have one cell of padding on each side so that error pushed past
/// the image edge lands in padding and is dropped.
#[derive(Debug, Clone)]
pub struct ErrorRows {
    current: Vec<[f32; 3]>,
    next: Vec<[f32; 3]>,
}

impl ErrorRows {
    pub fn new(width: usize) -> Self {
        Self {
            current: vec![[0.0; 3]; width + 2],
            next: vec![[0.0; 3]; width + 2],
        }
    }

    /// Error accumulated so far for column `x` of the current row.
    pub fn at(&self, x: usize) -> [f32; 3] {
        self.current[x + 1]
    }

    /// Error already pushed to column `x` of the next row.
    pub fn below(&self, x: usize) -> [f32; 3] {
        self.next[x + 1]
    }

    /// Spreads `error` from column `x`: 7/16 right, 3/16 below-left,
    /// 5/16 below, 1/16 below-right.
    pub fn diffuse(&mut self, x: usize, error: [f32; 3]) {
        let i = x + 1;
        add(&mut self.current[i + 1], error, 7.0 / 16.0);
        add(&mut self.next[i - 1], error, 3.0 / 16.0);
        add(&mut self.next[i], error, 5.0 / 16.0);
        add(&mut self.next[i + 1], error, 1.0 / 16.0);
    }

    /// Moves on to the next scanline.
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.fill([0.0; 3]);
    }
}

#[inline]
fn add(cell: &mut [f32; 3], error: [f32; 3], fraction: f32) {
    for ch in 0..3 {
        cell[ch] += error[ch] * fraction;
    }
}

/// Flat nearest-color mapping. Every pixel is independent, so the work is
/// split across threads.
pub fn remap(image: &RgbaImage, palette: &Palette) -> Vec<u8> {
    let entries = palette.as_f32();
    image
        .as_raw()
        .par_chunks_exact(4)
        .map(|px| color::nearest(&entries, [px[0] as f32, px[1] as f32, px[2] as f32]) as u8)
        .collect()
}

/// Error-diffused mapping in left-to-right, top-to-bottom order. `amount`
/// scales the propagated error; 0.0 degenerates to [`remap`].
pub fn diffuse(image: &RgbaImage, palette: &Palette, amount: f32) -> Vec<u8> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let entries = palette.as_f32();
    let mut indices = Vec::with_capacity(width * height);
    let mut errors = ErrorRows::new(width);

    for y in 0..height {
        for x in 0..width {
            let px = image.get_pixel(x as u32, y as u32);
            let carried = errors.at(x);
            let value = [0, 1, 2].map(|ch| (px[ch] as f32 + carried[ch]).clamp(0.0, 255.0));

            let index = color::nearest(&entries, value);
            let chosen = entries[index];
            errors.diffuse(x, [0, 1, 2].map(|ch| (value[ch] - chosen[ch]) * amount));
            indices.push(index as u8);
        }
        errors.advance();
    }

    indices
}
