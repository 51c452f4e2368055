//! Image chunking - splits a quantized image into 2x3 blocks and picks the
//! glyph and color pair that best draws each one.

use image::RgbImage;
use rayon::prelude::*;

use crate::color;
use crate::glyph::{self, BLANK, BLOCK_HEIGHT, BLOCK_PIXELS, BLOCK_WIDTH};
use crate::palette::{Palette, PALETTE_SIZE};
use crate::quantize::QuantizedImage;
use crate::{Axis, JurokuError, Result};

/// One rendered block: two palette indices and a glyph code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub foreground: u8,
    pub background: u8,
    pub glyph: u8,
}

impl Cell {
    /// Block filled with a single color.
    pub fn uniform(index: u8) -> Self {
        Self { foreground: index, background: index, glyph: BLANK }
    }

    /// Cell drawing `pattern`, set bits in `foreground`.
    pub fn from_pattern(foreground: u8, background: u8, pattern: u8) -> Self {
        Self { foreground, background, glyph: glyph::glyph_for(pattern) }
    }

    /// Palette index shown at sub-pixel `(x, y)`.
    pub fn index_at(&self, x: u32, y: u32) -> u8 {
        if glyph::pattern_of(self.glyph) & glyph::bit(x, y) != 0 {
            self.foreground
        } else {
            self.background
        }
    }
}

/// Grid of cells plus the palette they index, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGrid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    palette: Palette,
}

impl FrameGrid {
    pub fn new(width: u32, height: u32, cells: Vec<Cell>, palette: Palette) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(JurokuError::InvalidImage {
                role: "frame",
                reason: format!("{width}x{height} grid has no cells"),
            });
        }
        if cells.len() != width as usize * height as usize {
            return Err(JurokuError::InvalidImage {
                role: "frame",
                reason: format!("{} cells do not fill a {width}x{height} grid", cells.len()),
            });
        }
        let in_range = |i: u8| (i as usize) < PALETTE_SIZE;
        if let Some(bad) = cells
            .iter()
            .find(|c| !in_range(c.foreground) || !in_range(c.background) || !glyph::is_glyph(c.glyph))
        {
            return Err(JurokuError::InvalidImage {
                role: "frame",
                reason: format!("cell {bad:?} is not drawable"),
            });
        }
        Ok(Self { width, height, cells, palette })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: u32, row: u32) -> Cell {
        self.cells[row as usize * self.width as usize + col as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width as usize)
    }

    /// Redraws the grid as pixels, one 2x3 block per cell.
    pub fn render_preview(&self) -> RgbImage {
        RgbImage::from_fn(self.width * BLOCK_WIDTH, self.height * BLOCK_HEIGHT, |x, y| {
            let cell = self.cell(x / BLOCK_WIDTH, y / BLOCK_HEIGHT);
            self.palette.color(cell.index_at(x % BLOCK_WIDTH, y % BLOCK_HEIGHT))
        })
    }
}

/// Fails unless both dimensions are whole multiples of the block size.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width % BLOCK_WIDTH != 0 {
        return Err(JurokuError::Dimension { axis: Axis::Width, size: width, block: BLOCK_WIDTH });
    }
    if height % BLOCK_HEIGHT != 0 {
        return Err(JurokuError::Dimension { axis: Axis::Height, size: height, block: BLOCK_HEIGHT });
    }
    Ok(())
}

pub struct ImageChunker<'a> {
    image: &'a QuantizedImage,
}

impl<'a> ImageChunker<'a> {
    pub fn new(image: &'a QuantizedImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    pub fn cols(&self) -> u32 {
        self.image.width() / BLOCK_WIDTH
    }

    pub fn rows(&self) -> u32 {
        self.image.height() / BLOCK_HEIGHT
    }

    /// Palette indices of the block at (col, row), in raster order.
    pub fn get_chunk(&self, col: u32, row: u32) -> [u8; BLOCK_PIXELS] {
        let (x0, y0) = (col * BLOCK_WIDTH, row * BLOCK_HEIGHT);
        let mut block = [0u8; BLOCK_PIXELS];
        for dy in 0..BLOCK_HEIGHT {
            for dx in 0..BLOCK_WIDTH {
                block[(dy * BLOCK_WIDTH + dx) as usize] = self.image.index(x0 + dx, y0 + dy);
            }
        }
        block
    }
}

/// Picks the cell for one block of palette indices (all below 16).
///
/// One color gives a uniform cell. Two colors are drawn exactly, the more
/// frequent one as foreground (first seen on a tie). With three or more, the
/// two most frequent indices are kept (lower index on a tie) and every
/// sub-pixel goes to whichever of them is perceptually closer.
pub fn match_block(block: &[u8; BLOCK_PIXELS], palette: &Palette) -> Cell {
    let mut counts = [0u8; PALETTE_SIZE];
    let mut seen = [0u8; BLOCK_PIXELS];
    let mut distinct = 0;
    for &i in block {
        if counts[i as usize] == 0 {
            seen[distinct] = i;
            distinct += 1;
        }
        counts[i as usize] += 1;
    }

    match distinct {
        1 => Cell::uniform(block[0]),
        2 => {
            let (a, b) = (seen[0], seen[1]);
            let (fg, bg) = if counts[b as usize] > counts[a as usize] { (b, a) } else { (a, b) };
            Cell::from_pattern(fg, bg, pattern_where(block, |i| i == fg))
        }
        _ => {
            let fg = most_frequent(&counts, None);
            let bg = most_frequent(&counts, Some(fg));
            let fg_color = color::to_f32(palette.color(fg));
            let bg_color = color::to_f32(palette.color(bg));
            let pattern = pattern_where(block, |i| {
                let c = color::to_f32(palette.color(i));
                i == fg || (i != bg && color::distance(c, fg_color) <= color::distance(c, bg_color))
            });
            Cell::from_pattern(fg, bg, pattern)
        }
    }
}

fn most_frequent(counts: &[u8; PALETTE_SIZE], skip: Option<u8>) -> u8 {
    let mut best = 0u8;
    let mut best_count = 0u8;
    for (i, &count) in counts.iter().enumerate() {
        if Some(i as u8) != skip && count > best_count {
            best = i as u8;
            best_count = count;
        }
    }
    best
}

fn pattern_where(block: &[u8; BLOCK_PIXELS], is_foreground: impl Fn(u8) -> bool) -> u8 {
    block
        .iter()
        .enumerate()
        .filter(|(_, &i)| is_foreground(i))
        .fold(0, |pattern, (bit, _)| pattern | 1 << bit)
}

/// Converts a quantized image into a grid of cells. Rows of blocks are
/// matched in parallel; the result does not depend on scheduling.
pub fn chunk(image: &QuantizedImage, palette: &Palette) -> Result<FrameGrid> {
    let chunker = ImageChunker::new(image)?;
    let (cols, rows) = (chunker.cols(), chunker.rows());

    let cells: Vec<Cell> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            let chunker = &chunker;
            (0..cols).map(move |col| match_block(&chunker.get_chunk(col, row), palette))
        })
        .collect();

    FrameGrid::new(cols, rows, cells, *palette)
}
