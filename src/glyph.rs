//! The 2x3 sub-pixel glyph alphabet of the target terminal font.
//!
//! Sub-pixel `(x, y)` of a block is bit `y * 2 + x` of a pattern; a set bit is
//! drawn in the foreground color. Each of the 64 patterns has its own glyph
//! in the font, `GLYPH_BASE + pattern`.

pub const BLOCK_WIDTH: u32 = 2;
pub const BLOCK_HEIGHT: u32 = 3;
pub const BLOCK_PIXELS: usize = (BLOCK_WIDTH * BLOCK_HEIGHT) as usize;

/// First drawing glyph of the font.
pub const GLYPH_BASE: u8 = 0x80;
pub const GLYPH_COUNT: u8 = 1 << BLOCK_PIXELS;

/// Glyph with no foreground sub-pixels.
pub const BLANK: u8 = GLYPH_BASE;

const PATTERN_BITS: u8 = GLYPH_COUNT - 1;

/// Glyph code of every 6-bit pattern.
pub const GLYPHS: [u8; GLYPH_COUNT as usize] = build_table();

const fn build_table() -> [u8; GLYPH_COUNT as usize] {
    let mut table = [BLANK; GLYPH_COUNT as usize];
    let mut pattern = 0;
    while pattern < table.len() {
        table[pattern] = GLYPH_BASE + pattern as u8;
        pattern += 1;
    }
    table
}

#[inline]
pub fn glyph_for(pattern: u8) -> u8 {
    GLYPHS[(pattern & PATTERN_BITS) as usize]
}

/// Foreground pattern drawn by a glyph code. Only meaningful for codes that
/// pass [`is_glyph`].
#[inline]
pub fn pattern_of(code: u8) -> u8 {
    code.wrapping_sub(GLYPH_BASE) & PATTERN_BITS
}

#[inline]
pub fn is_glyph(code: u8) -> bool {
    (GLYPH_BASE..GLYPH_BASE + GLYPH_COUNT).contains(&code)
}

/// Bit of sub-pixel `(x, y)` within a block.
#[inline]
pub fn bit(x: u32, y: u32) -> u8 {
    1 << (y * BLOCK_WIDTH + x)
}
