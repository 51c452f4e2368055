//! Binary frame layout consumed by the renderer.
//!
//! ```text
//! width   u16 BE    grid width in cells
//! height  u16 BE    grid height in cells
//! rows    height x (foreground[width] background[width] glyphs[width])
//! palette 16 x (r, g, b)
//! ```
//!
//! Color buffers hold one lowercase hex digit per cell.

use std::io::{BufWriter, Write};

use image::Rgb;

use crate::chunk::{Cell, FrameGrid};
use crate::palette::{Palette, PALETTE_SIZE};
use crate::{Axis, JurokuError, Result};

pub const HEADER_LEN: usize = 4;
pub const PALETTE_LEN: usize = PALETTE_SIZE * 3;

const HEX_DIGITS: &[u8; PALETTE_SIZE] = b"0123456789abcdef";

/// Byte length of an encoded `width` x `height` frame.
pub fn encoded_len(width: usize, height: usize) -> usize {
    HEADER_LEN + height * 3 * width + PALETTE_LEN
}

/// Grid dimensions as stored in the first four bytes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u16,
    pub height: u16,
}

impl FrameHeader {
    fn for_grid(grid: &FrameGrid) -> Result<Self> {
        let field = |axis, cells: u32| {
            u16::try_from(cells).map_err(|_| JurokuError::Range { axis, cells })
        };
        Ok(Self {
            width: field(Axis::Width, grid.width())?,
            height: field(Axis::Height, grid.height())?,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [w0, w1, h0, h1, ..] => Ok(Self {
                width: u16::from_be_bytes([*w0, *w1]),
                height: u16::from_be_bytes([*h0, *h1]),
            }),
            _ => Err(JurokuError::MalformedFrame(format!(
                "{} bytes is too short for a header",
                bytes.len()
            ))),
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let [w0, w1] = self.width.to_be_bytes();
        let [h0, h1] = self.height.to_be_bytes();
        [w0, w1, h0, h1]
    }
}

/// Serializes `grid`. Fails only if a dimension exceeds 65535 cells.
pub fn encode(grid: &FrameGrid) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded_len(grid.width() as usize, grid.height() as usize));
    write_frame(grid, &mut out)?;
    Ok(out)
}

/// Streams the encoded frame into `writer`. Nothing is written if the grid
/// does not fit the header fields.
pub fn write_frame<W: Write>(grid: &FrameGrid, writer: W) -> Result<()> {
    let header = FrameHeader::for_grid(grid)?;
    let mut wr = BufWriter::new(writer);

    wr.write_all(&header.to_bytes())?;
    let width = grid.width() as usize;
    let mut row_buf = vec![0u8; 3 * width];
    for row in grid.rows() {
        let (fg, rest) = row_buf.split_at_mut(width);
        let (bg, glyphs) = rest.split_at_mut(width);
        for (i, cell) in row.iter().enumerate() {
            fg[i] = HEX_DIGITS[cell.foreground as usize];
            bg[i] = HEX_DIGITS[cell.background as usize];
            glyphs[i] = cell.glyph;
        }
        wr.write_all(&row_buf)?;
    }
    for color in grid.palette().colors() {
        wr.write_all(&color.0)?;
    }

    wr.flush()?;
    Ok(())
}

/// Parses a frame produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<FrameGrid> {
    let header = FrameHeader::parse(bytes)?;
    let (width, height) = (header.width as usize, header.height as usize);
    let expected = encoded_len(width, height);
    if bytes.len() != expected {
        return Err(JurokuError::MalformedFrame(format!(
            "{width}x{height} frame must be {expected} bytes, got {}",
            bytes.len()
        )));
    }

    let body = &bytes[HEADER_LEN..expected - PALETTE_LEN];
    let mut cells = Vec::with_capacity(width * height);
    if width > 0 {
        for row in body.chunks_exact(3 * width) {
            let (fg, rest) = row.split_at(width);
            let (bg, glyphs) = rest.split_at(width);
            for i in 0..width {
                cells.push(Cell {
                    foreground: hex_index(fg[i])?,
                    background: hex_index(bg[i])?,
                    glyph: glyphs[i],
                });
            }
        }
    }

    let mut colors = [Rgb([0, 0, 0]); PALETTE_SIZE];
    for (c, rgb) in colors.iter_mut().zip(bytes[expected - PALETTE_LEN..].chunks_exact(3)) {
        *c = Rgb([rgb[0], rgb[1], rgb[2]]);
    }

    FrameGrid::new(header.width as u32, header.height as u32, cells, Palette::new(colors))
        .map_err(|e| JurokuError::MalformedFrame(e.to_string()))
}

fn hex_index(byte: u8) -> Result<u8> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        _ => Err(JurokuError::MalformedFrame(format!(
            "{byte:#04x} is not a color digit"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::BLANK;

    fn palette() -> Palette {
        let mut colors = [Rgb([0, 0, 0]); PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = Rgb([i as u8, 100 + i as u8, 200 + i as u8]);
        }
        Palette::new(colors)
    }

    fn grid(width: u32, height: u32) -> FrameGrid {
        let cells = (0..width * height)
            .map(|i| Cell {
                foreground: (i % 16) as u8,
                background: ((i + 5) % 16) as u8,
                glyph: BLANK + (i % 64) as u8,
            })
            .collect();
        FrameGrid::new(width, height, cells, palette()).unwrap()
    }

    #[test]
    fn layout_of_a_single_cell() {
        let cell = Cell { foreground: 10, background: 3, glyph: 0x83 };
        let grid = FrameGrid::new(1, 1, vec![cell], palette()).unwrap();
        let bytes = encode(&grid).unwrap();
        assert_eq!(bytes.len(), 55);
        assert_eq!(&bytes[..7], &[0, 1, 0, 1, b'a', b'3', 0x83]);
        assert_eq!(&bytes[7..10], &[0, 100, 200]);
        assert_eq!(&bytes[52..], &[15, 115, 215]);
    }

    #[test]
    fn rows_are_split_into_three_buffers() {
        let bytes = encode(&grid(3, 2)).unwrap();
        assert_eq!(bytes.len(), encoded_len(3, 2));
        assert_eq!(&bytes[4..7], b"012");
        assert_eq!(&bytes[7..10], b"567");
        assert_eq!(&bytes[10..13], &[0x80, 0x81, 0x82]);
        assert_eq!(&bytes[13..16], b"345");
        assert_eq!(&bytes[16..19], b"89a");
    }

    #[test]
    fn header_and_palette_survive_decoding() {
        let original = grid(5, 4);
        let bytes = encode(&original).unwrap();
        let header = FrameHeader::parse(&bytes).unwrap();
        assert_eq!(header, FrameHeader { width: 5, height: 4 });
        assert_eq!(decode(&bytes).unwrap(), original);
    }

    #[test]
    fn oversized_grid_is_a_range_error() {
        let grid = FrameGrid::new(65536, 1, vec![Cell::uniform(0); 65536], palette()).unwrap();
        assert!(matches!(
            encode(&grid),
            Err(JurokuError::Range { axis: Axis::Width, cells: 65536 })
        ));
    }

    #[test]
    fn decode_rejects_truncated_and_garbled_frames() {
        let bytes = encode(&grid(2, 2)).unwrap();
        assert!(matches!(decode(&bytes[..3]), Err(JurokuError::MalformedFrame(_))));
        assert!(matches!(decode(&bytes[..bytes.len() - 1]), Err(JurokuError::MalformedFrame(_))));

        let mut bad_digit = bytes.clone();
        bad_digit[4] = b'z';
        assert!(matches!(decode(&bad_digit), Err(JurokuError::MalformedFrame(_))));

        let mut upper_digit = bytes.clone();
        upper_digit[4] = b'A';
        assert!(matches!(decode(&upper_digit), Err(JurokuError::MalformedFrame(_))));

        let mut bad_glyph = bytes;
        bad_glyph[8] = b'A';
        assert!(matches!(decode(&bad_glyph), Err(JurokuError::MalformedFrame(_))));
    }
}
