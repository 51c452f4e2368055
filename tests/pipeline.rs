use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use juroku::{
    chunk, decode, encode, quantize, Axis, Converter, FrameHeader, JurokuError, Speed,
};

fn photo(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x ^ y) * 16) as u8;
        Rgba([r, g, b, 255])
    })
}

#[test_log::test]
fn pure_red_block_encodes_to_55_bytes() {
    let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255])));
    let grid = Converter::new().convert(&red, None).unwrap();

    assert_eq!((grid.width(), grid.height()), (1, 1));
    let cell = grid.cell(0, 0);
    assert_eq!(cell.foreground, cell.background);
    assert_eq!(grid.palette().get(cell.foreground), Some(Rgb([255, 0, 0])));
    assert_eq!(grid.palette().get(0), Some(Rgb([255, 0, 0])));

    let bytes = encode(&grid).unwrap();
    assert_eq!(bytes.len(), 4 + 3 + 48);
    assert_eq!(&bytes[..4], &[0x00, 0x01, 0x00, 0x01]);
}

#[test_log::test]
fn two_color_split_block() {
    let img = RgbaImage::from_fn(2, 3, |_, y| {
        if y == 0 {
            Rgba([0, 0, 255, 255])
        } else {
            Rgba([255, 255, 0, 255])
        }
    });
    let (palette, quantized) = quantize(&img, &img, Speed::SLOWEST, 0.0).unwrap();
    let grid = chunk(&quantized, &palette).unwrap();
    let cell = grid.cell(0, 0);

    let yellow = palette.nearest([255.0, 255.0, 0.0]);
    let blue = palette.nearest([0.0, 0.0, 255.0]);
    assert!(cell.foreground == yellow || cell.background == yellow);
    for y in 0..3 {
        for x in 0..2 {
            let expected = if y == 0 { blue } else { yellow };
            assert_eq!(cell.index_at(x, y), expected);
        }
    }
    let expected = image::RgbImage::from_fn(2, 3, |_, y| {
        if y == 0 {
            Rgb([0, 0, 255])
        } else {
            Rgb([255, 255, 0])
        }
    });
    assert_eq!(grid.render_preview(), expected);
}

#[test_log::test]
fn grid_size_is_image_size_over_block_size() {
    for (w, h) in [(2, 3), (8, 9), (40, 30)] {
        let img = DynamicImage::ImageRgba8(photo(w, h));
        let grid = Converter::new()
            .with_speed(Speed::new(6).unwrap())
            .convert(&img, None)
            .unwrap();
        assert_eq!((grid.width(), grid.height()), (w / 2, h / 3));
    }
}

#[test_log::test]
fn flat_image_previews_as_flat_fill() {
    let color = Rgba([12, 140, 77, 255]);
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 12, color));
    let grid = Converter::new().with_dither(1.0).convert(&img, None).unwrap();

    assert!(grid.cells().iter().all(|c| c.foreground == c.background));
    let preview = grid.render_preview();
    assert!(preview.pixels().all(|&p| p == Rgb([12, 140, 77])));
}

#[test_log::test]
fn bad_height_fails_before_quantizing() {
    let img = DynamicImage::ImageRgba8(photo(4, 10));
    let err = Converter::new().convert(&img, None).unwrap_err();
    assert!(matches!(
        err,
        JurokuError::Dimension { axis: Axis::Height, size: 10, block: 3 }
    ));
    assert!(err.to_string().contains("height"));
}

#[test_log::test]
fn bad_height_wins_over_bad_reference() {
    let img = DynamicImage::ImageRgba8(photo(4, 10));
    let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
    assert!(matches!(
        Converter::new().convert(&img, Some(&empty)),
        Err(JurokuError::Dimension { .. })
    ));
}

#[test_log::test]
fn empty_reference_is_reported() {
    let img = DynamicImage::ImageRgba8(photo(4, 6));
    let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
    let err = Converter::new().convert(&img, Some(&empty)).unwrap_err();
    assert!(matches!(err, JurokuError::InvalidImage { role: "reference", .. }));
}

#[test_log::test]
fn full_dither_is_reproducible() {
    let img = photo(30, 24);
    let first = quantize(&img, &img, Speed::new(2).unwrap(), 1.0).unwrap();
    let second = quantize(&img, &img, Speed::new(2).unwrap(), 1.0).unwrap();
    assert_eq!(first, second);
}

#[test_log::test]
fn undithered_mapping_ignores_pixel_order() {
    let img = photo(24, 18);
    let (palette, quantized) = quantize(&img, &img, Speed::new(5).unwrap(), 0.0).unwrap();

    // the same pixels in reverse order map to the same indices, reversed
    let mut reversed = img.clone().into_raw();
    let pixels: Vec<_> = reversed.chunks_exact(4).rev().flatten().copied().collect();
    reversed.copy_from_slice(&pixels);
    let reversed = RgbaImage::from_raw(24, 18, reversed).unwrap();
    let (_, remapped) = quantize(&img, &reversed, Speed::new(5).unwrap(), 0.0).unwrap();

    let forward: Vec<_> = quantized.indices().iter().rev().copied().collect();
    assert_eq!(remapped.indices(), forward.as_slice());
    assert!(quantized.indices().iter().all(|&i| (i as usize) < palette.colors().len()));
}

#[test_log::test]
fn separate_reference_drives_palette() {
    let primaries = [[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]];
    let reference = DynamicImage::ImageRgba8(RgbaImage::from_fn(4, 1, |x, _| {
        let [r, g, b] = primaries[x as usize];
        Rgba([r, g, b, 255])
    }));
    let target = DynamicImage::ImageRgba8(photo(8, 6));
    let grid = Converter::new().with_dither(0.0).convert(&target, Some(&reference)).unwrap();

    assert!(grid.palette().colors().iter().all(|c| primaries.contains(&c.0)));
}

#[test_log::test]
fn encoded_frame_decodes_to_the_same_grid() {
    let img = DynamicImage::ImageRgba8(photo(20, 15));
    let grid = Converter::new().convert(&img, None).unwrap();
    let bytes = encode(&grid).unwrap();

    assert_eq!(bytes.len(), 4 + 5 * 3 * 10 + 48);
    assert_eq!(FrameHeader::parse(&bytes).unwrap(), FrameHeader { width: 10, height: 5 });

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.palette(), grid.palette());
    assert_eq!(decoded, grid);
}
