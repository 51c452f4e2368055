//! juroku CLI - Convert an image into a 16-color character-grid frame

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use juroku::{write_frame, Converter, JurokuError, Speed};
use log::{info, warn};

#[derive(Parser)]
#[command(
    name = "juroku",
    about = "Convert an image into a 16-color character-grid frame",
    after_help = "The input image must have a width that is a multiple of 2 pixels \
                  and a height that is a multiple of 3 pixels. Images are not \
                  downscaled or cropped."
)]
struct Args {
    /// Input image file (PNG, JPEG or BMP)
    input: PathBuf,
    /// Where to write the encoded frame
    #[arg(short, long, default_value = "image.juf")]
    output: PathBuf,
    /// Image to derive the palette from (defaults to the input image)
    #[arg(short, long)]
    reference: Option<PathBuf>,
    /// Where to write the PNG preview
    #[arg(short, long, default_value = "preview.png")]
    preview: PathBuf,
    /// Processing speed (1 = slowest and best, 10 = fastest)
    #[arg(short = 'q', long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=10))]
    speed: u8,
    /// Amount of dithering (0.0 = none, 1.0 = most)
    #[arg(short, long, default_value = "0.2", value_parser = parse_dither)]
    dither: f32,
}

fn parse_dither(s: &str) -> Result<f32, String> {
    let amount: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=1.0).contains(&amount) {
        return Err(format!("dither must be between 0 and 1, got {amount}"));
    }
    Ok(amount)
}

fn main() -> Result<(), JurokuError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let start = Instant::now();

    let image = image::open(&args.input)?;
    let reference = args.reference.as_ref().map(image::open).transpose()?;
    info!("Image loaded, quantizing...");

    let converter = Converter::new()
        .with_speed(Speed::new(args.speed)?)
        .with_dither(args.dither);
    let grid = converter.convert(&image, reference.as_ref())?;

    info!("Image chunked, writing frame...");
    if let Err(e) = grid.render_preview().save(&args.preview) {
        warn!("Failed to write preview image: {}", e);
    }

    write_frame(&grid, File::create(&args.output)?)?;

    info!("Done! That took {:.2?}.", start.elapsed());
    info!(
        "Frame written to {:?}, preview written to {:?}.",
        args.output, args.preview
    );
    Ok(())
}
