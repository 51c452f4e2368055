//! Perceptual color distance shared by the quantizer and the chunker.

use image::Rgb;

/// Channel weights approximating the eye's sensitivity (Rec. 601 luma).
const WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Luma-weighted squared distance between two colors in 8-bit channel units.
#[inline]
pub fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    WEIGHTS[0] * dr * dr + WEIGHTS[1] * dg * dg + WEIGHTS[2] * db * db
}

/// Weighted squared spread along a single channel.
#[inline]
pub fn channel_distance(channel: usize, a: f32, b: f32) -> f32 {
    WEIGHTS[channel] * (a - b) * (a - b)
}

#[inline]
pub fn to_f32(color: Rgb<u8>) -> [f32; 3] {
    [color[0] as f32, color[1] as f32, color[2] as f32]
}

#[inline]
pub fn to_rgb(color: [f32; 3]) -> Rgb<u8> {
    Rgb(color.map(|c| c.round().clamp(0.0, 255.0) as u8))
}

/// Index of the candidate closest to `color`. Ties go to the lowest index.
pub fn nearest(candidates: &[[f32; 3]], color: [f32; 3]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &c) in candidates.iter().enumerate() {
        let dist = distance(c, color);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
