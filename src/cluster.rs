//! Median-cut palette construction over a color histogram.
//!
//! The histogram is split into buckets by repeatedly cutting the bucket with
//! the largest weighted perceptual error at the weighted median of its widest
//! channel. Buckets are plain values on a worklist; splitting consumes a bucket
//! and yields two new ones. The bucket means are then refined with a few
//! rounds of k-means over the histogram.

use std::collections::BTreeMap;

use image::RgbaImage;
use log::debug;

use crate::color;

/// One distinct (possibly posterized) color and how many pixels carry it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramEntry {
    /// Exact mean of the source colors folded into this entry.
    pub color: [f32; 3],
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Histogram {
    entries: Vec<HistogramEntry>,
}

impl Histogram {
    /// Counts the RGB values of `image`, ignoring alpha. `posterize` low bits
    /// of every channel are dropped when bucketing colors together.
    pub fn from_image(image: &RgbaImage, posterize: u8) -> Self {
        let mask = 0xFFu8 << posterize.min(7);
        let mut sums: BTreeMap<[u8; 3], ([u64; 3], u32)> = BTreeMap::new();

        for px in image.pixels() {
            let [r, g, b, _] = px.0;
            let slot = sums.entry([r & mask, g & mask, b & mask]).or_default();
            slot.0[0] += r as u64;
            slot.0[1] += g as u64;
            slot.0[2] += b as u64;
            slot.1 += 1;
        }

        let entries = sums
            .into_values()
            .map(|(sum, weight)| {
                let w = weight as f64;
                HistogramEntry {
                    color: sum.map(|s| (s as f64 / w) as f32),
                    weight,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    entries: Vec<HistogramEntry>,
    mean: [f32; 3],
    weight: u64,
    /// Total weighted distance of the entries from the mean.
    error: f32,
    widest: usize,
}

impl Bucket {
    fn new(entries: Vec<HistogramEntry>) -> Self {
        let mut sum = [0f64; 3];
        let mut weight = 0u64;
        for e in &entries {
            for ch in 0..3 {
                sum[ch] += e.color[ch] as f64 * e.weight as f64;
            }
            weight += e.weight as u64;
        }
        let mean = if weight == 0 {
            [0.0; 3]
        } else {
            sum.map(|s| (s / weight as f64) as f32)
        };

        let mut spread = [0f32; 3];
        let mut error = 0f32;
        for e in &entries {
            let w = e.weight as f32;
            for (ch, s) in spread.iter_mut().enumerate() {
                *s += color::channel_distance(ch, e.color[ch], mean[ch]) * w;
            }
            error += color::distance(e.color, mean) * w;
        }

        let mut widest = 0;
        for ch in 1..3 {
            if spread[ch] > spread[widest] {
                widest = ch;
            }
        }

        Self { entries, mean, weight, error, widest }
    }

    fn can_split(&self) -> bool {
        self.entries.len() > 1
    }

    /// Cuts the bucket at the weighted median of its widest channel. Both
    /// halves are non-empty.
    fn split(mut self) -> (Bucket, Bucket) {
        let ch = self.widest;
        self.entries.sort_by(|a, b| a.color[ch].total_cmp(&b.color[ch]));

        let half = self.weight.div_ceil(2);
        let mut acc = 0u64;
        let mut at = self.entries.len() - 1;
        for (i, e) in self.entries.iter().enumerate() {
            acc += e.weight as u64;
            if acc >= half {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.entries.len() - 1);

        let upper = self.entries.split_off(at);
        (Bucket::new(self.entries), Bucket::new(upper))
    }
}

/// Splits the histogram into at most `count` buckets and returns their means.
pub fn median_cut(histogram: &Histogram, count: usize) -> Vec<[f32; 3]> {
    if histogram.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut buckets = vec![Bucket::new(histogram.entries().to_vec())];
    while buckets.len() < count {
        let Some(pos) = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.can_split())
            .max_by(|(_, a), (_, b)| a.error.total_cmp(&b.error))
            .map(|(i, _)| i)
        else {
            break;
        };

        let (lower, upper) = buckets.swap_remove(pos).split();
        buckets.push(lower);
        buckets.push(upper);
    }

    debug!("median cut produced {} buckets", buckets.len());
    buckets.into_iter().map(|b| b.mean).collect()
}

/// Lloyd iterations moving each centroid to the weighted mean of the
/// histogram entries nearest to it. Stops early once nothing moves.
pub fn refine(histogram: &Histogram, centroids: &mut [[f32; 3]], iterations: u32) {
    for round in 0..iterations {
        let mut sums = vec![([0f64; 3], 0u64); centroids.len()];
        for e in histogram.entries() {
            let slot = &mut sums[color::nearest(centroids, e.color)];
            for ch in 0..3 {
                slot.0[ch] += e.color[ch] as f64 * e.weight as f64;
            }
            slot.1 += e.weight as u64;
        }

        let mut moved = false;
        for (centroid, (sum, weight)) in centroids.iter_mut().zip(sums) {
            if weight == 0 {
                continue;
            }
            let mean = sum.map(|s| (s / weight as f64) as f32);
            if mean != *centroid {
                *centroid = mean;
                moved = true;
            }
        }

        if !moved {
            debug!("refinement settled after {} rounds", round + 1);
            break;
        }
    }
}

/// Pixel count assigned to each centroid by nearest-color lookup.
pub fn weights(histogram: &Histogram, centroids: &[[f32; 3]]) -> Vec<u64> {
    let mut weights = vec![0u64; centroids.len()];
    for e in histogram.entries() {
        weights[color::nearest(centroids, e.color)] += e.weight as u64;
    }
    weights
}
