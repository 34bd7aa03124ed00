//! Raster measurements on decoded images
//!
//! Sharpness is the variance of the Laplacian after a 3x3 Gaussian pass.
//! Fill is the bounding box of the largest outer Otsu-foreground region over
//! the image area. Borders reflect without repeating the edge pixel.

use std::collections::VecDeque;
use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageDecoder, ImageReader};
use tracing::debug;

use kycguard_core::{Assessment, ManipulationCheck};

use crate::forensics::{ForensicReport, ImageForensics};

/// Forensics backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterForensics;

impl RasterForensics {
    pub fn new() -> Self {
        Self
    }
}

struct Decoded {
    gray: GrayImage,
    exif_present: bool,
}

fn decode(bytes: &[u8]) -> Result<Decoded, String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    let mut decoder = reader.into_decoder().map_err(|e| e.to_string())?;
    let exif_present = matches!(decoder.exif_metadata(), Ok(Some(data)) if !data.is_empty());
    let image = DynamicImage::from_decoder(decoder).map_err(|e| e.to_string())?;

    Ok(Decoded {
        gray: image.to_luma8(),
        exif_present,
    })
}

impl ImageForensics for RasterForensics {
    fn inspect(&self, bytes: &[u8]) -> ForensicReport {
        let decoded = match decode(bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "Image could not be decoded");
                return ForensicReport::undecodable();
            }
        };

        let manipulation = ManipulationCheck {
            decodable: true,
            exif_present: decoded.exif_present,
            suspected: !decoded.exif_present,
        };

        let crop_ratio = match bounding_box_ratio(&decoded.gray) {
            Some(ratio) => Assessment::Assessed(ratio),
            None => Assessment::Invalid("no foreground region".to_string()),
        };

        ForensicReport {
            manipulation: Assessment::Assessed(manipulation),
            blur_variance: Assessment::Assessed(laplacian_variance(&decoded.gray)),
            crop_ratio,
        }
    }
}

fn reflect(i: i64, n: usize) -> usize {
    let n = n as i64;
    if n == 1 {
        return 0;
    }
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    r.clamp(0, n - 1) as usize
}

fn gaussian_3x3(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    const K: [u32; 3] = [1, 2, 1];
    let mut out = vec![0u8; pixels.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for (ky, dy) in (-1i64..=1).enumerate() {
                let sy = reflect(y as i64 + dy, height);
                for (kx, dx) in (-1i64..=1).enumerate() {
                    let sx = reflect(x as i64 + dx, width);
                    sum += K[ky] * K[kx] * pixels[sy * width + sx] as u32;
                }
            }
            out[y * width + x] = ((sum + 8) / 16) as u8;
        }
    }
    out
}

/// Higher is sharper
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width == 0 || height == 0 {
        return 0.0;
    }
    let smoothed = gaussian_3x3(gray.as_raw(), width, height);
    let at = |x: i64, y: i64| smoothed[reflect(y, height) * width + reflect(x, width)] as f64;

    let mut values = Vec::with_capacity(width * height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            values.push(at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y));
        }
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Threshold maximizing between-class variance; foreground is `> t`
pub fn otsu_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }

    let total = pixels.len() as f64;
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut background = 0.0;
    let mut background_sum = 0.0;
    let mut best = (0u8, -1.0f64);
    for (t, &count) in histogram.iter().enumerate() {
        background += count as f64;
        if background == 0.0 {
            continue;
        }
        let foreground = total - background;
        if foreground == 0.0 {
            break;
        }
        background_sum += t as f64 * count as f64;
        let mean_b = background_sum / background;
        let mean_f = (weighted_sum - background_sum) / foreground;
        let between = background * foreground * (mean_b - mean_f).powi(2);
        if between > best.1 {
            best = (t as u8, between);
        }
    }
    best.0
}

/// Background 4-connected to the image border
fn outside_background(foreground: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut outside = vec![false; foreground.len()];
    let mut queue = VecDeque::new();

    let border = (0..width)
        .flat_map(|x| [x, (height - 1) * width + x])
        .chain((0..height).flat_map(|y| [y * width, y * width + width - 1]));
    for idx in border {
        if !foreground[idx] && !outside[idx] {
            outside[idx] = true;
            queue.push_back(idx);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx % width, idx / width);
        let neighbours = [
            (x > 0).then(|| idx - 1),
            (x + 1 < width).then(|| idx + 1),
            (y > 0).then(|| idx - width),
            (y + 1 < height).then(|| idx + width),
        ];
        for n in neighbours.into_iter().flatten() {
            if !foreground[n] && !outside[n] {
                outside[n] = true;
                queue.push_back(n);
            }
        }
    }
    outside
}

/// Bounding-box area of the largest outer foreground region over the image area
///
/// Only outermost regions compete. Holes, and anything drawn inside them,
/// belong to the region that encloses them and count toward its area.
pub fn bounding_box_ratio(gray: &GrayImage) -> Option<f64> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width == 0 || height == 0 {
        return None;
    }
    let pixels = gray.as_raw();
    let threshold = otsu_threshold(pixels);
    let foreground: Vec<bool> = pixels.iter().map(|&p| p > threshold).collect();
    let outside = outside_background(&foreground, width, height);

    let mut visited = vec![false; foreground.len()];
    let mut best: Option<(usize, usize)> = None; // (enclosed area, bbox area)
    let mut queue = VecDeque::new();

    for start in 0..foreground.len() {
        if !foreground[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (width, height, 0, 0);
        let mut enclosed = 0usize;
        while let Some(idx) = queue.pop_front() {
            let (x, y) = (idx % width, idx / width);
            enclosed += 1;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let n = ny * width + nx;
                    if !outside[n] && !visited[n] {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                }
            }
        }

        let area = (max_x - min_x + 1) * (max_y - min_y + 1);
        if best.map_or(true, |(e, _)| enclosed > e) {
            best = Some((enclosed, area));
        }
    }

    best.map(|(_, area)| area as f64 / (width * height) as f64)
}
