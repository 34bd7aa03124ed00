//! Raster forensics against real encoded images

#![cfg(feature = "imaging")]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use kycguard_core::{Assessment, SignalEntry, SignalName};
use kycguard_fraud::{
    ForensicsSignals, ImageForensics, RasterForensics, Thresholds, Weights,
};

fn encode(img: GrayImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

fn checkerboard() -> GrayImage {
    GrayImage::from_fn(64, 64, |x, y| {
        if ((x / 8) + (y / 8)) % 2 == 1 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Insert a minimal APP1 Exif segment right after SOI
fn with_exif(jpeg: Vec<u8>) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    // little-endian TIFF header, one empty IFD
    payload.extend_from_slice(&[b'I', b'I', 42, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    let len = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn signals() -> ForensicsSignals {
    ForensicsSignals::new(
        Arc::new(RasterForensics::new()),
        Weights::default(),
        Thresholds::default(),
    )
}

#[test]
fn test_sharp_png_without_exif() {
    let bytes = encode(checkerboard(), ImageFormat::Png);
    let report = RasterForensics::new().inspect(&bytes);

    let manipulation = report.manipulation.assessed().unwrap();
    assert!(manipulation.decodable);
    assert!(!manipulation.exif_present);
    assert!(manipulation.suspected);

    let variance = *report.blur_variance.assessed().unwrap();
    assert!(variance > 1000.0, "variance {}", variance);

    let outcome = signals().evaluate(&bytes);
    assert_eq!(outcome.penalty(), 10);
    assert_eq!(
        outcome.reasons(),
        &["Image metadata missing or manipulation suspected".to_string()]
    );
}

#[test]
fn test_flat_image_is_blurry() {
    let bytes = encode(GrayImage::from_pixel(48, 48, Luma([128])), ImageFormat::Png);
    let outcome = signals().evaluate(&bytes);

    assert!(outcome
        .reasons()
        .contains(&"Image appears blurry (laplacian variance=0.0)".to_string()));
}

#[test]
fn test_small_document_is_cropped() {
    let img = GrayImage::from_fn(100, 100, |x, y| {
        if (30..70).contains(&x) && (30..70).contains(&y) {
            Luma([240])
        } else {
            Luma([10])
        }
    });
    let bytes = encode(img, ImageFormat::Png);
    let outcome = signals().evaluate(&bytes);

    assert!(outcome
        .reasons()
        .contains(&"Image appears cropped or has large margins (bbox_ratio=0.16)".to_string()));
    let crop = outcome
        .entries()
        .iter()
        .find(|e| e.name() == SignalName::Crop)
        .unwrap();
    assert!(matches!(
        crop,
        SignalEntry::Crop { result: Assessment::Assessed(c) } if c.cropped
    ));
}

#[test]
fn test_outlined_document_is_not_cropped() {
    // Card border with a photo block inside it
    let img = GrayImage::from_fn(100, 100, |x, y| {
        let border = ((x == 5 || x == 94) && (5..95).contains(&y))
            || ((y == 5 || y == 94) && (5..95).contains(&x));
        let photo = (40..65).contains(&x) && (40..65).contains(&y);
        if border || photo {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let bytes = encode(img, ImageFormat::Png);
    let outcome = signals().evaluate(&bytes);

    assert!(!outcome
        .reasons()
        .iter()
        .any(|r| r.starts_with("Image appears cropped")));
    let crop = outcome
        .entries()
        .iter()
        .find(|e| e.name() == SignalName::Crop)
        .unwrap();
    assert!(matches!(
        crop,
        SignalEntry::Crop { result: Assessment::Assessed(c) } if !c.cropped
    ));
}

#[test]
fn test_jpeg_with_exif_is_not_suspected() {
    let bytes = with_exif(encode(checkerboard(), ImageFormat::Jpeg));
    let report = RasterForensics::new().inspect(&bytes);

    let manipulation = report.manipulation.assessed().unwrap();
    assert!(manipulation.decodable);
    assert!(manipulation.exif_present);
    assert!(!manipulation.suspected);
}
