use std::path::PathBuf;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rstest::fixture;

#[fixture]
pub fn black_frame() -> RgbImage {
    RgbImage::new(200, 200)
}

#[fixture]
pub fn gradient_frame() -> RgbImage {
    RgbImage::from_fn(200, 200, |x, y| {
        Rgb([x as u8, y as u8, ((x * 3 + y * 7) % 256) as u8])
    })
}

#[fixture]
pub fn output_dir() -> PathBuf {
    let output_path = PathBuf::from("tests/output");
    std::fs::create_dir_all(output_path.clone()).expect("Can't create output directory");
    output_path
}

/// Overlay whose alpha alternates between 0 and 255 in `block`-sized squares.
pub fn checkerboard_overlay(width: u32, height: u32, block: u32, color: [u8; 3]) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x / block + y / block) % 2 == 0 { 255 } else { 0 };
        Rgba([color[0], color[1], color[2], alpha])
    })
}
