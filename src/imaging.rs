use image::{imageops, ImageBuffer, Pixel, Rgba, RgbaImage};
use itertools::iproduct;
use ndarray::{ArrayView3, ArrayViewMut3};

use crate::error::OverlayResult;

/// Views an 8-bit image as a (height, width, channels) array.
pub fn image_view<P>(image: &ImageBuffer<P, Vec<u8>>) -> OverlayResult<ArrayView3<'_, u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let shape = (height as usize, width as usize, P::CHANNEL_COUNT as usize);
    Ok(ArrayView3::from_shape(shape, &**image)?)
}

/// Mutably views an 8-bit image as a (height, width, channels) array.
pub fn image_view_mut<P>(
    image: &mut ImageBuffer<P, Vec<u8>>,
) -> OverlayResult<ArrayViewMut3<'_, u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let shape = (height as usize, width as usize, P::CHANNEL_COUNT as usize);
    Ok(ArrayViewMut3::from_shape(shape, &mut **image)?)
}

/// Rounds and saturates a blended value back to 8 bits.
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Resizes an RGBA image with area averaging.
///
/// Shrinking averages every source pixel under the output pixel's footprint,
/// weighted by how much of it is covered. An axis that grows is interpolated
/// linearly instead.
///
/// # Arguments
///
/// * `image` - Image to resize.
/// * `width` - Output width.
/// * `height` - Output height.
pub fn resize_area(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    resize_area_window(image, (width, height), (0, 0), (width, height))
}

/// Computes only a window of a `size` area resize.
///
/// The result equals the same crop of [`resize_area`]'s output, but its cost
/// depends on the window alone, so huge virtual sizes stay cheap. The window,
/// given by its top-left `offset` and `window` size, is clipped to `size`.
pub fn resize_area_window(
    image: &RgbaImage,
    size: (u32, u32),
    offset: (u32, u32),
    window: (u32, u32),
) -> RgbaImage {
    let (width, height) = size;
    let (x, y) = (offset.0.min(width), offset.1.min(height));
    let (window_width, window_height) = (window.0.min(width - x), window.1.min(height - y));
    let (src_width, src_height) = image.dimensions();
    if src_width == 0 || src_height == 0 || window_width == 0 || window_height == 0 {
        return RgbaImage::new(window_width, window_height);
    }
    if (src_width, src_height) == size {
        return imageops::crop_imm(image, x, y, window_width, window_height).to_image();
    }

    let columns = axis_weights(src_width, width, x, window_width);
    let rows = axis_weights(src_height, height, y, window_height);

    ImageBuffer::from_fn(window_width, window_height, |x, y| {
        let mut acc = [0.0f32; 4];
        for ((sy, wy), (sx, wx)) in iproduct!(&rows[y as usize], &columns[x as usize]) {
            let weight = wy * wx;
            let pixel = image.get_pixel(*sx, *sy);
            for (sum, &value) in acc.iter_mut().zip(pixel.0.iter()) {
                *sum += value as f32 * weight;
            }
        }
        Rgba(acc.map(saturate_u8))
    })
}

/// Per output index in `start..start + count`, the source indices it reads
/// and their normalized weights.
fn axis_weights(src_len: u32, dst_len: u32, start: u32, count: u32) -> Vec<Vec<(u32, f32)>> {
    (start..start + count)
        .map(|index| {
            if dst_len > src_len {
                linear_weights(src_len, dst_len, index)
            } else {
                area_weights(src_len, dst_len, index)
            }
        })
        .collect()
}

fn area_weights(src_len: u32, dst_len: u32, index: u32) -> Vec<(u32, f32)> {
    let scale = src_len as f64 / dst_len as f64;
    let start = index as f64 * scale;
    let end = (start + scale).min(src_len as f64);
    let mut weights = Vec::with_capacity(scale.ceil() as usize + 1);
    let mut cell = start.floor();
    while cell < end {
        let coverage = end.min(cell + 1.0) - start.max(cell);
        if coverage > 1e-6 {
            let source = (cell as u32).min(src_len - 1);
            weights.push((source, (coverage / scale) as f32));
        }
        cell += 1.0;
    }
    weights
}

/// Two-tap interpolation between pixel centers, clamped at the edges.
fn linear_weights(src_len: u32, dst_len: u32, index: u32) -> Vec<(u32, f32)> {
    let scale = src_len as f64 / dst_len as f64;
    let center = ((index as f64 + 0.5) * scale - 0.5).max(0.0);
    let left = (center.floor() as u32).min(src_len - 1);
    let right = (left + 1).min(src_len - 1);
    let fraction = (center - left as f64).clamp(0.0, 1.0) as f32;
    if left == right || fraction == 0.0 {
        vec![(left, 1.0)]
    } else {
        vec![(left, 1.0 - fraction), (right, fraction)]
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use rstest::rstest;

    use super::*;
    use crate::Rect;

    #[test]
    fn test_resize_area_averages_blocks() {
        let image = RgbaImage::from_fn(4, 4, |x, y| {
            let value = if (x / 2 + y / 2) % 2 == 0 { 0 } else { 200 };
            Rgba([value, value, value, 255])
        });
        let resized = resize_area(&image, 2, 2);
        assert_eq!(resized.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(resized.get_pixel(1, 0), &Rgba([200, 200, 200, 255]));
        assert_eq!(resized.get_pixel(0, 1), &Rgba([200, 200, 200, 255]));
        assert_eq!(resized.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_resize_area_fractional_coverage() {
        let image = RgbaImage::from_fn(3, 1, |x, _| {
            let value = (x * 90) as u8;
            Rgba([value, 0, 0, 255])
        });
        let resized = resize_area(&image, 2, 1);
        assert_eq!(resized.get_pixel(0, 0).0[0], 30);
        assert_eq!(resized.get_pixel(1, 0).0[0], 150);
        assert_eq!(resized.get_pixel(1, 0).0[3], 255);
    }

    #[rstest]
    #[case(20, 20, 50, 50)]
    #[case(20, 20, 10, 10)]
    #[case(20, 20, 30, 8)]
    #[case(7, 13, 7, 13)]
    fn test_resize_area_uniform_stays_uniform(
        #[case] src_width: u32,
        #[case] src_height: u32,
        #[case] width: u32,
        #[case] height: u32,
    ) {
        let color = Rgba([255, 0, 0, 255]);
        let image = RgbaImage::from_pixel(src_width, src_height, color);
        let resized = resize_area(&image, width, height);
        assert_eq!(resized.dimensions(), (width, height));
        assert!(resized.pixels().all(|pixel| *pixel == color));
    }

    #[rstest]
    #[case(17, 5, 0, 5)]
    #[case(5, 17, 0, 17)]
    #[case(4, u32::MAX, u32::MAX - 64, 64)]
    #[case(4, 4_000_000_000, 1_999_999_990, 20)]
    fn test_axis_weights_sum_to_one(
        #[case] src_len: u32,
        #[case] dst_len: u32,
        #[case] start: u32,
        #[case] count: u32,
    ) {
        let weights = axis_weights(src_len, dst_len, start, count);
        assert_eq!(weights.len(), count as usize);
        for weights in weights {
            assert!(weights.iter().all(|(source, _)| *source < src_len));
            let total: f32 = weights.iter().map(|(_, weight)| weight).sum();
            assert!((total - 1.0).abs() < 1e-5);
        }
    }

    #[rstest]
    #[case(9, 7, 30, 40, Rect::at(5, 11).of_size(12, 20))]
    #[case(40, 30, 13, 9, Rect::at(2, 3).of_size(8, 4))]
    #[case(16, 16, 16, 16, Rect::at(4, 4).of_size(8, 8))]
    #[case(16, 16, 50, 5, Rect::at(40, 0).of_size(30, 30))]
    fn test_window_matches_crop_of_full_resize(
        #[case] src_width: u32,
        #[case] src_height: u32,
        #[case] width: u32,
        #[case] height: u32,
        #[case] window: Rect,
    ) {
        let image = RgbaImage::from_fn(src_width, src_height, |x, y| {
            Rgba([(x * 17) as u8, (y * 23) as u8, ((x * y) % 256) as u8, (x * 31 + y) as u8])
        });
        let full = resize_area(&image, width, height);
        let clipped = window.clip_to(width, height).unwrap();

        let part = resize_area_window(
            &image,
            (width, height),
            (window.x as u32, window.y as u32),
            (window.width, window.height),
        );

        assert_eq!(part.dimensions(), (clipped.width, clipped.height));
        for (x, y, pixel) in part.enumerate_pixels() {
            let expected = full.get_pixel(x + clipped.x as u32, y + clipped.y as u32);
            assert_eq!(pixel, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_window_of_huge_resize_is_bounded() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let size = (u32::MAX, u32::MAX);

        let part = resize_area_window(&image, size, (4_000_000_000, 2_000_000), (3, 2));

        assert_eq!(part.dimensions(), (3, 2));
        assert!(part.pixels().all(|pixel| *pixel == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_image_view_layout() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([1, 2, 3]));
        {
            let view = image_view(&image).unwrap();
            assert_eq!(view.dim(), (2, 3, 3));
            assert_eq!(view[[1, 2, 2]], 3);
        }
        let mut view = image_view_mut(&mut image).unwrap();
        view[[0, 1, 0]] = 9;
        assert_eq!(image.get_pixel(1, 0), &Rgb([9, 0, 0]));
    }
}
