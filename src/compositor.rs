use std::path::Path;

use image::{
    imageops::{self, FilterType},
    DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage,
};
use log::debug;
use ndarray::{s, Axis, Zip};

use crate::{
    error::{OverlayError, OverlayResult},
    imaging::{image_view, image_view_mut, resize_area, resize_area_window, saturate_u8},
    Rect,
};

/// Overlay template with a transparency channel.
///
/// The template is never modified; every composite works on a resized copy.
#[derive(Debug, Clone)]
pub struct Overlay {
    image: RgbaImage,
}

impl Overlay {
    /// Loads an overlay from an image file. The file must carry an alpha channel.
    pub fn open<P: AsRef<Path>>(path: P) -> OverlayResult<Self> {
        let image = image::open(path.as_ref())?;
        let (width, height) = image.dimensions();
        debug!(
            "Loaded overlay {} ({}x{}, {:?})",
            path.as_ref().display(),
            width,
            height,
            image.color()
        );
        Self::from_dynamic(image)
    }

    /// Wraps a decoded image, rejecting layouts without alpha.
    pub fn from_dynamic(image: DynamicImage) -> OverlayResult<Self> {
        if !image.color().has_alpha() {
            return Err(OverlayError::InvalidOverlayFormat(format!(
                "{:?} has no alpha channel",
                image.color()
            )));
        }
        Self::from_rgba(image.into_rgba8())
    }

    pub fn from_rgba(image: RgbaImage) -> OverlayResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::InvalidOverlayFormat(
                "overlay is empty".to_string(),
            ));
        }
        Ok(Self { image })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Area-resized copy of the template.
    pub fn resized(&self, width: u32, height: u32) -> RgbaImage {
        resize_area(&self.image, width, height)
    }

    /// Window of the template resized to `width` x `height`, starting at
    /// `offset` and covering `window` pixels.
    pub fn resized_window(
        &self,
        width: u32,
        height: u32,
        offset: (u32, u32),
        window: (u32, u32),
    ) -> RgbaImage {
        resize_area_window(&self.image, (width, height), offset, window)
    }
}

/// How a region that is partially outside the frame is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Negative origins snap to zero while the declared extent is kept, so
    /// the block shifts inward. A block that then runs past the far edge is
    /// rejected with [`OverlayError::OutOfBoundsRegion`].
    #[default]
    Anchored,
    /// The overlay keeps its declared position and only the part that lands
    /// inside the frame is blended.
    Clipped,
}

/// Destination rectangle in the frame plus the matching offset into the
/// overlay resized to the full region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    target: Rect,
    source_x: u32,
    source_y: u32,
}

impl Placement {
    fn resolve(&self, roi: Rect, width: u32, height: u32) -> OverlayResult<Option<Span>> {
        match self {
            Placement::Anchored => {
                let target = roi.clamp_origin();
                if !target.fits_within(width, height) {
                    return Err(OverlayError::OutOfBoundsRegion {
                        region: target,
                        width,
                        height,
                    });
                }
                Ok(Some(Span {
                    target,
                    source_x: 0,
                    source_y: 0,
                }))
            }
            Placement::Clipped => Ok(roi.clip_to(width, height).map(|target| Span {
                target,
                source_x: (target.x as i64 - roi.x as i64) as u32,
                source_y: (target.y as i64 - roi.y as i64) as u32,
            })),
        }
    }
}

/// Blends an overlay onto a region of the frame.
///
/// The overlay is area-resized to the region's declared size, then every
/// color channel in the region becomes `overlay * alpha + frame * (1 - alpha)`
/// with `alpha` the overlay's transparency scaled to [0, 1]. The overlay's
/// alpha channel itself is not written.
///
/// A region with zero width or height leaves the frame untouched. Placement
/// is validated before any pixel is written, so an error leaves the frame
/// unmodified.
///
/// # Arguments
///
/// * `frame` - Frame to draw on.
/// * `roi` - Target region, usually a face bounding box.
/// * `overlay` - Overlay template.
/// * `placement` - Policy for regions crossing the frame border.
pub fn composite(
    frame: &mut RgbImage,
    roi: Rect,
    overlay: &Overlay,
    placement: Placement,
) -> OverlayResult<()> {
    if roi.is_empty() {
        debug!("Skipping degenerate region {}", roi);
        return Ok(());
    }

    let (width, height) = frame.dimensions();
    let Some(span) = placement.resolve(roi, width, height)? else {
        debug!("Region {} is outside the {}x{} frame", roi, width, height);
        return Ok(());
    };

    // Only the visible window is resampled, however large the region.
    let resized = overlay.resized_window(
        roi.width,
        roi.height,
        (span.source_x, span.source_y),
        (span.target.width, span.target.height),
    );
    blend(frame, &resized, span.target)
}

fn blend(frame: &mut RgbImage, overlay: &RgbaImage, target: Rect) -> OverlayResult<()> {
    let (x, y) = (target.x as usize, target.y as usize);
    let (width, height) = (target.width as usize, target.height as usize);

    let source = image_view(overlay)?;
    let mut frame = image_view_mut(frame)?;
    let mut region = frame.slice_mut(s![y..y + height, x..x + width, ..]);

    Zip::from(region.lanes_mut(Axis(2)))
        .and(source.lanes(Axis(2)))
        .for_each(|mut pixel, color| {
            let alpha = color[3] as f32 / 255.0;
            let alpha_inv = 1.0 - alpha;
            for channel in 0..3 {
                let value = color[channel] as f32 * alpha + pixel[channel] as f32 * alpha_inv;
                pixel[channel] = saturate_u8(value);
            }
        });

    Ok(())
}

/// Replaces everything outside a person segmentation with a background.
///
/// Each pixel becomes `frame * alpha + background * (1 - alpha)` where
/// `alpha` is the mask value scaled to [0, 1]. The background is resized to
/// the frame when the sizes differ. An empty mask leaves the frame untouched.
///
/// # Arguments
///
/// * `frame` - Frame to draw on.
/// * `segment` - Single channel mask with the frame's dimensions.
/// * `background` - Replacement background.
pub fn composite_segment(
    frame: &mut RgbImage,
    segment: &GrayImage,
    background: &RgbImage,
) -> OverlayResult<()> {
    if segment.width() == 0 || segment.height() == 0 {
        return Ok(());
    }

    let dimensions = frame.dimensions();
    if segment.dimensions() != dimensions {
        return Err(OverlayError::DimensionMismatch {
            expected: dimensions,
            actual: segment.dimensions(),
        });
    }
    if background.width() == 0 || background.height() == 0 {
        return Err(OverlayError::ImageError("background is empty".to_string()));
    }

    let resized;
    let background = if background.dimensions() == dimensions {
        background
    } else {
        debug!(
            "Resizing background from {:?} to {:?}",
            background.dimensions(),
            dimensions
        );
        resized = imageops::resize(background, dimensions.0, dimensions.1, FilterType::Triangle);
        &resized
    };

    let mask = image_view(segment)?;
    let background = image_view(background)?;
    let mut frame = image_view_mut(frame)?;

    Zip::from(frame.lanes_mut(Axis(2)))
        .and(mask.lanes(Axis(2)))
        .and(background.lanes(Axis(2)))
        .for_each(|mut pixel, mask, back| {
            let alpha = mask[0] as f32 / 255.0;
            let alpha_inv = 1.0 - alpha;
            for channel in 0..3 {
                let value = pixel[channel] as f32 * alpha + back[channel] as f32 * alpha_inv;
                pixel[channel] = saturate_u8(value);
            }
        });

    Ok(())
}
