use image::{Rgb, RgbImage, Rgba, RgbaImage};
use numpy::{
    ndarray::{Array3, ArrayView3},
    IntoPyArray, PyArray3, PyReadonlyArray3, PyReadwriteArray3,
};
use pyo3::{exceptions::PyValueError, prelude::*};
use rust::{OverlayError, Placement, Rect};
use face_overlay as rust;

fn value_error(err: OverlayError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_rgba(array: ArrayView3<u8>) -> PyResult<RgbaImage> {
    let (height, width, channels) = array.dim();
    if channels != 4 {
        return Err(value_error(OverlayError::InvalidOverlayFormat(format!(
            "expected 4 channels, got {}",
            channels
        ))));
    }
    Ok(RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgba([
            array[[y, x, 0]],
            array[[y, x, 1]],
            array[[y, x, 2]],
            array[[y, x, 3]],
        ])
    }))
}

/// Blends an overlay onto a region of a frame, in place.
///
/// Channel order is not interpreted: a BGR frame takes a BGRA overlay.
///
/// # Arguments
///
/// * `frame` - (height, width, 3) uint8 array, modified in place.
/// * `roi` - Target region as (x, y, width, height). The origin may be negative.
/// * `overlay` - (height, width, 4) uint8 array with alpha in the last channel.
/// * `clipped` - Blend only the visible part instead of shifting the region
///   inside the frame.
#[pyfunction]
#[pyo3(signature = (frame, roi, overlay, clipped=false))]
fn composite(
    mut frame: PyReadwriteArray3<u8>,
    roi: (i32, i32, u32, u32),
    overlay: PyReadonlyArray3<u8>,
    clipped: bool,
) -> PyResult<()> {
    let overlay = rust::Overlay::from_rgba(to_rgba(overlay.as_array())?).map_err(value_error)?;

    let mut array = frame.as_array_mut();
    let (height, width, channels) = array.dim();
    if channels != 3 {
        return Err(PyValueError::new_err(format!(
            "frame must have 3 channels, got {}",
            channels
        )));
    }
    let mut image = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([array[[y, x, 0]], array[[y, x, 1]], array[[y, x, 2]]])
    });

    let (x, y, roi_width, roi_height) = roi;
    let placement = if clipped {
        Placement::Clipped
    } else {
        Placement::Anchored
    };
    rust::composite(
        &mut image,
        Rect::at(x, y).of_size(roi_width, roi_height),
        &overlay,
        placement,
    )
    .map_err(value_error)?;

    for (x, y, pixel) in image.enumerate_pixels() {
        for channel in 0..3 {
            array[[y as usize, x as usize, channel]] = pixel.0[channel];
        }
    }
    Ok(())
}

/// Area-resizes a (height, width, 4) overlay.
#[pyfunction]
fn resize_area<'py>(
    py: Python<'py>,
    overlay: PyReadonlyArray3<u8>,
    width: u32,
    height: u32,
) -> PyResult<&'py PyArray3<u8>> {
    let resized = rust::resize_area(&to_rgba(overlay.as_array())?, width, height);
    let array = Array3::from_shape_vec((height as usize, width as usize, 4), resized.into_raw())
        .map_err(|err| value_error(err.into()))?;
    Ok(array.into_pyarray(py))
}

/// py-face-overlay is a Python binding to the face-overlay library.
#[pymodule]
fn py_face_overlay(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(composite, m)?)?;
    m.add_function(wrap_pyfunction!(resize_area, m)?)?;
    Ok(())
}
