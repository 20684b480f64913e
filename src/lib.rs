//! Overlay compositing and annotation rendering for face and body analysis
//! results.
//!
//! The analysis itself happens in an external engine, plugged in through
//! [`AnalysisEngine`]. This crate blends transparency-bearing overlays onto
//! the regions the engine reports, replaces backgrounds from person
//! segmentations and draws the remaining annotations, including document
//! outlines.

mod rect;
pub use rect::{Point, Rect, RectPosition};

mod error;
pub use error::{OverlayError, OverlayResult};

mod imaging;
pub use imaging::{image_view, image_view_mut, resize_area, resize_area_window};

mod compositor;
pub use compositor::{composite, composite_segment, Overlay, Placement};

mod analysis;
pub use analysis::{
    AnalysisEngine, BodySegment, Document, EulerAngle, Face, FaceOptions, FaceOptionsBuilder,
    Information, PerformanceMode, Settings, SettingsBuilder,
};

#[cfg(test)]
pub mod testing;

#[cfg(feature = "viz")]
pub mod viz;

#[cfg(feature = "viz")]
mod render;
#[cfg(feature = "viz")]
pub use render::{FpsMeter, RenderConfig, Renderer, RunType};
