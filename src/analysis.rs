use std::ops::{BitOr, BitOrAssign};

use image::{GrayImage, RgbImage};

use crate::{
    error::{OverlayError, OverlayResult},
    Point, Rect,
};

/// Accuracy/speed trade-off requested from the analysis engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PerformanceMode {
    /// Fastest detection with a reduced landmark set.
    Fast,
    /// 98-point contours.
    Accurate98,
    /// 106-point contours.
    #[default]
    Accurate106,
}

/// Engine-wide settings, resolved once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub number_of_threads: usize,
    pub performance_mode: PerformanceMode,
    /// Run the expensive per-face estimators every N frames.
    pub intermittent_information_ratio: u32,
}

/// Builder for [`Settings`].
#[derive(Clone, Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings {
                number_of_threads: 4,
                performance_mode: PerformanceMode::default(),
                intermittent_information_ratio: 1,
            },
        }
    }

    /// Sets the number of inference threads.
    pub fn number_of_threads(mut self, threads: usize) -> Self {
        self.settings.number_of_threads = threads;
        self
    }

    /// Sets the performance mode.
    pub fn performance_mode(mut self, mode: PerformanceMode) -> Self {
        self.settings.performance_mode = mode;
        self
    }

    /// Sets how often the intermittent estimators run.
    pub fn intermittent_information_ratio(mut self, ratio: u32) -> Self {
        self.settings.intermittent_information_ratio = ratio;
        self
    }

    /// Validates and builds the settings.
    pub fn build(self) -> OverlayResult<Settings> {
        if self.settings.number_of_threads == 0 {
            return Err(OverlayError::InvalidSettings(
                "number of threads must be positive".to_string(),
            ));
        }
        if self.settings.intermittent_information_ratio == 0 {
            return Err(OverlayError::InvalidSettings(
                "intermittent information ratio must be positive".to_string(),
            ));
        }
        Ok(self.settings)
    }
}

/// Set of per-face attributes to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Information(u32);

impl Information {
    pub const BOUNDING_BOXES: Information = Information(1);
    pub const CONTOURS: Information = Information(1 << 1);
    pub const EULER_ANGLES: Information = Information(1 << 2);
    pub const MASKS: Information = Information(1 << 3);
    pub const TRACKING_IDS: Information = Information(1 << 4);
    pub const SPOOFS: Information = Information(1 << 5);

    pub const fn empty() -> Self {
        Information(0)
    }

    pub const fn all() -> Self {
        Information(0b11_1111)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True when every flag of `other` is set.
    pub const fn contains(&self, other: Information) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Information {
    type Output = Information;

    fn bitor(self, rhs: Information) -> Information {
        Information(self.0 | rhs.0)
    }
}

impl BitOrAssign for Information {
    fn bitor_assign(&mut self, rhs: Information) {
        self.0 |= rhs.0;
    }
}

/// Per-call face analysis options.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceOptions {
    /// Minimum detector confidence, in [0, 1].
    pub bounding_box_threshold: f32,
    pub information: Information,
    /// Smallest face to report, as a fraction of the shorter frame side.
    pub minimum_bounding_box_size: f32,
    /// Frames whose longer side exceeds this are downscaled before detection.
    pub resize_threshold: u32,
    pub smoothing_contour: bool,
    pub smoothing_rect: bool,
}

/// Builder for [`FaceOptions`].
#[derive(Clone, Debug)]
pub struct FaceOptionsBuilder {
    options: FaceOptions,
}

impl Default for FaceOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: FaceOptions {
                bounding_box_threshold: 0.7,
                information: Information::BOUNDING_BOXES,
                minimum_bounding_box_size: 0.1,
                resize_threshold: 320,
                smoothing_contour: true,
                smoothing_rect: false,
            },
        }
    }

    pub fn bounding_box_threshold(mut self, threshold: f32) -> Self {
        self.options.bounding_box_threshold = threshold;
        self
    }

    /// Selects the attributes to compute. Bounding boxes are always reported.
    pub fn information_to_obtain(mut self, information: Information) -> Self {
        self.options.information = information | Information::BOUNDING_BOXES;
        self
    }

    pub fn minimum_bounding_box_size(mut self, size: f32) -> Self {
        self.options.minimum_bounding_box_size = size;
        self
    }

    pub fn resize_threshold(mut self, threshold: u32) -> Self {
        self.options.resize_threshold = threshold;
        self
    }

    pub fn smoothing_contour(mut self, enabled: bool) -> Self {
        self.options.smoothing_contour = enabled;
        self
    }

    pub fn smoothing_rect(mut self, enabled: bool) -> Self {
        self.options.smoothing_rect = enabled;
        self
    }

    /// Validates and builds the options.
    pub fn build(self) -> OverlayResult<FaceOptions> {
        let options = self.options;
        if !(0.0..=1.0).contains(&options.bounding_box_threshold) {
            return Err(OverlayError::InvalidSettings(format!(
                "bounding box threshold {} is outside [0, 1]",
                options.bounding_box_threshold
            )));
        }
        if !(0.0..=1.0).contains(&options.minimum_bounding_box_size) {
            return Err(OverlayError::InvalidSettings(format!(
                "minimum bounding box size {} is outside [0, 1]",
                options.minimum_bounding_box_size
            )));
        }
        Ok(options)
    }
}

impl Default for FaceOptions {
    fn default() -> Self {
        FaceOptionsBuilder::new().options
    }
}

/// Head pose in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct EulerAngle {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A face reported by the analysis engine. Fields not requested through
/// [`Information`] hold their default values.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Face {
    pub bounding_box: Rect,
    pub contour: Vec<Point>,
    pub euler_angle: EulerAngle,
    pub mask: bool,
    pub spoof: bool,
    pub tracking_id: u32,
}

/// Person segmentation for one frame; mask values are 0 (background) to 255
/// (person).
#[derive(Clone, Debug)]
pub struct BodySegment {
    pub mask: GrayImage,
}

/// A document found in a frame, as its corners in clockwise order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Document {
    pub clockwise_points: Vec<Point>,
}

/// Face, body and document analysis backend.
///
/// Implemented by bindings to the native analysis SDK; the crate itself only
/// consumes results.
pub trait AnalysisEngine {
    fn detect_faces(&mut self, frame: &RgbImage, options: &FaceOptions)
        -> OverlayResult<Vec<Face>>;

    fn segment_body(&mut self, frame: &RgbImage) -> OverlayResult<BodySegment>;

    /// Locates the document outline in the frame.
    fn recognize_document(&mut self, frame: &RgbImage) -> OverlayResult<Document>;

    /// Cosine similarity of two faces detected in the same frame.
    fn face_similarity(&mut self, first: &Face, second: &Face) -> OverlayResult<f32>;
}
