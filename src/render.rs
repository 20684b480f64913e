use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};
use log::{debug, warn};

use crate::{
    compositor::{composite, composite_segment, Overlay, Placement},
    error::OverlayResult,
    viz::{
        draw_bounding_box, draw_contour, draw_document, draw_spoof, face_labels, fps_label,
        similarity_label, Label, COLOR_GREEN, COLOR_RED,
    },
    AnalysisEngine, FaceOptions, Information,
};

/// Per-frame rendering configuration.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub options: FaceOptions,
    pub placement: Placement,
    pub box_color: Rgb<u8>,
    pub contour_color: Rgb<u8>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            options: FaceOptions::default(),
            placement: Placement::default(),
            box_color: COLOR_RED,
            contour_color: COLOR_GREEN,
        }
    }
}

/// Which analysis to run on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RunType {
    /// Replace the background around people.
    Body,
    /// Annotate faces and composite the overlay onto each one.
    #[default]
    Face,
    /// Outline the document in the frame.
    Ocr,
}

/// Exponential moving average of frames per second.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    fps: f32,
    smoothing: f32,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(0.9)
    }
}

impl FpsMeter {
    /// `smoothing` is the weight kept from the previous average, in [0, 1).
    pub fn new(smoothing: f32) -> Self {
        Self {
            fps: 0.0,
            smoothing: smoothing.clamp(0.0, 0.999),
        }
    }

    /// Folds one frame duration into the average and returns it.
    pub fn record(&mut self, elapsed: Duration) -> f32 {
        let seconds = elapsed.as_secs_f32();
        if seconds <= 0.0 {
            return self.fps;
        }

        let instant = 1.0 / seconds;
        self.fps = if self.fps == 0.0 {
            instant
        } else {
            self.fps * self.smoothing + instant * (1.0 - self.smoothing)
        };
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Runs an analysis engine on frames and draws its results.
pub struct Renderer<E: AnalysisEngine> {
    engine: E,
    config: RenderConfig,
    overlay: Option<Overlay>,
    background: Option<RgbImage>,
    meter: FpsMeter,
}

impl<E: AnalysisEngine> Renderer<E> {
    pub fn new(engine: E, config: RenderConfig) -> Self {
        Self {
            engine,
            config,
            overlay: None,
            background: None,
            meter: FpsMeter::default(),
        }
    }

    /// Composites `overlay` onto every detected face.
    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Background used in [`RunType::Body`] mode.
    pub fn with_background(mut self, background: RgbImage) -> Self {
        self.background = Some(background);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn fps(&self) -> f32 {
        self.meter.fps()
    }

    /// Analyzes and annotates one frame in place.
    ///
    /// Engine failures are returned. A composite that fails for a single face
    /// is logged and skipped so the remaining faces are still drawn.
    ///
    /// # Returns
    ///
    /// * `Vec<Label>` - Text annotations for the caller to rasterize, ending
    ///   with the frame rate. Face runs start with the similarity of the two
    ///   faces, or zero unless exactly two were found.
    pub fn render(&mut self, frame: &mut RgbImage, run_type: RunType) -> OverlayResult<Vec<Label>> {
        let started = Instant::now();
        let mut labels = match run_type {
            RunType::Face => self.render_faces(frame)?,
            RunType::Body => {
                self.render_body(frame)?;
                Vec::new()
            }
            RunType::Ocr => {
                self.render_document(frame)?;
                Vec::new()
            }
        };

        let fps = self.meter.record(started.elapsed());
        labels.push(fps_label(fps, frame.height()));
        Ok(labels)
    }

    fn render_faces(&mut self, frame: &mut RgbImage) -> OverlayResult<Vec<Label>> {
        let faces = self.engine.detect_faces(frame, &self.config.options)?;
        debug!("Detected {} faces", faces.len());

        let similarity = match faces.as_slice() {
            [first, second] => self.engine.face_similarity(first, second)?,
            _ => 0.0,
        };
        let mut labels = vec![similarity_label(similarity)];

        let information = self.config.options.information;
        let placement = self.config.placement;
        for face in &faces {
            draw_bounding_box(frame, face.bounding_box, self.config.box_color, 2);

            if let Some(overlay) = &self.overlay {
                if let Err(err) = composite(frame, face.bounding_box, overlay, placement) {
                    warn!("Skipping overlay at {}: {}", face.bounding_box, err);
                }
            }

            if information.contains(Information::CONTOURS) {
                draw_contour(frame, &face.contour, self.config.contour_color);
            }
            if information.contains(Information::SPOOFS) {
                draw_spoof(frame, face);
            }
            labels.extend(face_labels(face, information));
        }

        Ok(labels)
    }

    fn render_document(&mut self, frame: &mut RgbImage) -> OverlayResult<()> {
        let document = self.engine.recognize_document(frame)?;
        debug!("Document outline {:?}", document.clockwise_points);
        draw_document(frame, &document.clockwise_points, self.config.box_color, 2);
        Ok(())
    }

    fn render_body(&mut self, frame: &mut RgbImage) -> OverlayResult<()> {
        let Some(background) = &self.background else {
            warn!("No background configured, skipping body segmentation");
            return Ok(());
        };

        let segment = self.engine.segment_body(frame)?;
        if let Err(err) = composite_segment(frame, &segment.mask, background) {
            warn!("Skipping segmentation composite: {}", err);
        }
        Ok(())
    }
}
