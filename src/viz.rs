use image::{GenericImage, Rgb};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use itertools::iproduct;

use crate::{Face, Information, Point, Rect};

pub const COLOR_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const COLOR_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const COLOR_BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Vertical distance between stacked labels.
pub const LINE_HEIGHT: i32 = 18;

impl From<Rect> for imageproc::rect::Rect {
    fn from(rect: Rect) -> Self {
        imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width, rect.height)
    }
}

/// A line of text and where its baseline starts. Rasterizing text needs a
/// font, which is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub origin: Point,
}

impl Label {
    pub fn new(text: impl Into<String>, origin: Point) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// Draws a rectangle outline `thickness` pixels wide, centered on the
/// rectangle's edges.
pub fn draw_bounding_box<I>(image: &mut I, rect: Rect, color: Rgb<u8>, thickness: u32)
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    if rect.is_empty() {
        return;
    }

    let half = thickness as i32 / 2;
    for step in 0..thickness as i32 {
        let inset = step - half;
        let width = rect.width as i64 - 2 * inset as i64;
        let height = rect.height as i64 - 2 * inset as i64;
        if width <= 0 || height <= 0 {
            break;
        }
        let ring = Rect::at(rect.x.saturating_add(inset), rect.y.saturating_add(inset))
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, ring.into(), color);
    }
}

/// Draws each contour point as a small circle.
pub fn draw_contour<I>(image: &mut I, points: &[Point], color: Rgb<u8>)
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    for point in points {
        draw_hollow_circle_mut(image, (point.x, point.y), 1, color);
    }
}

/// Draws the closed outline through `points` with a square brush
/// `thickness` pixels wide. Fewer than two points draw nothing.
pub fn draw_document<I>(image: &mut I, points: &[Point], color: Rgb<u8>, thickness: u32)
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    if points.len() < 2 {
        return;
    }

    let half = thickness as i32 / 2;
    let steps = -half..thickness as i32 - half;
    let closing = points.iter().skip(1).chain(points.first());
    for (start, end) in points.iter().zip(closing) {
        for (dx, dy) in iproduct!(steps.clone(), steps.clone()) {
            let (from, to) = (start.offset(dx, dy), end.offset(dx, dy));
            draw_line_segment_mut(
                image,
                (from.x as f32, from.y as f32),
                (to.x as f32, to.y as f32),
                color,
            );
        }
    }
}

/// Highlights a face flagged as a spoof.
pub fn draw_spoof<I>(image: &mut I, face: &Face)
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    if face.spoof {
        draw_bounding_box(image, face.bounding_box, COLOR_BLUE, 3);
    }
}

/// Draws faces on the image.
pub fn draw_faces<I>(image: &mut I, faces: &[Face])
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    for face in faces {
        draw_bounding_box(image, face.bounding_box, COLOR_RED, 2);
    }
}

/// Text annotations for the requested face attributes.
pub fn face_labels(face: &Face, information: Information) -> Vec<Label> {
    let origin = face.bounding_box.origin();
    let mut labels = Vec::new();

    if information.contains(Information::TRACKING_IDS) {
        labels.push(Label::new(format!("id={}", face.tracking_id), origin));
    }
    if information.contains(Information::MASKS) {
        labels.push(Label::new(
            format!("mask={}", yes_no(face.mask)),
            origin.offset(0, -LINE_HEIGHT),
        ));
    }
    if information.contains(Information::SPOOFS) {
        labels.push(Label::new(
            format!("spoof={}", yes_no(face.spoof)),
            origin.offset(0, -2 * LINE_HEIGHT),
        ));
    }
    if information.contains(Information::EULER_ANGLES) {
        let angle = face.euler_angle;
        labels.push(Label::new(
            format!(
                "euler angle: x={:+.2} y={:+.2} z={:+.2}",
                angle.x, angle.y, angle.z
            ),
            text_line(2),
        ));
    }

    labels
}

/// Similarity between the two faces in the frame.
pub fn similarity_label(similarity: f32) -> Label {
    Label::new(format!("cosine similarity: {:.2}", similarity), text_line(1))
}

/// Frame rate annotation in the bottom-left corner.
pub fn fps_label(fps: f32, frame_height: u32) -> Label {
    Label::new(
        format!("fps={:.2}", fps),
        Point::new(10, frame_height as i32 - 10),
    )
}

/// Anchor of the n-th stacked status line at the top-left of the frame.
pub fn text_line(line_number: i32) -> Point {
    Point::new(10, LINE_HEIGHT * (line_number + 1))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::RgbImage;
    use rstest::rstest;

    use super::*;
    use crate::{testing::output_dir, EulerAngle};

    fn sample_face() -> Face {
        Face {
            bounding_box: Rect::at(20, 40).of_size(30, 30),
            contour: vec![Point::new(25, 45), Point::new(40, 60)],
            euler_angle: EulerAngle {
                x: 1.5,
                y: -12.5,
                z: 0.0,
            },
            mask: true,
            spoof: false,
            tracking_id: 7,
        }
    }

    #[rstest]
    fn test_draw_faces(output_dir: PathBuf) {
        let mut image = RgbImage::new(100, 100);
        let faces = vec![Face {
            bounding_box: Rect::at(10, 10).of_size(10, 10),
            ..Default::default()
        }];
        draw_faces(&mut image, &faces);

        assert_eq!(image.get_pixel(10, 10), &COLOR_RED);
        assert_eq!(image.get_pixel(9, 9), &COLOR_RED);
        assert_eq!(image.get_pixel(15, 15), &Rgb([0, 0, 0]));

        image.save(output_dir.join("test_draw_faces.png")).unwrap();
    }

    #[test]
    fn test_draw_bounding_box_skips_empty() {
        let mut image = RgbImage::new(10, 10);
        draw_bounding_box(&mut image, Rect::at(2, 2).of_size(0, 5), COLOR_RED, 2);
        assert!(image.pixels().all(|pixel| *pixel == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_draw_bounding_box_near_coordinate_limit() {
        let mut image = RgbImage::new(10, 10);
        let face = Face {
            bounding_box: Rect::at(2, i32::MIN).of_size(5, 30),
            ..Default::default()
        };
        draw_faces(&mut image, &[face.clone()]);
        let labels = face_labels(&face, Information::all());

        assert!(image.pixels().all(|pixel| *pixel == Rgb([0, 0, 0])));
        assert_eq!(labels[1].origin, Point::new(2, i32::MIN));
    }

    #[rstest]
    fn test_draw_document(output_dir: PathBuf) {
        let mut image = RgbImage::new(60, 60);
        let quad = [
            Point::new(10, 10),
            Point::new(50, 10),
            Point::new(50, 40),
            Point::new(10, 40),
        ];
        draw_document(&mut image, &quad, COLOR_GREEN, 2);

        assert_eq!(image.get_pixel(30, 10), &COLOR_GREEN);
        assert_eq!(image.get_pixel(30, 9), &COLOR_GREEN);
        assert_eq!(image.get_pixel(50, 25), &COLOR_GREEN);
        // Closing edge back to the first corner.
        assert_eq!(image.get_pixel(10, 25), &COLOR_GREEN);
        assert_eq!(image.get_pixel(30, 25), &Rgb([0, 0, 0]));

        image.save(output_dir.join("test_draw_document.png")).unwrap();
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![Point::new(5, 5)])]
    fn test_draw_document_needs_two_points(#[case] points: Vec<Point>) {
        let mut image = RgbImage::new(10, 10);
        draw_document(&mut image, &points, COLOR_GREEN, 2);
        assert!(image.pixels().all(|pixel| *pixel == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_similarity_label() {
        let label = similarity_label(0.876);
        assert_eq!(label.text, "cosine similarity: 0.88");
        assert_eq!(label.origin, Point::new(10, 36));
    }

    #[test]
    fn test_draw_contour_and_spoof() {
        let mut image = RgbImage::new(100, 100);
        let mut face = sample_face();
        draw_contour(&mut image, &face.contour, COLOR_GREEN);
        assert_eq!(image.get_pixel(26, 45), &COLOR_GREEN);

        draw_spoof(&mut image, &face);
        assert_ne!(image.get_pixel(20, 50), &COLOR_BLUE);

        face.spoof = true;
        draw_spoof(&mut image, &face);
        assert_eq!(image.get_pixel(20, 50), &COLOR_BLUE);
    }

    #[test]
    fn test_face_labels() {
        let labels = face_labels(&sample_face(), Information::all());
        let texts: Vec<&str> = labels.iter().map(|label| label.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "id=7",
                "mask=yes",
                "spoof=no",
                "euler angle: x=+1.50 y=-12.50 z=+0.00",
            ]
        );
        assert_eq!(labels[0].origin, Point::new(20, 40));
        assert_eq!(labels[1].origin, Point::new(20, 22));
        assert_eq!(labels[2].origin, Point::new(20, 4));
        assert_eq!(labels[3].origin, Point::new(10, 54));
    }

    #[test]
    fn test_face_labels_respects_information() {
        let labels = face_labels(&sample_face(), Information::BOUNDING_BOXES);
        assert!(labels.is_empty());
    }

    #[test]
    fn test_fps_label() {
        let label = fps_label(29.973, 480);
        assert_eq!(label.text, "fps=29.97");
        assert_eq!(label.origin, Point::new(10, 470));
    }
}
