use std::fmt::Display;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves the point by the given offsets, saturating at the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Axis-aligned rectangle in frame pixels.
///
/// The origin may lie outside the frame (negative or past the far edge), as
/// boxes reported for partially visible faces often do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width of the rectangle.
    pub width: u32,
    /// Height of the rectangle.
    pub height: u32,
}

/// Rectangle position used for chaining constructors.
pub struct RectPosition {
    pub x: i32,
    pub y: i32,
}

impl RectPosition {
    /// Makes a rectangle with the given size.
    pub fn of_size(&self, width: u32, height: u32) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width,
            height,
        }
    }

    /// Makes a rectangle with the given end point. An end point before the
    /// origin yields an empty rectangle.
    pub fn ending_at(&self, x: i32, y: i32) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: (x - self.x).max(0) as u32,
            height: (y - self.y).max(0) as u32,
        }
    }
}

impl Rect {
    /// Starts a rectangle with the given position.
    pub fn at(x: i32, y: i32) -> RectPosition {
        RectPosition { x, y }
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right end of the rectangle (exclusive).
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom end of the rectangle (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Bottom-right corner (exclusive), saturated to the `i32` range.
    pub fn right_bottom(&self) -> Point {
        Point::new(saturate(self.right()), saturate(self.bottom()))
    }

    /// True when the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersects two rectangles.
    ///
    /// # Returns
    ///
    /// * `Option<Rect>` - The overlap, or `None` when the rectangles are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// Snaps a negative origin to zero on each axis and keeps the extent.
    ///
    /// The result may extend past the frame on the far edge; callers that
    /// write pixels must check it against the frame size.
    pub fn clamp_origin(&self) -> Rect {
        Rect {
            x: self.x.max(0),
            y: self.y.max(0),
            ..*self
        }
    }

    /// Clips the rectangle to a `width` x `height` frame anchored at (0, 0).
    ///
    /// # Returns
    ///
    /// * `Option<Rect>` - The visible part, or `None` when nothing is visible.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersection(&Rect::at(0, 0).of_size(width, height))
    }

    /// True when the rectangle lies entirely within a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i64 && self.bottom() <= height as i64
    }

    /// Gets the rectangle as a tuple of (x, y, width, height).
    pub fn to_xywh(&self) -> (i32, i32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{x: {}, y: {}, width: {}, height: {}}}",
            self.x, self.y, self.width, self.height
        )
    }
}
