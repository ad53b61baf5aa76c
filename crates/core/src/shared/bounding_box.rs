/// Axis-aligned face box in pixel coordinates, corners inclusive of
/// `(x1, y1)` and exclusive of `(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Truncates detector output toward zero, the way an integer cast of
    /// float coordinates does.
    pub fn from_f64(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersection with a `frame_w` × `frame_h` frame, or `None` if the
    /// box lies entirely outside it.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
        let clamped = BoundingBox {
            x1: self.x1.clamp(0, frame_w as i32),
            y1: self.y1.clamp(0, frame_h as i32),
            x2: self.x2.clamp(0, frame_w as i32),
            y2: self.y2.clamp(0, frame_h as i32),
        };
        (!clamped.is_empty()).then_some(clamped)
    }
}
