use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::labeled_face::LabeledFace;

use super::bitmap_font;

const GREEN: [u8; 3] = [0, 255, 0];
const DEFAULT_THICKNESS: i32 = 2;
const DEFAULT_FONT_SCALE: u32 = 2;

/// Gap between the label baseline and the top edge of the box.
const LABEL_OFFSET: i32 = 5;

/// Draws an outlined rectangle per face with its label above it.
///
/// Everything is clipped to the frame, so boxes partly outside the picture
/// are drawn as far as they are visible.
pub struct BoxLabelAnnotator {
    color: [u8; 3],
    thickness: i32,
    font_scale: u32,
}

impl BoxLabelAnnotator {
    pub fn new(color: [u8; 3], thickness: i32, font_scale: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
            font_scale: font_scale.max(1),
        }
    }
}

impl Default for BoxLabelAnnotator {
    fn default() -> Self {
        Self::new(GREEN, DEFAULT_THICKNESS, DEFAULT_FONT_SCALE)
    }
}

impl FrameAnnotator for BoxLabelAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[LabeledFace],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut canvas = Canvas::new(frame, self.color);

        for face in faces {
            let b = face.bbox;
            if b.is_empty() {
                continue;
            }
            let t = self.thickness.min(b.width()).min(b.height());
            canvas.fill(b.x1, b.y1, b.x2, b.y1 + t);
            canvas.fill(b.x1, b.y2 - t, b.x2, b.y2);
            canvas.fill(b.x1, b.y1, b.x1 + t, b.y2);
            canvas.fill(b.x2 - t, b.y1, b.x2, b.y2);

            bitmap_font::render(
                &face.label,
                b.x1,
                b.y1 - LABEL_OFFSET,
                self.font_scale,
                |x, y| canvas.fill(x, y, x + 1, y + 1),
            );
        }

        Ok(())
    }
}

/// Clipped solid-colour fills on a packed RGB24 frame.
struct Canvas<'a> {
    data: &'a mut [u8],
    width: i32,
    height: i32,
    color: [u8; 3],
}

impl<'a> Canvas<'a> {
    fn new(frame: &'a mut Frame, color: [u8; 3]) -> Self {
        let width = frame.width() as i32;
        let height = frame.height() as i32;
        Self {
            data: frame.data_mut(),
            width,
            height,
            color,
        }
    }

    /// Fills the half-open rectangle `[x1, x2) × [y1, y2)`.
    fn fill(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let x1 = x1.clamp(0, self.width);
        let x2 = x2.clamp(0, self.width);
        let y1 = y1.clamp(0, self.height);
        let y2 = y2.clamp(0, self.height);

        for y in y1..y2 {
            for x in x1..x2 {
                let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
                self.data[idx..idx + CHANNELS].copy_from_slice(&self.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn make_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 0)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * frame.width() as usize + x) * 3;
        let d = frame.data();
        [d[idx], d[idx + 1], d[idx + 2]]
    }

    fn face(x1: i32, y1: i32, x2: i32, y2: i32, label: &str) -> LabeledFace {
        LabeledFace::new(BoundingBox::new(x1, y1, x2, y2), label)
    }

    #[test]
    fn test_no_faces_frame_unchanged() {
        let mut frame = make_frame(50, 50);
        BoxLabelAnnotator::default().annotate(&mut frame, &[]).unwrap();
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_draws_two_pixel_green_outline() {
        let mut frame = make_frame(100, 100);
        BoxLabelAnnotator::default()
            .annotate(&mut frame, &[face(20, 40, 60, 80, "")])
            .unwrap();

        assert_eq!(pixel(&frame, 20, 40), GREEN);
        assert_eq!(pixel(&frame, 21, 41), GREEN);
        assert_eq!(pixel(&frame, 59, 79), GREEN);
        assert_eq!(pixel(&frame, 40, 41), GREEN);
        // Interior and just inside the band stay untouched.
        assert_eq!(pixel(&frame, 22, 42), [0, 0, 0]);
        assert_eq!(pixel(&frame, 40, 60), [0, 0, 0]);
        assert_eq!(pixel(&frame, 19, 40), [0, 0, 0]);
    }

    #[test]
    fn test_label_drawn_above_box() {
        let mut frame = make_frame(100, 100);
        BoxLabelAnnotator::default()
            .annotate(&mut frame, &[face(10, 40, 90, 90, "Person 1")])
            .unwrap();

        let label_rows = 40 - LABEL_OFFSET - 14 + 1..=40 - LABEL_OFFSET;
        let lit_in_label = label_rows
            .flat_map(|y| (10..90).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&frame, x as usize, y as usize) == GREEN)
            .count();
        assert!(lit_in_label > 0);

        // Nothing between the baseline and the box top.
        for y in 40 - LABEL_OFFSET + 1..40 {
            for x in 0..100 {
                assert_eq!(pixel(&frame, x, y as usize), [0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_box_partly_outside_is_clipped() {
        let mut frame = make_frame(50, 50);
        BoxLabelAnnotator::default()
            .annotate(&mut frame, &[face(-10, -10, 20, 20, "Person 1")])
            .unwrap();

        assert_eq!(pixel(&frame, 19, 0), GREEN);
        assert_eq!(pixel(&frame, 0, 19), GREEN);
        assert_eq!(pixel(&frame, 10, 10), [0, 0, 0]);
    }

    #[test]
    fn test_box_fully_outside_is_ignored() {
        let mut frame = make_frame(50, 50);
        BoxLabelAnnotator::default()
            .annotate(&mut frame, &[face(60, 60, 90, 90, "Person 1")])
            .unwrap();
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_preserves_frame_index() {
        let mut frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 42);
        BoxLabelAnnotator::default()
            .annotate(&mut frame, &[face(1, 1, 8, 8, "x")])
            .unwrap();
        assert_eq!(frame.index(), 42);
    }
}
