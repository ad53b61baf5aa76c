use crate::shared::frame::Frame;
use crate::shared::labeled_face::LabeledFace;

/// Draws face boxes and their labels onto a frame.
///
/// Implementations modify the frame in-place (`&mut Frame`) to avoid allocation.
pub trait FrameAnnotator: Send {
    fn annotate(&self, frame: &mut Frame, faces: &[LabeledFace])
        -> Result<(), Box<dyn std::error::Error>>;
}
