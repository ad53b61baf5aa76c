use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Detection/embedding capability: one call per frame, zero or more faces.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;
}
