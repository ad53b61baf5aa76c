use crate::shared::bounding_box::BoundingBox;

/// One detected face: where it is and what it looks like.
///
/// The embedding length is fixed by the backend model. It is L2-normalized
/// by the labeler before comparison, so backends may return raw vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    pub embedding: Vec<f32>,
}

impl FaceObservation {
    pub fn new(bbox: BoundingBox, embedding: Vec<f32>) -> Self {
        Self { bbox, embedding }
    }
}
