use super::bounding_box::BoundingBox;

/// Render instruction for one face: where to draw and what to write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledFace {
    pub bbox: BoundingBox,
    pub label: String,
}

impl LabeledFace {
    pub fn new(bbox: BoundingBox, label: impl Into<String>) -> Self {
        Self {
            bbox,
            label: label.into(),
        }
    }
}
