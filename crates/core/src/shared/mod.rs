pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod labeled_face;
pub mod math;
pub mod video_metadata;
