pub mod detection_cadence;
pub mod face_detector;
pub mod face_observation;
