use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use crate::shared::frame::Frame;

use super::arcface_embedder::ArcFaceEmbedder;
use super::model_resolver::{ModelResolver, ModelSpec, ProgressFn};
use super::onnx_yolo_detector::OnnxYoloDetector;

/// Two-stage face analysis: YOLO finds the boxes, ArcFace describes each
/// cropped face.
pub struct OnnxFaceAnalyzer {
    detector: OnnxYoloDetector,
    embedder: ArcFaceEmbedder,
}

impl OnnxFaceAnalyzer {
    pub fn new(
        detector_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            detector: OnnxYoloDetector::new(detector_model, confidence)?,
            embedder: ArcFaceEmbedder::new(embedding_model)?,
        })
    }

    /// Resolves both models (downloading if needed) and loads them.
    pub fn from_resolver(
        resolver: &ModelResolver,
        confidence: f64,
        progress: impl Fn(&str) -> Option<ProgressFn>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector_model = resolver.resolve(
            ModelSpec {
                name: YOLO_MODEL_NAME,
                url: YOLO_MODEL_URL,
            },
            progress(YOLO_MODEL_NAME),
        )?;
        let embedding_model = resolver.resolve(
            ModelSpec {
                name: EMBEDDING_MODEL_NAME,
                url: EMBEDDING_MODEL_URL,
            },
            progress(EMBEDDING_MODEL_NAME),
        )?;
        Self::new(&detector_model, &embedding_model, confidence)
    }
}

impl FaceDetector for OnnxFaceAnalyzer {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        let boxes = self.detector.detect_boxes(frame)?;
        let mut faces = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            // Boxes that lie entirely off-frame have nothing to embed.
            let Some((crop, w, h)) = frame.crop(&bbox) else {
                log::debug!("Skipping off-frame box {bbox:?} on frame {}", frame.index());
                continue;
            };
            let embedding = self.embedder.embed(&crop, w, h)?;
            faces.push(FaceObservation::new(bbox, embedding));
        }

        Ok(faces)
    }
}
