use crate::detection::domain::detection_cadence::DetectionCadence;
use crate::detection::domain::face_detector::FaceDetector;
use crate::identity::domain::identity_registry::IdentityRegistry;
use crate::shared::frame::Frame;
use crate::shared::labeled_face::LabeledFace;
use crate::shared::math::l2_normalize;

/// Per-run labeling state: which faces are on screen and who they are.
///
/// On cadence frames the detector runs and every observation is matched
/// against (or added to) the registry. On the frames in between the
/// previous result is returned unchanged.
pub struct FaceLabeler {
    registry: IdentityRegistry,
    cadence: DetectionCadence,
    threshold: f64,
    last_faces: Vec<LabeledFace>,
    frames_seen: usize,
    detections_run: usize,
}

impl FaceLabeler {
    pub fn new(cadence: DetectionCadence, threshold: f64) -> Self {
        Self {
            registry: IdentityRegistry::new(),
            cadence,
            threshold,
            last_faces: Vec::new(),
            frames_seen: 0,
            detections_run: 0,
        }
    }

    /// Labels for the next frame in stream order.
    pub fn label_frame(
        &mut self,
        frame: &Frame,
        detector: &mut dyn FaceDetector,
    ) -> Result<&[LabeledFace], Box<dyn std::error::Error>> {
        if self.cadence.should_detect(self.frames_seen) {
            let observations = detector.detect(frame)?;
            self.detections_run += 1;

            self.last_faces = observations
                .into_iter()
                .map(|obs| {
                    let mut embedding = obs.embedding;
                    l2_normalize(&mut embedding);
                    let label = self.registry.identify(embedding, self.threshold);
                    LabeledFace::new(obs.bbox, label)
                })
                .collect();
        }
        self.frames_seen += 1;
        Ok(&self.last_faces)
    }

    pub fn identities(&self) -> usize {
        self.registry.len()
    }

    pub fn detections_run(&self) -> usize {
        self.detections_run
    }
}
