/// Decides which frames run detection: every `interval`-th frame, starting
/// with frame 0. Frames in between reuse the previous result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionCadence {
    interval: usize,
}

impl DetectionCadence {
    pub fn new(interval: usize) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("detection interval must be >= 1");
        }
        Ok(Self { interval })
    }

    pub fn should_detect(&self, frame_index: usize) -> bool {
        frame_index % self.interval == 0
    }
}
