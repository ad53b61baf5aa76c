use super::constants::FALLBACK_FPS;

/// Geometry and rate negotiated with the input source. The sink is started
/// from these values, never from configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    pub source: String,
}

impl VideoMetadata {
    /// Bytes in one packed RGB24 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Replaces an absent, non-positive, or NaN frame rate with [`FALLBACK_FPS`].
pub fn negotiate_fps(declared: Option<f64>) -> f64 {
    match declared {
        Some(fps) if fps.is_finite() && fps > 0.0 => fps,
        _ => FALLBACK_FPS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_frame_len() {
        let meta = VideoMetadata {
            width: 640,
            height: 480,
            fps: 30.0,
            codec: "h264".to_string(),
            source: "rtmp://localhost/live/in".to_string(),
        };
        assert_eq!(meta.frame_len(), 640 * 480 * 3);
    }

    #[rstest]
    #[case(Some(29.97), 29.97)]
    #[case(Some(60.0), 60.0)]
    #[case(Some(0.0), 20.0)]
    #[case(Some(-5.0), 20.0)]
    #[case(Some(f64::NAN), 20.0)]
    #[case(Some(f64::INFINITY), 20.0)]
    #[case(None, 20.0)]
    fn test_negotiate_fps(#[case] declared: Option<f64>, #[case] expected: f64) {
        assert_eq!(negotiate_fps(declared), expected);
    }
}
