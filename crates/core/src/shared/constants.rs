use std::time::Duration;

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Used when the source declares no usable frame rate.
pub const FALLBACK_FPS: f64 = 20.0;

/// How long the encoder gets to flush after its input is closed.
pub const SINK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Target HLS segment duration; keyframes are forced at this interval.
pub const HLS_SEGMENT_SECONDS: u32 = 2;

/// Segments kept in the rolling playlist.
pub const HLS_LIST_SIZE: u32 = 5;

pub const HLS_PLAYLIST_NAME: &str = "stream.m3u8";
pub const HLS_SEGMENT_PATTERN: &str = "segment_%04d.ts";

pub const LABEL_PREFIX: &str = "Person";
