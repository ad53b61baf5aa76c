//! Command lines for the external encoder process.
//!
//! Raw RGB24 frames arrive on stdin at the negotiated geometry and rate;
//! the tail of the command selects the publishing profile.

use facestream_config::domain::stream_config::OutputSink;

use crate::shared::constants::{
    HLS_LIST_SIZE, HLS_PLAYLIST_NAME, HLS_SEGMENT_PATTERN, HLS_SEGMENT_SECONDS,
};
use crate::shared::video_metadata::VideoMetadata;

const HLS_BITRATE: &str = "1500k";
const HLS_BUFFER_SIZE: &str = "3000k";

/// Keyframe interval that lines up with the HLS segment length.
pub fn hls_keyframe_interval(fps: f64) -> u32 {
    ((fps * HLS_SEGMENT_SECONDS as f64) as u32).max(1)
}

pub fn encoder_args(output: &OutputSink, meta: &VideoMetadata) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-f", "rawvideo",
        "-pix_fmt", "rgb24",
        "-s", &format!("{}x{}", meta.width, meta.height),
        "-r", &format!("{}", meta.fps),
        "-i", "-",
        "-c:v", "libx264",
        "-preset", "veryfast",
        "-tune", "zerolatency",
        "-pix_fmt", "yuv420p",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    match output {
        OutputSink::Rtmp(url) => {
            args.extend(["-f".to_string(), "flv".to_string(), url.clone()]);
        }
        OutputSink::Hls(dir) => {
            let keyint = hls_keyframe_interval(meta.fps).to_string();
            args.extend(
                [
                    "-g", &keyint,
                    "-keyint_min", &keyint,
                    "-sc_threshold", "0",
                    "-b:v", HLS_BITRATE,
                    "-maxrate", HLS_BITRATE,
                    "-bufsize", HLS_BUFFER_SIZE,
                    "-f", "hls",
                    "-hls_time", &HLS_SEGMENT_SECONDS.to_string(),
                    "-hls_list_size", &HLS_LIST_SIZE.to_string(),
                    "-hls_flags", "delete_segments",
                    "-hls_segment_filename",
                ]
                .iter()
                .map(|s| s.to_string()),
            );
            args.push(dir.join(HLS_SEGMENT_PATTERN).to_string_lossy().into_owned());
            args.push(dir.join(HLS_PLAYLIST_NAME).to_string_lossy().into_owned());
        }
    }

    args
}
