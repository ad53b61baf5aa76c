use facestream_config::domain::stream_config::InputSource;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Pulls decoded frames from a file or a live stream.
///
/// Implementations handle I/O details (protocol, container, codec) while
/// the pipeline works with the abstract `Frame` and `VideoMetadata` types.
pub trait VideoReader: Send {
    /// Connects to the source and returns what it declares about itself.
    /// Declared values may be zero or missing for live streams.
    fn open(&mut self, source: &InputSource) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is decoded. `Ok(None)` is end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the source. Safe to call more than once.
    fn close(&mut self);
}
