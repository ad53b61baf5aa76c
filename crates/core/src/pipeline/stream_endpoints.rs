use facestream_config::domain::stream_config::{InputSource, OutputSink};
use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::{negotiate_fps, VideoMetadata};
use crate::video::domain::frame_sink::{FrameSink, SinkError};
use crate::video::domain::video_reader::VideoReader;

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("cannot open input {input}: {reason}")]
    OpenInput { input: String, reason: String },
    #[error("failed to read the first frame from {input}: {reason}")]
    FirstFrame { input: String, reason: String },
    #[error("input {input} produced no frames")]
    NoFrames { input: String },
    #[error("cannot start output {output}: {source}")]
    StartSink {
        output: String,
        #[source]
        source: SinkError,
    },
}

/// Reader that replays a frame consumed during startup before pulling
/// from the wrapped source.
pub struct PrimedReader {
    inner: Box<dyn VideoReader>,
    pending: Option<Frame>,
}

impl PrimedReader {
    pub fn new(inner: Box<dyn VideoReader>, first: Frame) -> Self {
        Self {
            inner,
            pending: Some(first),
        }
    }
}

impl VideoReader for PrimedReader {
    fn open(&mut self, source: &InputSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.pending = None;
        self.inner.open(source)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        match self.pending.take() {
            Some(frame) => Ok(Some(frame)),
            None => self.inner.read_frame(),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        self.inner.close();
    }
}

/// Both ends of a run, opened and agreed on geometry and rate.
pub struct StreamEndpoints {
    pub reader: PrimedReader,
    pub sink: Box<dyn FrameSink>,
    pub metadata: VideoMetadata,
}

/// Opens the input, proves it yields a frame, and settles the output
/// geometry and rate.
///
/// Geometry always comes from the first decoded frame, since that is what
/// the sink will receive. The declared rate is kept when usable.
pub fn open_input(
    mut reader: Box<dyn VideoReader>,
    input: &InputSource,
) -> Result<(PrimedReader, VideoMetadata), EndpointError> {
    let declared = reader.open(input).map_err(|e| EndpointError::OpenInput {
        input: input.to_string(),
        reason: e.to_string(),
    })?;

    let first = match reader.read_frame() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            reader.close();
            return Err(EndpointError::NoFrames {
                input: input.to_string(),
            });
        }
        Err(e) => {
            reader.close();
            return Err(EndpointError::FirstFrame {
                input: input.to_string(),
                reason: e.to_string(),
            });
        }
    };

    let metadata = negotiate(&declared, &first);
    Ok((PrimedReader::new(reader, first), metadata))
}

/// Opens the input, then starts the sink with the negotiated parameters.
/// The input is released again if the sink cannot be started.
pub fn open_endpoints<F>(
    reader: Box<dyn VideoReader>,
    input: &InputSource,
    output: &OutputSink,
    start_sink: F,
) -> Result<StreamEndpoints, EndpointError>
where
    F: FnOnce(&OutputSink, &VideoMetadata) -> Result<Box<dyn FrameSink>, SinkError>,
{
    let (mut reader, metadata) = open_input(reader, input)?;
    log::info!(
        "Input {input}: {}x{} @ {:.2} fps",
        metadata.width,
        metadata.height,
        metadata.fps
    );

    let sink = match start_sink(output, &metadata) {
        Ok(sink) => sink,
        Err(source) => {
            reader.close();
            return Err(EndpointError::StartSink {
                output: output.to_string(),
                source,
            });
        }
    };
    log::info!("Publishing to {output}");

    Ok(StreamEndpoints {
        reader,
        sink,
        metadata,
    })
}

fn negotiate(declared: &VideoMetadata, first: &Frame) -> VideoMetadata {
    let declared_size = (declared.width, declared.height);
    let actual_size = (first.width(), first.height());
    if declared_size != (0, 0) && declared_size != actual_size {
        log::warn!(
            "Source declared {}x{} but decodes to {}x{}; using decoded size",
            declared.width,
            declared.height,
            first.width(),
            first.height()
        );
    }

    let fps = negotiate_fps(Some(declared.fps));
    if fps != declared.fps {
        log::warn!("Source frame rate {} unusable; using {fps}", declared.fps);
    }

    VideoMetadata {
        width: first.width(),
        height: first.height(),
        fps,
        codec: declared.codec.clone(),
        source: declared.source.clone(),
    }
}
