use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::SINK_SHUTDOWN_TIMEOUT;
use crate::video::domain::frame_sink::{FrameSink, SinkExit};
use crate::video::domain::video_reader::VideoReader;

use super::face_labeler::FaceLabeler;
use super::pipeline_logger::PipelineLogger;

/// Lifecycle of one run. Every run passes through `Draining`, whatever
/// ended the `Running` phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Initializing,
    Running,
    Draining,
    Terminated,
}

/// Why the `Running` phase ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TerminationCause {
    EndOfStream,
    /// A read failed after startup. Treated as the end of the stream.
    SourceError(String),
    /// The sink refused a frame; no further frames were read.
    SinkFailed(String),
    /// Detection or drawing failed on a frame.
    ProcessingFailed(String),
    Cancelled,
}

impl TerminationCause {
    /// Whether the run ended the way a run is expected to end.
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            TerminationCause::EndOfStream | TerminationCause::Cancelled
        )
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::EndOfStream => write!(f, "end of stream"),
            TerminationCause::SourceError(e) => write!(f, "source error: {e}"),
            TerminationCause::SinkFailed(e) => write!(f, "sink failed: {e}"),
            TerminationCause::ProcessingFailed(e) => write!(f, "processing failed: {e}"),
            TerminationCause::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub detections_run: usize,
    pub identities_registered: usize,
    pub termination: TerminationCause,
    /// `None` if the sink could not be shut down cleanly.
    pub sink_exit: Option<SinkExit>,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline already executed")]
    AlreadyExecuted,
    #[error("frame {frame_index}: {message}")]
    Processing { frame_index: usize, message: String },
}

/// Orchestrates read → label → annotate → write for one live stream.
///
/// Single-use: `execute` consumes the owned endpoints, so calling it twice
/// fails with [`PipelineError::AlreadyExecuted`].
pub struct AnnotateStreamUseCase {
    reader: Option<Box<dyn VideoReader>>,
    sink: Option<Box<dyn FrameSink>>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
    labeler: FaceLabeler,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
    shutdown_timeout: Duration,
    state: PipelineState,
}

impl AnnotateStreamUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        sink: Box<dyn FrameSink>,
        detector: Box<dyn FaceDetector>,
        annotator: Box<dyn FrameAnnotator>,
        labeler: FaceLabeler,
        logger: Box<dyn PipelineLogger>,
        cancelled: Option<Arc<AtomicBool>>,
        shutdown_timeout: Option<Duration>,
    ) -> Self {
        Self {
            reader: Some(reader),
            sink: Some(sink),
            detector,
            annotator,
            labeler,
            logger,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            shutdown_timeout: shutdown_timeout.unwrap_or(SINK_SHUTDOWN_TIMEOUT),
            state: PipelineState::Initializing,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs until the stream ends, the sink fails, processing fails, or
    /// the cancellation flag is raised, then drains both endpoints.
    ///
    /// Sink and source failures are reported in the summary. Processing
    /// failures are returned as errors, after draining.
    pub fn execute(&mut self) -> Result<RunSummary, PipelineError> {
        let mut reader = self.reader.take().ok_or(PipelineError::AlreadyExecuted)?;
        let mut sink = self.sink.take().ok_or(PipelineError::AlreadyExecuted)?;

        self.transition(PipelineState::Running);
        let (frames_processed, termination) = self.run(reader.as_mut(), sink.as_mut());

        self.transition(PipelineState::Draining);
        match &termination {
            TerminationCause::EndOfStream | TerminationCause::Cancelled => {
                log::info!("Stopping: {termination}")
            }
            _ => log::error!("Stopping: {termination}"),
        }
        reader.close();
        let sink_exit = match sink.close_and_wait(self.shutdown_timeout) {
            Ok(exit) => {
                log::info!("Encoder finished: {exit:?}");
                Some(exit)
            }
            Err(e) => {
                log::error!("Encoder shutdown failed: {e}");
                None
            }
        };

        self.transition(PipelineState::Terminated);
        log::info!("Released input and output");

        let summary = RunSummary {
            frames_processed,
            detections_run: self.labeler.detections_run(),
            identities_registered: self.labeler.identities(),
            termination,
            sink_exit,
        };
        self.logger.info(&format!(
            "{} frames, {} detections, {} identities ({})",
            summary.frames_processed,
            summary.detections_run,
            summary.identities_registered,
            summary.termination
        ));
        self.logger.summary();

        match &summary.termination {
            TerminationCause::ProcessingFailed(message) => Err(PipelineError::Processing {
                frame_index: frames_processed,
                message: message.clone(),
            }),
            _ => Ok(summary),
        }
    }

    fn run(
        &mut self,
        reader: &mut dyn VideoReader,
        sink: &mut dyn FrameSink,
    ) -> (usize, TerminationCause) {
        let mut frames = 0usize;

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                return (frames, TerminationCause::Cancelled);
            }

            let t0 = Instant::now();
            let mut frame = match reader.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return (frames, TerminationCause::EndOfStream),
                Err(e) => {
                    log::warn!("Input read failed, treating as end of stream: {e}");
                    return (frames, TerminationCause::SourceError(e.to_string()));
                }
            };
            let t1 = Instant::now();

            let faces = match self.labeler.label_frame(&frame, self.detector.as_mut()) {
                Ok(faces) => faces,
                Err(e) => return (frames, TerminationCause::ProcessingFailed(e.to_string())),
            };
            let face_count = faces.len();
            if let Err(e) = self.annotator.annotate(&mut frame, faces) {
                return (frames, TerminationCause::ProcessingFailed(e.to_string()));
            }
            let t2 = Instant::now();

            if let Err(e) = sink.write(&frame) {
                // The encoder may have seen the same interrupt and exited first.
                if self.cancelled.load(Ordering::Relaxed) {
                    log::debug!("Sink closed after interrupt: {e}");
                    return (frames, TerminationCause::Cancelled);
                }
                return (frames, TerminationCause::SinkFailed(e.to_string()));
            }
            let t3 = Instant::now();

            frames += 1;
            self.logger.timing("read", ms(t1 - t0));
            self.logger.timing("label", ms(t2 - t1));
            self.logger.timing("write", ms(t3 - t2));
            self.logger.metric("faces", face_count as f64);
            self.logger
                .metric("identities", self.labeler.identities() as f64);
            self.logger.progress(frames);
        }
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
