use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::Frame;

/// How the sink's process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkExit {
    /// Exited on its own. `None` when it was ended by a signal.
    Exited(Option<i32>),
    /// Did not exit within the shutdown timeout and was killed.
    Killed,
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to start encoder `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoder input closed (process exited)")]
    PipeClosed,
    #[error("failed to write frame to encoder: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed waiting for encoder: {0}")]
    Wait(#[source] std::io::Error),
    #[error("frame is {actual} bytes, encoder expects {expected}")]
    FrameSize { expected: usize, actual: usize },
}

/// Consumer of annotated frames, typically an encoder process.
///
/// A write error is final: callers must stop writing and shut the sink
/// down with [`FrameSink::close_and_wait`].
pub trait FrameSink: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Signals end of input and waits up to `timeout` for the sink to finish,
    /// forcing it down afterwards.
    fn close_and_wait(&mut self, timeout: Duration) -> Result<SinkExit, SinkError>;
}
