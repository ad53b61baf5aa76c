use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DETECT_EVERY: usize = 1;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Where frames are pulled from.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSource {
    Rtmp(String),
    File(PathBuf),
}

impl InputSource {
    /// Locator handed to the demuxer (URL or filesystem path).
    pub fn locator(&self) -> String {
        match self {
            InputSource::Rtmp(url) => url.clone(),
            InputSource::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Rtmp(url) => write!(f, "RTMP {url}"),
            InputSource::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Where annotated frames are published.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputSink {
    Rtmp(String),
    Hls(PathBuf),
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Rtmp(url) => write!(f, "RTMP {url}"),
            OutputSink::Hls(dir) => write!(f, "HLS directory {}", dir.display()),
        }
    }
}

/// Fully resolved run parameters. Built once, before any stream I/O.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    pub input: InputSource,
    pub output: OutputSink,
    pub detect_every: usize,
    pub similarity_threshold: f64,
}

/// Parameters given explicitly on the command line. `None` means "not
/// supplied", so a stored record or the built-in default may fill it in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplicitParams {
    pub stream_key: Option<String>,
    pub input: Option<InputSource>,
    pub output: Option<OutputSink>,
    pub detect_every: Option<usize>,
    pub similarity_threshold: Option<f64>,
}
