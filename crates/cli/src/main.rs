use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use facestream_config::domain::config_resolver;
use facestream_config::domain::config_store::ConfigStore;
use facestream_config::domain::stream_config::{ExplicitParams, InputSource, OutputSink};
use facestream_config::infrastructure::file_config_store::{FileConfigStore, DEFAULT_CONFIG_DIR};
use facestream_config::infrastructure::http_config_store::HttpConfigStore;
use facestream_core::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
use facestream_core::detection::domain::detection_cadence::DetectionCadence;
use facestream_core::detection::infrastructure::model_resolver::{ModelResolver, ProgressFn};
use facestream_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use facestream_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use facestream_core::pipeline::annotate_stream_use_case::{AnnotateStreamUseCase, RunSummary};
use facestream_core::pipeline::face_labeler::FaceLabeler;
use facestream_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facestream_core::pipeline::stream_endpoints::open_endpoints;
use facestream_core::video::domain::frame_sink::FrameSink;
use facestream_core::video::infrastructure::ffmpeg_process_sink::FfmpegProcessSink;
use facestream_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Labels faces in a live stream with identities that persist for the
/// session, and republishes the annotated stream.
#[derive(Parser, Debug)]
#[command(name = "face-stream")]
struct Cli {
    /// Key of the stored configuration record to merge in.
    #[arg(long = "stream_key")]
    stream_key: Option<String>,

    /// RTMP URL to pull frames from.
    #[arg(long = "input_rtmp", conflicts_with = "input_file")]
    input_rtmp: Option<String>,

    /// Local video file to read frames from.
    #[arg(long = "input_file")]
    input_file: Option<PathBuf>,

    /// RTMP URL to publish the annotated stream to.
    #[arg(long = "output_rtmp", conflicts_with = "output_hls_dir")]
    output_rtmp: Option<String>,

    /// Directory to write an HLS playlist and segments into.
    #[arg(long = "output_hls_dir")]
    output_hls_dir: Option<PathBuf>,

    /// Run detection every Nth frame (default 1).
    #[arg(long = "detect_every")]
    detect_every: Option<usize>,

    /// Cosine similarity needed to reuse an identity (default 0.3).
    #[arg(long = "similarity_threshold")]
    similarity_threshold: Option<f64>,

    /// Directory of stored configuration records.
    #[arg(long = "config_dir", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Base URL of a configuration service; replaces --config_dir.
    #[arg(long = "config_url")]
    config_url: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory holding pre-provisioned model files.
    #[arg(long = "models_dir")]
    models_dir: Option<PathBuf>,

    /// Encoder binary used for the output stream.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,
}

impl Cli {
    fn explicit_params(&self) -> ExplicitParams {
        let input = match (&self.input_rtmp, &self.input_file) {
            (Some(url), _) => Some(InputSource::Rtmp(url.clone())),
            (None, Some(path)) => Some(InputSource::File(path.clone())),
            (None, None) => None,
        };
        let output = match (&self.output_rtmp, &self.output_hls_dir) {
            (Some(url), _) => Some(OutputSink::Rtmp(url.clone())),
            (None, Some(dir)) => Some(OutputSink::Hls(dir.clone())),
            (None, None) => None,
        };

        ExplicitParams {
            stream_key: self.stream_key.clone(),
            input,
            output,
            detect_every: self.detect_every,
            similarity_threshold: self.similarity_threshold,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(summary) if summary.termination.is_clean() => {}
        Ok(summary) => {
            eprintln!("Error: {}", summary.termination);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<RunSummary, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let store = open_store(&cli);
    let config = config_resolver::resolve(cli.explicit_params(), store.as_deref())?;
    log::info!(
        "Config: input {}, output {}, detect every {} frame(s), similarity threshold {}",
        config.input,
        config.output,
        config.detect_every,
        config.similarity_threshold
    );

    let resolver = ModelResolver::new(cli.models_dir.clone())?;
    let detector = OnnxFaceAnalyzer::from_resolver(&resolver, cli.confidence, download_progress)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, draining");
        flag.store(true, Ordering::Relaxed);
    })?;

    let ffmpeg = cli.ffmpeg.clone();
    let endpoints = open_endpoints(
        Box::new(FfmpegReader::new()),
        &config.input,
        &config.output,
        |output, meta| {
            FfmpegProcessSink::spawn(&ffmpeg, output, meta)
                .map(|sink| Box::new(sink) as Box<dyn FrameSink>)
        },
    )?;

    let cadence = DetectionCadence::new(config.detect_every)?;
    let mut use_case = AnnotateStreamUseCase::new(
        Box::new(endpoints.reader),
        endpoints.sink,
        Box::new(detector),
        Box::new(BoxLabelAnnotator::default()),
        FaceLabeler::new(cadence, config.similarity_threshold),
        Box::new(StdoutPipelineLogger::default()),
        Some(cancelled),
        None,
    );

    Ok(use_case.execute()?)
}

fn open_store(cli: &Cli) -> Option<Box<dyn ConfigStore>> {
    cli.stream_key.as_ref()?;
    match &cli.config_url {
        Some(url) => match HttpConfigStore::new(url) {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                log::warn!("Config service unavailable, using defaults: {e}");
                None
            }
        },
        None => Some(Box::new(FileConfigStore::new(&cli.config_dir))),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(path) = &cli.input_file {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn download_progress(model: &str) -> Option<ProgressFn> {
    let model = model.to_string();
    Some(Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {model}... {pct}%");
        } else {
            eprint!("\rDownloading {model}... {downloaded} bytes");
        }
        if total > 0 && downloaded >= total {
            eprintln!();
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("face-stream").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.config_dir, PathBuf::from("/var/lib/face_stream/configs"));
        assert_eq!(cli.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(cli.ffmpeg, "ffmpeg");
        assert_eq!(cli.explicit_params(), ExplicitParams::default());
    }

    #[test]
    fn test_underscore_flags_map_to_explicit_params() {
        let cli = parse(&[
            "--stream_key",
            "cam1",
            "--input_rtmp",
            "rtmp://in/live",
            "--output_hls_dir",
            "/tmp/hls",
            "--detect_every",
            "3",
            "--similarity_threshold",
            "0.4",
        ])
        .unwrap();

        let params = cli.explicit_params();
        assert_eq!(params.stream_key.as_deref(), Some("cam1"));
        assert_eq!(
            params.input,
            Some(InputSource::Rtmp("rtmp://in/live".to_string()))
        );
        assert_eq!(params.output, Some(OutputSink::Hls(PathBuf::from("/tmp/hls"))));
        assert_eq!(params.detect_every, Some(3));
        assert_eq!(params.similarity_threshold, Some(0.4));
    }

    #[test]
    fn test_inputs_conflict() {
        let result = parse(&["--input_rtmp", "rtmp://a", "--input_file", "a.mp4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_outputs_conflict() {
        let result = parse(&["--output_rtmp", "rtmp://b", "--output_hls_dir", "/tmp/hls"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_store_without_stream_key() {
        let cli = parse(&["--config_url", "http://localhost:8080"]).unwrap();
        assert!(open_store(&cli).is_none());
    }

    #[test]
    fn test_confidence_out_of_range_is_rejected() {
        let cli = parse(&["--confidence", "1.5"]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_missing_input_file_is_rejected() {
        let cli = parse(&["--input_file", "/nonexistent/input.mp4"]).unwrap();
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }
}
