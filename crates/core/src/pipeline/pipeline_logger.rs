use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Keeps the use case free of any particular reporting mechanism.
pub trait PipelineLogger: Send {
    /// Report how many frames have been forwarded so far. Live streams have
    /// no known total.
    fn progress(&mut self, frames: usize);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces on screen, registry size).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Aggregate of one series of samples. Constant size, since a stream can
/// run indefinitely.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub count: usize,
    pub total: f64,
    pub max: f64,
    pub last: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.total += value;
        self.last = value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logger for long-running streams: periodic progress lines plus per-stage
/// timing and metric aggregates reported when the run ends.
///
/// Progress is logged every `throttle_frames` frames; at 30 fps the default
/// of 300 is one line about every ten seconds.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    start_time: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Stream summary ({} frames in {elapsed_secs:.1}s):",
            self.frames
        )];

        for (stage, stat) in &self.timings {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:7.1}ms",
                stat.mean(),
                stat.max
            ));
        }
        for (name, stat) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}, max {:.0}, last {:.0}",
                stat.mean(),
                stat.max,
                stat.last
            ));
        }
        if self.frames > 0 && elapsed_secs > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames as f64 / elapsed_secs
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stat(&self, stage: &str) -> Option<&RunningStat> {
        self.timings.get(stage)
    }

    pub fn metric_stat(&self, name: &str) -> Option<&RunningStat> {
        self.metrics.get(name)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, frames: usize) {
        self.frames = frames;
        if frames > 0 && frames % self.throttle_frames == 0 {
            let secs = self.start_time.elapsed().as_secs_f64();
            let fps = if secs > 0.0 { frames as f64 / secs } else { 0.0 };
            log::info!("Forwarded {frames} frames ({fps:.1} fps)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
