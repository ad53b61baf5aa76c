use std::io::{ErrorKind, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use facestream_config::domain::stream_config::OutputSink;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sink::{FrameSink, SinkError, SinkExit};

use super::encoder_args::encoder_args;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Streams raw frames into an external `ffmpeg` process over its stdin.
///
/// The child's stderr is inherited so encoder diagnostics reach the
/// operator; stdout is discarded. On unix the child runs in its own process
/// group, so a terminal Ctrl-C reaches only this process and the encoder is
/// shut down through `close_and_wait`.
pub struct FfmpegProcessSink {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_len: usize,
    exit: Option<SinkExit>,
}

impl FfmpegProcessSink {
    /// Starts the encoder for `output`, sized from the negotiated `meta`.
    /// Creates the HLS output directory if it does not exist yet.
    pub fn spawn(
        program: &str,
        output: &OutputSink,
        meta: &VideoMetadata,
    ) -> Result<Self, SinkError> {
        if let OutputSink::Hls(dir) = output {
            std::fs::create_dir_all(dir).map_err(|source| SinkError::CreateOutputDir {
                path: dir.clone(),
                source,
            })?;
        }

        let args = encoder_args(output, meta);
        log::debug!("Starting encoder: {program} {}", args.join(" "));
        Self::spawn_command(program, &args, meta.frame_len())
    }

    fn spawn_command(program: &str, args: &[String], frame_len: usize) -> Result<Self, SinkError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd
            .spawn()
            .map_err(|source| SinkError::Spawn {
                program: program.to_string(),
                source,
            })?;
        let stdin = child.stdin.take();

        Ok(Self {
            child,
            stdin,
            frame_len,
            exit: None,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn wait_until(&mut self, deadline: Instant) -> Result<Option<SinkExit>, SinkError> {
        loop {
            if let Some(status) = self.child.try_wait().map_err(SinkError::Wait)? {
                return Ok(Some(SinkExit::Exited(status.code())));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

impl FrameSink for FfmpegProcessSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if frame.data().len() != self.frame_len {
            return Err(SinkError::FrameSize {
                expected: self.frame_len,
                actual: frame.data().len(),
            });
        }
        let stdin = self.stdin.as_mut().ok_or(SinkError::PipeClosed)?;

        if let Err(e) = stdin.write_all(frame.data()) {
            // The pipe is unusable after any write error.
            self.stdin = None;
            return Err(match e.kind() {
                ErrorKind::BrokenPipe => SinkError::PipeClosed,
                _ => SinkError::Write(e),
            });
        }
        Ok(())
    }

    fn close_and_wait(&mut self, timeout: Duration) -> Result<SinkExit, SinkError> {
        if let Some(exit) = self.exit {
            return Ok(exit);
        }

        // Dropping stdin sends EOF so the encoder can flush and finalize.
        self.stdin = None;

        let exit = match self.wait_until(Instant::now() + timeout)? {
            Some(exit) => exit,
            None => {
                log::warn!(
                    "Encoder (pid {}) did not exit within {:?}; killing it",
                    self.child.id(),
                    timeout
                );
                self.child.kill().map_err(SinkError::Wait)?;
                self.child.wait().map_err(SinkError::Wait)?;
                SinkExit::Killed
            }
        };

        self.exit = Some(exit);
        Ok(exit)
    }
}

impl Drop for FfmpegProcessSink {
    fn drop(&mut self) {
        if self.exit.is_none() {
            self.stdin = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const FRAME_LEN: usize = 4 * 4 * 3;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![index as u8; FRAME_LEN], 4, 4, index)
    }

    fn shell(script: &str) -> FfmpegProcessSink {
        FfmpegProcessSink::spawn_command("sh", &["-c".to_string(), script.to_string()], FRAME_LEN)
            .unwrap()
    }

    #[test]
    fn test_clean_exit_after_close() {
        let mut sink = shell("cat > /dev/null");
        for i in 0..10 {
            sink.write(&frame(i)).unwrap();
        }
        let exit = sink.close_and_wait(Duration::from_secs(5)).unwrap();
        assert_eq!(exit, SinkExit::Exited(Some(0)));
    }

    #[test]
    fn test_reports_exit_code() {
        let mut sink = shell("cat > /dev/null; exit 3");
        let exit = sink.close_and_wait(Duration::from_secs(5)).unwrap();
        assert_eq!(exit, SinkExit::Exited(Some(3)));
    }

    #[test]
    fn test_write_after_process_exit_fails() {
        let mut sink = shell("exit 0");

        let mut failure = None;
        for i in 0..200 {
            if let Err(e) = sink.write(&frame(i)) {
                failure = Some(e);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(failure, Some(SinkError::PipeClosed)));
        // Once broken, the sink stays broken.
        assert!(matches!(sink.write(&frame(0)), Err(SinkError::PipeClosed)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_encoder_runs_in_its_own_process_group() {
        let mut sink = shell("cat > /dev/null");
        let pid = sink.pid();

        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).unwrap();
        // Fields after the parenthesised command name: state, ppid, pgrp.
        let rest = &stat[stat.rfind(')').unwrap() + 2..];
        let pgrp: u32 = rest.split_whitespace().nth(2).unwrap().parse().unwrap();

        assert_eq!(pgrp, pid);
        sink.close_and_wait(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_unresponsive_process_is_killed() {
        let mut sink = shell("sleep 30");
        let started = Instant::now();

        let exit = sink.close_and_wait(Duration::from_millis(200)).unwrap();

        assert_eq!(exit, SinkExit::Killed);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut sink = shell("cat > /dev/null");
        let first = sink.close_and_wait(Duration::from_secs(5)).unwrap();
        let second = sink.close_and_wait(Duration::from_secs(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_wrong_frame_size() {
        let mut sink = shell("cat > /dev/null");
        let small = Frame::new(vec![0u8; 12], 2, 2, 0);
        assert!(matches!(
            sink.write(&small),
            Err(SinkError::FrameSize { expected: FRAME_LEN, actual: 12 })
        ));
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let result = FfmpegProcessSink::spawn_command("/nonexistent/ffmpeg", &[], FRAME_LEN);
        assert!(matches!(result, Err(SinkError::Spawn { .. })));
    }

    #[test]
    fn test_spawn_creates_hls_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hls").join("cam1");
        let meta = VideoMetadata {
            width: 4,
            height: 4,
            fps: 20.0,
            codec: String::new(),
            source: String::new(),
        };

        // `true` ignores its arguments, so only the side effects are checked.
        let mut sink = FfmpegProcessSink::spawn("true", &OutputSink::Hls(dir.clone()), &meta).unwrap();

        assert!(dir.is_dir());
        assert!(sink.pid() > 0);
        sink.close_and_wait(Duration::from_secs(5)).unwrap();
    }
}
