use facestream_config::domain::stream_config::InputSource;

use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

/// Decodes frames from a file or network stream via ffmpeg-next
/// (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`]. The
/// output geometry is fixed by the first decoded frame; later frames are
/// rescaled to it if the stream changes resolution mid-run.
pub struct FfmpegReader {
    decoding: Option<Decoding>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

struct Decoding {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
    scaler: Option<Scaler>,
    /// Output geometry, settled on the first decoded frame.
    size: Option<(u32, u32)>,
    next_index: usize,
    flushing: bool,
    done: bool,
}

/// A scaler together with the input format it was built for.
struct Scaler {
    context: scaling::Context,
    input: (Pixel, u32, u32),
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { decoding: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &InputSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if let InputSource::File(path) = source {
            if !path.is_file() {
                return Err(format!("Input file not found: {}", path.display()).into());
            }
        }

        ffmpeg_next::init()?;
        if matches!(source, InputSource::Rtmp(_)) {
            ffmpeg_next::format::network::init();
        }

        let locator = source.locator();
        let ictx = ffmpeg_next::format::input(&locator)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.avg_frame_rate();
        let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
            rate
        } else {
            stream.rate()
        };
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: locator,
        };

        log::debug!(
            "Opened {source}: {}x{} @ {:.2} fps ({})",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        self.decoding = Some(Decoding {
            ictx,
            decoder,
            stream_index,
            scaler: None,
            size: None,
            next_index: 0,
            flushing: false,
            done: false,
        });

        Ok(metadata)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let decoding = self.decoding.as_mut().ok_or("FfmpegReader: not opened")?;
        decoding.next_frame()
    }

    fn close(&mut self) {
        self.decoding = None;
    }
}

impl Decoding {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(frame) = self.try_receive()? {
                    return Ok(Some(frame));
                }
                self.done = true;
                return Ok(None);
            };

            if stream.index() != self.stream_index {
                continue;
            }

            // Corrupt packets are common on live inputs; drop them.
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let (width, height) = *self
            .size
            .get_or_insert((decoded.width(), decoded.height()));
        let input = (decoded.format(), decoded.width(), decoded.height());

        let scaler = match self.scaler.take() {
            Some(s) if s.input == input => s,
            _ => Scaler {
                context: scaling::Context::get(
                    input.0,
                    input.1,
                    input.2,
                    Pixel::RGB24,
                    width,
                    height,
                    scaling::Flags::BILINEAR,
                )?,
                input,
            },
        };
        let scaler = self.scaler.insert(scaler);

        let mut rgb_frame = Video::empty();
        scaler.context.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * CHANNELS;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}
