pub mod encoder_args;
pub mod ffmpeg_process_sink;
pub mod ffmpeg_reader;
