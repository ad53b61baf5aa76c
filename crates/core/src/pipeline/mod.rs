pub mod annotate_stream_use_case;
pub mod face_labeler;
pub mod pipeline_logger;
pub mod stream_endpoints;
