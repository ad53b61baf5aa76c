pub mod config_error;
pub mod config_resolver;
pub mod config_store;
pub mod stored_stream_config;
pub mod stream_config;
