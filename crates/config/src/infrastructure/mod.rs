pub mod file_config_store;
pub mod http_config_store;
