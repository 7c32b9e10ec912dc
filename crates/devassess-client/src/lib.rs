//! devassess-client — Assessment backend integrations.
//!
//! Implements the `AssessmentApi` trait over JSON/HTTP and as an in-memory
//! mock, and loads the configuration that selects between them.

pub mod config;
pub mod dto;
pub mod http;
pub mod mock;

pub use config::{
    create_api, load_config, load_config_from, open_session_store, Backend, ClientConfig,
};
pub use http::HttpApi;
pub use mock::MockApi;
