// src/config/mod.rs

//! Flow files for the `dagwork` binary.
//!
//! - [`model`]: the TOML-backed data model.
//! - [`loader`]: reading a flow file from disk.
//! - [`validate`]: dependency and DAG checks turning a `RawFlowFile` into a
//!   `FlowFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigSection, FlowFile, RawFlowFile, TaskConfig, parse_duration};
pub use validate::validate_config;
