pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod relations;
pub mod tracing;

pub use error::{ErmError, Result};
