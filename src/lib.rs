pub mod classify;
pub mod config;
pub mod decode;
pub mod error;
pub mod fallback;
pub mod geo;
pub mod pipeline;
pub mod process;
pub mod sample;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{PipelineError, Result};
