// Public modules
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod minify;
pub mod package;
pub mod release;
pub mod replace;
pub mod timing;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
