//! # tunepipe Common Library
//!
//! Shared code for the tunepipe relay including:
//! - Track and resolver wire types
//! - Common error type
//! - Configuration resolution (CLI > environment > TOML > defaults)

pub mod api;
pub mod config;
pub mod error;

pub use api::types::Track;
pub use config::Config;
pub use error::{Error, Result};
