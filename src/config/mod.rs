//! Configuration module for Pagesift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; absent keys take the defaults of [`ScraperConfig`].
//!
//! # Example
//!
//! ```no_run
//! use pagesift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagesift.toml")).unwrap();
//! println!("Quota: {} requests per window", config.rate_limit.requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{RateLimitConfig, ScraperConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
