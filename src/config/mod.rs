//! Configuration module for ptt-crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a missing file falls back to `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use ptt_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ptt-crawler.toml")).unwrap();
//! println!("Pages are spaced {}ms apart", config.crawler.page_delay);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
