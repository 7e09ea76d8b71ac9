//! Configuration management
//!
//! Values are merged from several sources, highest priority first:
//!
//! 1. Environment variables (`RETAILER_*`)
//! 2. Project `retailer.json` (`config` section)
//! 3. Global `config.json` in the retailer home directory
//! 4. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use retailer_core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::build(Some(Path::new("/path/to/project")), true).unwrap();
//! let vendor = config.vendor().unwrap();
//! println!("Packages are published as {}/<slug>", vendor);
//! ```

mod config;
mod source;

pub use config::Config;
pub use source::{ConfigLoader, ConfigSource, RawConfig, PROJECT_CONFIG_FILE};
