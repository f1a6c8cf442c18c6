//! Configuration module for Sumi-Audit
//!
//! Configuration is layered: built-in defaults, an optional TOML file,
//! environment variables, then command-line flags. Validation runs once all
//! layers are applied.
//!
//! # Example
//!
//! ```no_run
//! use sumi_audit::config::{apply_env_overrides, load_config_file, validate};
//! use std::path::Path;
//!
//! let mut config = load_config_file(Path::new("audit.toml")).unwrap();
//! apply_env_overrides(&mut config, |key| std::env::var(key).ok()).unwrap();
//! validate(&config).unwrap();
//! println!("Crawling at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ProfilerConfig, PublishConfig, SeoConfig, SitemapConfig, TargetConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config_file, load_config_with_hash,
    parse_duration_ms, parse_viewport,
};
pub use validation::{validate, validate_website_url};
