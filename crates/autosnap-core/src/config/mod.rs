//! # Configuration System
//!
//! Hierarchical TOML configuration for autosnap.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Hardcoded defaults**
//! 2. **User config** - `~/.autosnap/config.toml`
//! 3. **Project config** - `./.autosnap/config.toml`
//! 4. **Environment** - `AUTO_SNAP_*` variables
//! 5. **Tool arguments** - highest priority
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use autosnap_core::config::{PathResolver, SnapConfig};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SnapConfig::load_hierarchy()?;
//!     let resolver = PathResolver::new(&config);
//!     let dir = resolver.output_dir(None)?;
//!     println!("{}", dir.display());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod paths;
pub mod types;
pub mod validation;

pub use paths::{CaptureKind, PathResolver, sanitize_filename};
pub use types::{
    CaptureConfig, CleanupConfig, ImageFormat, NamingConfig, OutputConfig, PdfConfig, SnapConfig,
    TimestampFormat, Timeouts,
};
pub use validation::validate_config;

impl SnapConfig {
    /// Load configuration from config files and the environment.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
