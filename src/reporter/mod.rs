//! Report generation module.
//!
//! Renders extracted module interfaces in two formats:
//! - JSON: Machine-readable structured output
//! - Text: Human-readable CLI output
//!
//! # Example
//!
//! ```rust,no_run
//! use modinfo::reporter::Reporter;
//! use modinfo::types::{ModuleReport, OutputFormat, ResourceInfo};
//! use modinfo::Config;
//!
//! let reporter = Reporter::new(&Config::default());
//! let report = ModuleReport {
//!     source: "./modules/packer/custom-image".to_string(),
//!     info: ResourceInfo::default(),
//! };
//! let text = reporter.generate(&[report], OutputFormat::Text).unwrap();
//! println!("{text}");
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{ModuleReport, OutputFormat};

pub use json::JsonReporter;
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, modules: &[ModuleReport], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => JsonReporter::new(&self.config).generate(modules),
            OutputFormat::Text => TextReporter::new(&self.config).generate(modules),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report for the given modules.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, modules: &[ModuleReport]) -> Result<String>;
}
