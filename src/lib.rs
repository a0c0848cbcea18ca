//! # ModInfo
//!
//! Interface metadata extraction and validation for HCL infrastructure
//! modules.
//!
//! ModInfo determines which inputs a module accepts and which outputs it
//! produces without executing it, so a blueprint compiler can check module
//! wiring before generating deployable configuration.
//!
//! ## Features
//!
//! - **Isolated extraction**: module templates are staged into a private
//!   temporary workspace, renamed for the parser and always cleaned up
//! - **Per-run caching**: each module is extracted at most once per reader,
//!   even under concurrent requests
//! - **Error aggregation**: every problem in a blueprint is reported at
//!   once, each tagged with its blueprint location
//! - **Multiple output formats**: JSON and plain text
//!
//! ## Example
//!
//! ```rust,no_run
//! use modinfo::{Config, Inspector, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let inspector = Inspector::new(Config::default());
//!
//!     let report = inspector.inspect("./modules/packer/custom-image").await?;
//!     println!("{} inputs", report.info.inputs.len());
//!
//!     let text = inspector.render(&[report], OutputFormat::Text)?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod reporter;
pub mod types;
pub mod validate;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{BlueprintPath, ModInfoError, MultiError, PathError, Result};
pub use reader::{PackerReader, ResourceReader};
pub use types::{Blueprint, ModuleReport, OutputFormat, ResourceInfo};
pub use validate::BlueprintValidator;

use std::sync::Arc;

/// Entry point for using ModInfo as a library.
///
/// Owns one [`PackerReader`] for its whole lifetime, so every module is
/// extracted at most once no matter how many blueprints reference it.
pub struct Inspector {
    config: Config,
    reader: Arc<PackerReader>,
}

impl Inspector {
    /// Create a new inspector with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let reader = Arc::new(PackerReader::new(&config));
        Self { config, reader }
    }

    /// The shared reader.
    #[must_use]
    pub fn reader(&self) -> &Arc<PackerReader> {
        &self.reader
    }

    /// Extract the interface of the module at `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot be staged or parsed.
    pub async fn inspect(&self, source: &str) -> Result<ModuleReport> {
        tracing::info!(source = %source, "Inspecting module");
        let info = self.reader.get_info(source).await?;
        Ok(ModuleReport {
            source: source.to_string(),
            info,
        })
    }

    /// Extract the interfaces of several modules in order.
    ///
    /// Every source is attempted; failures do not stop the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns every failure: a single error as-is, several as
    /// [`ModInfoError::Multiple`].
    pub async fn inspect_all(&self, sources: &[String]) -> Result<Vec<ModuleReport>> {
        let mut errors = MultiError::new();
        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            if let Some(report) = errors.add_result(self.inspect(source).await) {
                reports.push(report);
            }
        }
        errors.into_result()?;
        Ok(reports)
    }

    /// Validate every module referenced by `blueprint`.
    ///
    /// # Errors
    ///
    /// Returns all collected validation errors.
    pub async fn validate(&self, blueprint: &Blueprint) -> Result<Vec<ModuleReport>> {
        let reader: Arc<dyn ResourceReader> = self.reader.clone();
        BlueprintValidator::new(reader, &self.config)
            .validate(blueprint)
            .await
    }

    /// Render module reports.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn render(&self, modules: &[ModuleReport], format: OutputFormat) -> Result<String> {
        reporter::Reporter::new(&self.config).generate(modules, format)
    }
}
