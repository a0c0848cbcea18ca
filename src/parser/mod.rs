//! Module metadata parsing.
//!
//! This module extracts the interface of a module (its `variable` and
//! `output` blocks) from a directory of HCL files.
//!
//! # Example
//!
//! ```rust,ignore
//! use modinfo::parser::{HclMetadataParser, MetadataParser};
//! use modinfo::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let parser = HclMetadataParser::new(&Config::default());
//!     let info = parser.parse_metadata("./staged".as_ref()).await?;
//!     println!("Found {} inputs", info.inputs.len());
//!     Ok(())
//! }
//! ```

mod hcl;

pub use self::hcl::HclMetadataParser;

use crate::types::ResourceInfo;
use async_trait::async_trait;
use std::path::Path;

/// Extracts a module's interface from a directory of template files.
///
/// Readers take this as an injected capability so staging and caching can
/// be exercised with deterministic stubs. Implementations must return the
/// same result for identical directory contents.
#[async_trait]
pub trait MetadataParser: Send + Sync {
    /// Parse every recognised file directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, a file is not
    /// valid HCL, or a name is declared twice.
    async fn parse_metadata(&self, dir: &Path) -> crate::Result<ResourceInfo>;
}
