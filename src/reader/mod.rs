//! Module interface readers.
//!
//! A reader turns a module source identifier into the module's
//! [`ResourceInfo`]. Callers depend only on the [`ResourceReader`] trait, so
//! backends are interchangeable.
//!
//! # Architecture
//!
//! ```text
//! get_info(source)
//!   │  cache hit ───────────────────────────────► ResourceInfo
//!   ▼
//! workspace::stage(source)      copy *.hcl into a fresh temp dir
//!   ▼
//! normalize::normalize(files)   *.hcl → *.hcl.tf
//!   ▼
//! MetadataParser::parse_metadata(workspace)
//!   ▼
//! Workspace::teardown()         always, once a workspace exists
//!   ▼
//! cache store ──────────────────────────────────► ResourceInfo
//! ```

pub mod normalize;
pub mod workspace;

mod packer;

pub use packer::PackerReader;
pub use workspace::{stage, teardown, Workspace};

use crate::types::ResourceInfo;
use async_trait::async_trait;

/// The capability every reader backend exposes.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Return the interface of the module at `source`.
    ///
    /// Repeated calls for the same `source` are served from the reader's
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot be staged or parsed. Nothing is
    /// cached in that case.
    async fn get_info(&self, source: &str) -> crate::Result<ResourceInfo>;

    /// Seed the cache for `source`, bypassing extraction.
    fn set_info(&self, source: &str, info: ResourceInfo);
}
