//! Reader for Packer template modules.

use super::normalize::normalize;
use super::workspace::{stage, Workspace};
use super::ResourceReader;
use crate::config::{Config, StagingOptions};
use crate::error::{ModInfoError, Result};
use crate::parser::{HclMetadataParser, MetadataParser};
use crate::types::ResourceInfo;

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Reads the interface of Packer modules.
///
/// Packer templates (`*.pkr.hcl`) are not picked up by the metadata parser,
/// so each module is staged into a private workspace, its files renamed to
/// `*.pkr.hcl.tf` and the workspace parsed.
///
/// Results are cached per source identifier for the lifetime of the reader.
/// Concurrent calls for the same uncached source share one extraction.
/// Entries are never evicted.
pub struct PackerReader {
    parser: Arc<dyn MetadataParser>,
    staging: StagingOptions,
    cache: DashMap<String, Arc<OnceCell<ResourceInfo>>>,
}

impl PackerReader {
    /// Create a reader backed by the HCL metadata parser.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_parser(config, Arc::new(HclMetadataParser::new(config)))
    }

    /// Create a reader with a custom parser.
    #[must_use]
    pub fn with_parser(config: &Config, parser: Arc<dyn MetadataParser>) -> Self {
        Self {
            parser,
            staging: config.staging.clone(),
            cache: DashMap::new(),
        }
    }

    /// Whether `source` has a cached interface.
    #[must_use]
    pub fn is_cached(&self, source: &str) -> bool {
        self.cache
            .get(source)
            .is_some_and(|cell| cell.initialized())
    }

    /// All sources with a cached interface, sorted.
    #[must_use]
    pub fn cached_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .cache
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        sources.sort();
        sources
    }

    /// Stage, normalize and parse `source`.
    async fn extract(&self, source: &str) -> Result<ResourceInfo> {
        tracing::debug!(source = %source, "Extracting module metadata");

        let workspace = stage(Path::new(source), &self.staging)
            .await
            .map_err(|e| ModInfoError::module_read(source, e, file!(), line!()))?;

        let (workspace, result) = self.parse_workspace(workspace).await;
        workspace.teardown();

        let info = result.map_err(|e| ModInfoError::module_read(source, e, file!(), line!()))?;
        tracing::info!(
            source = %source,
            inputs = info.inputs.len(),
            outputs = info.outputs.len(),
            "Extracted module metadata"
        );
        Ok(info)
    }

    /// Normalize and parse; hands the workspace back for teardown.
    async fn parse_workspace(&self, mut workspace: Workspace) -> (Workspace, Result<ResourceInfo>) {
        let renamed = match normalize(workspace.files(), &self.staging.parser_extension).await {
            Ok(renamed) => renamed,
            Err(e) => {
                tracing::error!(
                    dir = %workspace.path().display(),
                    error = %e,
                    "Staging workspace is unusable"
                );
                return (workspace, Err(e));
            }
        };
        workspace.set_files(renamed);

        let result = self.parser.parse_metadata(workspace.path()).await;
        (workspace, result)
    }
}

#[async_trait]
impl ResourceReader for PackerReader {
    async fn get_info(&self, source: &str) -> Result<ResourceInfo> {
        let cell = Arc::clone(&self.cache.entry(source.to_string()).or_default());

        if let Some(info) = cell.get() {
            tracing::debug!(source = %source, "Module metadata cache hit");
            return Ok(info.clone());
        }

        match cell.get_or_try_init(|| self.extract(source)).await {
            Ok(info) => Ok(info.clone()),
            Err(e) => {
                // Drop the empty cell so failures leave no entry; the next
                // caller retries. A cell replaced by set_info is kept.
                self.cache.remove_if(source, |_, entry| {
                    Arc::ptr_eq(entry, &cell) && !entry.initialized()
                });
                Err(e)
            }
        }
    }

    fn set_info(&self, source: &str, info: ResourceInfo) {
        self.cache
            .insert(source.to_string(), Arc::new(OnceCell::new_with(Some(info))));
    }
}
