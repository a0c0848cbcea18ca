//! Extension normalization for staged files.

use crate::error::{Result, ResultExt};
use std::path::{Path, PathBuf};

/// `path` with `.extension` appended to its file name.
///
/// The existing extension is kept, so `image.pkr.hcl` becomes
/// `image.pkr.hcl.tf` and the original name stays recoverable.
#[must_use]
pub fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Rename every file in place so the metadata parser recognises it.
///
/// Returns the new paths in the same order.
///
/// # Errors
///
/// A failed rename is an `Environment` fault: the workspace is unusable and
/// extraction must stop.
pub async fn normalize(files: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut renamed = Vec::with_capacity(files.len());

    for file in files {
        let target = with_appended_extension(file, extension);
        tokio::fs::rename(file, &target)
            .await
            .as_environment_fault("rename staged file", file)?;
        tracing::debug!(from = %file.display(), to = %target.display(), "Normalized file extension");
        renamed.push(target);
    }

    Ok(renamed)
}
