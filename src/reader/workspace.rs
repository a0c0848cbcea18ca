//! Disposable staging workspaces.
//!
//! A module's template files are copied into a fresh temporary directory
//! before they are touched, so renaming and parsing never affect the source.

use crate::config::StagingOptions;
use crate::error::{ModInfoError, Result, ResultExt};

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

const LIST_SOURCE: &str = "list source directory";

/// A temporary directory holding staged copies of a module's files.
///
/// The directory is removed by [`Workspace::teardown`], or on drop if
/// teardown was never called.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Workspace {
    /// The workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Staged files, in source file name order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Replace the tracked file list after files were renamed in place.
    pub(crate) fn set_files(&mut self, files: Vec<PathBuf>) {
        self.files = files;
    }

    /// Recursively remove the workspace.
    ///
    /// Failures are logged and otherwise ignored: a leaked temp directory is
    /// not worth masking the caller's real result.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        log_removal(&self.root, dir.close());
    }
}

/// Recursively remove a workspace directory by path.
///
/// A directory that is already gone counts as removed. Other failures are
/// logged and otherwise ignored.
pub fn teardown(dir: &Path) {
    log_removal(dir, std::fs::remove_dir_all(dir));
}

fn log_removal(dir: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(dir = %dir.display(), "Removed staging workspace"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Staging workspace already removed");
        }
        Err(e) => tracing::warn!(
            dir = %dir.display(),
            error = %e,
            "Failed to remove staging workspace"
        ),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copy the whitelisted files directly inside `source_dir` into a new
/// workspace.
///
/// Sub-directories are not descended into. File names are preserved and
/// contents are copied byte for byte.
///
/// # Errors
///
/// - `Environment` if `source_dir` cannot be listed
/// - `Io` if the workspace cannot be created or a file cannot be opened,
///   created or copied; the partial workspace is removed first
pub async fn stage(source_dir: &Path, options: &StagingOptions) -> Result<Workspace> {
    let selected = select_files(source_dir, &options.extensions).await?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(&options.temp_prefix);
    let dir = match &options.temp_root {
        Some(root) => builder.tempdir_in(root).with_path(root)?,
        None => builder.tempdir().with_path(std::env::temp_dir())?,
    };

    let mut workspace = Workspace {
        root: dir.path().to_path_buf(),
        dir: Some(dir),
        files: Vec::with_capacity(selected.len()),
    };
    tracing::debug!(
        source = %source_dir.display(),
        dir = %workspace.root.display(),
        files = selected.len(),
        "Created staging workspace"
    );

    for source_file in selected {
        let Some(file_name) = source_file.file_name() else {
            continue;
        };
        let destination = workspace.root.join(file_name);
        let bytes = copy_file(&source_file, &destination).await?;
        tracing::debug!(
            file = %source_file.display(),
            bytes,
            "Staged file"
        );
        workspace.files.push(destination);
    }

    Ok(workspace)
}

/// Regular files directly inside `dir` whose extension is whitelisted,
/// sorted by path.
async fn select_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .as_environment_fault(LIST_SOURCE, dir)?;

    let mut selected = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .as_environment_fault(LIST_SOURCE, dir)?
    {
        let path = entry.path();
        if !has_extension(&path, extensions) {
            continue;
        }
        // follows symlinks, so a link to a regular file is staged too
        let metadata = tokio::fs::metadata(&path).await.with_path(&path)?;
        if metadata.is_file() {
            selected.push(path);
        }
    }

    selected.sort();
    Ok(selected)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

async fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader = tokio::fs::File::open(source).await.with_path(source)?;
    let mut writer = tokio::fs::File::create(destination)
        .await
        .with_path(destination)?;

    let bytes = tokio::io::copy(&mut reader, &mut writer)
        .await
        .map_err(|e| ModInfoError::io(source, e, file!(), line!()))?;
    writer.flush().await.with_path(destination)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn options_in(root: &Path) -> StagingOptions {
        StagingOptions {
            temp_root: Some(root.to_path_buf()),
            ..StagingOptions::default()
        }
    }

    fn file_names(workspace: &Workspace) -> Vec<String> {
        workspace
            .files()
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test_case("image.pkr.hcl", true ; "packer template")]
    #[test_case("vars.hcl", true ; "plain hcl")]
    #[test_case("main.tf", false ; "terraform file")]
    #[test_case("README.md", false ; "documentation")]
    #[test_case("hcl", false ; "no extension")]
    fn test_has_extension(name: &str, expected: bool) {
        assert_eq!(has_extension(Path::new(name), &["hcl".to_string()]), expected);
    }

    #[tokio::test]
    async fn test_stage_copies_only_whitelisted_files() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("image.pkr.hcl"), "variable \"a\" {}\n").unwrap();
        std::fs::write(source.path().join("variables.pkr.hcl"), "variable \"b\" {}\n").unwrap();
        std::fs::write(source.path().join("install.sh"), "#!/bin/sh\n").unwrap();
        std::fs::write(source.path().join("README.md"), "# docs\n").unwrap();
        std::fs::create_dir(source.path().join("nested.hcl")).unwrap();
        std::fs::create_dir(source.path().join("sub")).unwrap();
        std::fs::write(source.path().join("sub/deep.pkr.hcl"), "").unwrap();

        let workspace = stage(source.path(), &options_in(scratch.path())).await.unwrap();

        assert!(workspace.path().starts_with(scratch.path()));
        assert_eq!(file_names(&workspace), vec!["image.pkr.hcl", "variables.pkr.hcl"]);
        assert_eq!(
            std::fs::read_to_string(&workspace.files()[0]).unwrap(),
            "variable \"a\" {}\n"
        );
        // the source is untouched
        assert!(source.path().join("image.pkr.hcl").exists());
    }

    #[tokio::test]
    async fn test_stage_uses_prefix() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();

        let workspace = stage(source.path(), &options_in(scratch.path())).await.unwrap();

        let name = workspace.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pkwriter-"), "unexpected name {name}");
        assert!(workspace.files().is_empty());
    }

    #[tokio::test]
    async fn test_stage_missing_source_is_environment_fault() {
        let scratch = tempfile::tempdir().unwrap();
        let missing = scratch.path().join("does-not-exist");

        let result = stage(&missing, &options_in(scratch.path())).await;

        assert!(matches!(result, Err(ModInfoError::Environment { .. })));
        // nothing but the (missing) source path in the scratch root
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_stage_unusable_temp_root_is_io_error() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let not_a_dir = scratch.path().join("file");
        std::fs::write(&not_a_dir, "").unwrap();

        let result = stage(source.path(), &options_in(&not_a_dir)).await;
        assert!(matches!(result, Err(ModInfoError::Io { .. })));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stage_copy_failure_removes_partial_workspace() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.hcl"), "variable \"a\" {}\n").unwrap();
        std::os::unix::fs::symlink("/proc/self/mem", source.path().join("b.hcl")).unwrap();

        let result = stage(source.path(), &options_in(scratch.path())).await;

        assert!(matches!(result, Err(ModInfoError::Io { .. })));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_removes_workspace() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.hcl"), "").unwrap();

        let workspace = stage(source.path(), &options_in(scratch.path())).await.unwrap();
        let dir = workspace.path().to_path_buf();
        assert!(dir.join("a.hcl").exists());

        workspace.teardown();
        assert!(!dir.exists());
    }

    #[test]
    fn test_teardown_by_path_is_idempotent() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path().join("pkwriter-manual");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/a.hcl.tf"), "").unwrap();

        teardown(&dir);
        assert!(!dir.exists());

        // already gone
        teardown(&dir);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_teardown_after_external_removal() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();

        let workspace = stage(source.path(), &options_in(scratch.path())).await.unwrap();
        teardown(workspace.path());
        workspace.teardown();

        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_workspace() {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();

        let dir = {
            let workspace = stage(source.path(), &options_in(scratch.path())).await.unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!dir.exists());
    }
}
