//! Error types for ModInfo.
//!
//! This module defines the error hierarchy using `thiserror`. Besides the
//! crate-wide [`ModInfoError`] enum it provides two composable wrappers used
//! by every validation path:
//!
//! - [`PathError`]: tags an error with the [`BlueprintPath`] it originated at
//! - [`MultiError`]: an ordered, always-flat collection of independent errors
//!
//! # Error Categories
//!
//! - **Environment faults**: the staging workspace or source directory is
//!   unusable (listing or renaming failed). See
//!   [`ModInfoError::is_environment_fault`].
//! - **IO errors**: opening, creating or copying individual files
//! - **Parse errors**: HCL syntax errors, duplicate declarations
//! - **Validation errors**: unknown settings, missing inputs
//! - **Config errors**: invalid configuration or blueprint files
//!
//! # Example
//!
//! ```rust
//! use modinfo::error::{BlueprintPath, ModInfoError, MultiError, PathError};
//!
//! let mut errors = MultiError::new();
//! errors.add(ModInfoError::from(PathError::new(
//!     BlueprintPath::from("modules[0].source"),
//!     ModInfoError::Internal {
//!         message: "boom".to_string(),
//!         src_path: file!(),
//!         src_line: line!(),
//!     },
//! )));
//! assert!(errors.into_result().is_err());
//! ```

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigMissing { key: "api_key".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::ModInfoError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for ModInfo operations.
pub type Result<T> = std::result::Result<T, ModInfoError>;

/// The main error type for ModInfo.
#[derive(Error, Debug)]
pub enum ModInfoError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The execution environment is broken: a source directory could not be
    /// listed or a staged file could not be renamed.
    #[error("Environment fault while trying to {operation} '{path}' ({src_path}:{src_line}): {source}")]
    Environment {
        /// What was being attempted
        operation: &'static str,
        /// The path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // HCL Parsing Errors
    // =========================================================================
    /// HCL parsing error.
    #[error("Failed to parse HCL in '{file}' \n\t({src_path}:{src_line}): {message}")]
    HclParse {
        /// The file being parsed
        file: PathBuf,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A variable or output is declared more than once.
    #[error("Duplicate {kind} '{name}' declared in '{file}' ({src_path}:{src_line})")]
    DuplicateName {
        /// "variable" or "output"
        kind: &'static str,
        /// The repeated name
        name: String,
        /// The file holding the second declaration
        file: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Reading the interface of a module failed.
    #[error("Failed to read module info for '{module_source}' ({src_path}:{src_line}): {source}")]
    ModuleRead {
        /// The module source identifier
        module_source: String,
        /// What went wrong
        #[source]
        source: Box<ModInfoError>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// A module was given a setting it does not declare.
    #[error("Invalid setting '{setting}' provided to module '{module}' ({src_path}:{src_line})")]
    InvalidSetting {
        /// Module id
        module: String,
        /// The unknown setting name
        setting: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A required module input has no value.
    #[error("Module '{module}' is missing required input '{input}' ({src_path}:{src_line})")]
    MissingInput {
        /// Module id
        module: String,
        /// The required variable name
        input: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Two modules share the same id.
    #[error("Duplicate module id '{id}' ({src_path}:{src_line})")]
    DuplicateModuleId {
        /// The repeated id
        id: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Blueprint file parsing error.
    #[error("Failed to parse blueprint '{path}' ({src_path}:{src_line}): {message}")]
    BlueprintParse {
        /// The blueprint file
        path: PathBuf,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// An error tagged with its location in the blueprint.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Multiple independent errors occurred.
    #[error(transparent)]
    Multiple(#[from] MultiError),
}

impl ModInfoError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates an `Environment` error.
    #[must_use]
    pub fn environment(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::Environment { operation, path: path.into(), source, src_path, src_line }
    }

    /// Creates a `ModuleRead` error wrapping `source`.
    #[must_use]
    pub fn module_read(module_source: impl Into<String>, source: Self, src_path: &'static str, src_line: u32) -> Self {
        Self::ModuleRead {
            module_source: module_source.into(),
            source: Box::new(source),
            src_path,
            src_line,
        }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Whether this error (or anything it wraps) signals a broken execution
    /// environment rather than bad input.
    #[must_use]
    pub fn is_environment_fault(&self) -> bool {
        match self {
            Self::Environment { .. } => true,
            Self::ModuleRead { source, .. } => source.is_environment_fault(),
            Self::Path(e) => e.inner().is_environment_fault(),
            Self::Multiple(m) => m.iter().any(Self::is_environment_fault),
            _ => false,
        }
    }

    /// Determines if the error is recoverable, i.e. other modules can still
    /// be processed after it.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. }
            | Self::DirectoryNotFound { .. }
            | Self::HclParse { .. }
            | Self::DuplicateName { .. }
            | Self::InvalidSetting { .. }
            | Self::MissingInput { .. }
            | Self::DuplicateModuleId { .. }
            | Self::BlueprintParse { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigValue { .. } => true,
            Self::ModuleRead { source, .. } => source.is_recoverable(),
            Self::Path(e) => e.inner().is_recoverable(),
            Self::Multiple(m) => m.iter().all(Self::is_recoverable),
            _ => false,
        }
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::DirectoryNotFound { .. } => 15,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::Multiple(m) if m.iter().any(Self::is_environment_fault) => 23,
            Self::Multiple(_) => 21,
            Self::Environment { .. } => 23,
            Self::ModuleRead { source, .. } => source.exit_code(),
            Self::Path(e) => e.inner().exit_code(),
            _ => 1,
        }
    }
}

/// Extension trait for I/O results to attach path context.
pub trait ResultExt<T> {
    /// Converts an I/O error into [`ModInfoError::Io`] at `path`, recording
    /// the caller's source location.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Converts an I/O error into [`ModInfoError::Environment`].
    fn as_environment_fault(self, operation: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    #[track_caller]
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| ModInfoError::io(path, e, location.file(), location.line()))
    }

    #[track_caller]
    fn as_environment_fault(self, operation: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| ModInfoError::environment(operation, path, e, location.file(), location.line()))
    }
}

impl From<std::io::Error> for ModInfoError {
    fn from(source: std::io::Error) -> Self {
        // Prefer ModInfoError::io(path, ..) when the path is known
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_json::Error> for ModInfoError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {}", source),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

// =============================================================================
// Blueprint locations
// =============================================================================

/// Where in a blueprint something lives, e.g. `modules[0].settings.zone`.
///
/// Opaque to the error model; only rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BlueprintPath(String);

impl BlueprintPath {
    /// Path of the `index`-th module.
    #[must_use]
    pub fn module(index: usize) -> Self {
        Self(format!("modules[{index}]"))
    }

    /// Append a field access.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// The rendered path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlueprintPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlueprintPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlueprintPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An error augmented with the blueprint location it originated at.
///
/// Renders as `"<path>: <message>"`.
#[derive(Debug)]
pub struct PathError {
    path: BlueprintPath,
    err: Box<ModInfoError>,
}

impl PathError {
    /// Tag `err` with `path`.
    #[must_use]
    pub fn new(path: impl Into<BlueprintPath>, err: ModInfoError) -> Self {
        Self {
            path: path.into(),
            err: Box::new(err),
        }
    }

    /// The location.
    #[must_use]
    pub fn path(&self) -> &BlueprintPath {
        &self.path
    }

    /// The wrapped error.
    #[must_use]
    pub fn inner(&self) -> &ModInfoError {
        &self.err
    }

    /// Unwrap into the wrapped error, dropping the location.
    #[must_use]
    pub fn into_inner(self) -> ModInfoError {
        *self.err
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.err)
    }
}

impl std::error::Error for PathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.err.as_ref())
    }
}

/// Ordered collection of independent errors.
///
/// Adding a [`ModInfoError::Multiple`] splices its elements instead of
/// nesting, so a `MultiError` is always one level deep.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<ModInfoError>,
}

impl MultiError {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error. `None` is a no-op; a `Multiple` is flattened.
    pub fn add(&mut self, err: impl Into<Option<ModInfoError>>) -> &mut Self {
        match err.into() {
            None => {}
            Some(ModInfoError::Multiple(multi)) => self.errors.extend(multi.errors),
            Some(err) => self.errors.push(err),
        }
        self
    }

    /// Add an error tagged with `path`. The elements of a `Multiple` are
    /// each tagged individually.
    pub fn add_at(&mut self, path: &BlueprintPath, err: ModInfoError) -> &mut Self {
        match err {
            ModInfoError::Multiple(multi) => {
                for err in multi.errors {
                    self.errors
                        .push(ModInfoError::Path(PathError::new(path.clone(), err)));
                }
            }
            err => self.errors.push(ModInfoError::Path(PathError::new(path.clone(), err))),
        }
        self
    }

    /// Record the error of `result`, if any, and pass its value through.
    pub fn add_result<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.add(err);
                None
            }
        }
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if there are any errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModInfoError> {
        self.errors.iter()
    }

    /// Take the collected errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<ModInfoError> {
        self.errors
    }

    /// `Ok(())` when empty, the sole error itself when there is exactly one,
    /// otherwise the whole collection.
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ModInfoError::Multiple(self)),
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors encountered:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a ModInfoError;
    type IntoIter = std::slice::Iter<'a, ModInfoError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
