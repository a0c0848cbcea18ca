//! Configuration module for ModInfo.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`modinfo.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # modinfo.yaml
//!
//! # Staging options
//! staging:
//!   extensions: ["hcl"]
//!   parser_extension: tf
//!   temp_prefix: pkwriter-
//!   temp_root: ${TMPDIR}
//!
//! # Validation options
//! validation:
//!   fail_on_unknown_settings: true
//!   require_required_inputs: true
//!   max_concurrency: 8
//!
//! # Output options
//! output:
//!   colored: true
//!   verbose: false
//!   pretty: true
//! ```

use crate::error::{ModInfoError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for staging module sources into a temporary workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingOptions {
    /// File extensions (without the leading dot) copied into the workspace.
    pub extensions: Vec<String>,

    /// Extension appended to staged files so the metadata parser reads them.
    pub parser_extension: String,

    /// Name prefix of the temporary workspace directory.
    pub temp_prefix: String,

    /// Parent directory for workspaces (system temp dir if unset).
    pub temp_root: Option<PathBuf>,
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["hcl".to_string()],
            parser_extension: "tf".to_string(),
            temp_prefix: "pkwriter-".to_string(),
            temp_root: None,
        }
    }
}

/// Blueprint validation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Report settings that are not declared inputs of the module.
    #[serde(default = "default_true")]
    pub fail_on_unknown_settings: bool,

    /// Report required inputs missing from a module's settings.
    #[serde(default = "default_true")]
    pub require_required_inputs: bool,

    /// Maximum number of modules read concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            fail_on_unknown_settings: true,
            require_required_inputs: true,
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    #[serde(default = "default_true")]
    pub colored: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            verbose: false,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Staging options
    pub staging: StagingOptions,

    /// Validation options
    pub validation: ValidationOptions,

    /// Output options
    pub output: OutputOptions,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Config = serde_yaml::from_str(&expanded).map_err(|e| {
            ModInfoError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;
        config.validate()?;

        tracing::debug!(
            extensions = ?config.staging.extensions,
            parser_extension = %config.staging.parser_extension,
            max_concurrency = config.validation.max_concurrency,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Check value ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.staging.extensions.is_empty() {
            return Err(crate::err!(ConfigValue {
                key: "staging.extensions".to_string(),
                message: "at least one extension is required".to_string(),
            }));
        }
        if let Some(ext) = self
            .staging
            .extensions
            .iter()
            .chain(std::iter::once(&self.staging.parser_extension))
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(crate::err!(ConfigValue {
                key: "staging".to_string(),
                message: format!("extension '{ext}' must be non-empty and given without a leading dot"),
            }));
        }
        if self.validation.max_concurrency == 0 {
            return Err(crate::err!(ConfigValue {
                key: "validation.max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# ModInfo Configuration File

# Staging options (how module sources are copied before parsing)
staging:
  # Extensions of the module's template files (no leading dot)
  extensions:
    - hcl

  # Extension appended to staged files so the parser picks them up
  parser_extension: tf

  # Prefix of the temporary workspace directory name
  temp_prefix: pkwriter-

  # Parent directory for workspaces (default: system temp dir)
  # temp_root: ${TMPDIR}

# Validation options
validation:
  # Report settings that the module does not declare as inputs
  fail_on_unknown_settings: true

  # Report required inputs that have no setting
  require_required_inputs: true

  # Maximum number of modules read concurrently
  max_concurrency: 8

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Enable verbose output
  verbose: false

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::GlobalOverrides) {
        if let Some(ref root) = args.temp_root {
            self.staging.temp_root = Some(root.clone());
        }
        if let Some(max) = args.max_concurrency {
            self.validation.max_concurrency = max.max(1);
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    let braced = regex::Regex::new(r"\$\{([^}]+)\}").expect("valid regex");
    for cap in braced.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    let bare = regex::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex");
    for cap in bare.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.staging.extensions, vec!["hcl".to_string()]);
        assert_eq!(config.staging.parser_extension, "tf");
        assert_eq!(config.staging.temp_prefix, "pkwriter-");
        assert!(config.validation.fail_on_unknown_settings);
        assert_eq!(config.validation.max_concurrency, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml_nested() {
        let yaml = r#"
staging:
  extensions: ["hcl", "pkrvars"]
  temp_root: /var/tmp
validation:
  fail_on_unknown_settings: false
  max_concurrency: 2
output:
  colored: false
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.staging.extensions.len(), 2);
        assert_eq!(config.staging.parser_extension, "tf");
        assert_eq!(config.staging.temp_root, Some(PathBuf::from("/var/tmp")));
        assert!(!config.validation.fail_on_unknown_settings);
        assert!(config.validation.require_required_inputs);
        assert_eq!(config.validation.max_concurrency, 2);
        assert!(!config.output.colored);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_config_rejects_dotted_extension() {
        let yaml = r#"
staging:
  extensions: [".hcl"]
"#;
        let result = Config::from_yaml(yaml);
        assert!(matches!(result, Err(ModInfoError::ConfigValue { .. })));
    }

    #[test]
    fn test_config_rejects_zero_concurrency() {
        let yaml = r#"
validation:
  max_concurrency: 0
"#;
        let result = Config::from_yaml(yaml);
        assert!(matches!(result, Err(ModInfoError::ConfigValue { key, .. }) if key == "validation.max_concurrency"));
    }

    #[test]
    fn test_config_invalid_yaml() {
        let result = Config::from_yaml("staging: [");
        assert!(matches!(result, Err(ModInfoError::ConfigParse { .. })));
    }

    #[test]
    fn test_env_var_expansion() {
        // Unset variables stay untouched
        let expanded = expand_env_vars("temp_root: ${MODINFO_SURELY_UNSET_VAR}");
        assert_eq!(expanded, "temp_root: ${MODINFO_SURELY_UNSET_VAR}");

        assert_eq!(expand_env_vars("no vars here"), "no vars here");
        assert_eq!(expand_env_vars("$MODINFO_NOTAVAR123"), "$MODINFO_NOTAVAR123");

        std::env::set_var("MODINFO_TEST_TEMP_ROOT", "/var/tmp/modinfo");
        assert_eq!(
            expand_env_vars("a: ${MODINFO_TEST_TEMP_ROOT}\nb: $MODINFO_TEST_TEMP_ROOT/ws"),
            "a: /var/tmp/modinfo\nb: /var/tmp/modinfo/ws"
        );
    }

    #[test]
    fn test_env_var_expansion_in_config() {
        std::env::set_var("MODINFO_TEST_PREFIX", "bp-");
        let config = Config::from_yaml("staging:\n  temp_prefix: ${MODINFO_TEST_PREFIX}\n").unwrap();
        assert_eq!(config.staging.temp_prefix, "bp-");
    }

    #[test]
    fn test_example_yaml_is_valid() {
        let config = Config::from_yaml(&Config::example_yaml()).unwrap();
        assert_eq!(config.staging.parser_extension, "tf");
    }
}
