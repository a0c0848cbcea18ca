//! HCL metadata parser implementation.
//!
//! This module reads `variable` and `output` blocks using the `hcl-rs` crate.

use crate::config::Config;
use crate::error::{ModInfoError, Result, ResultExt};
use crate::parser::MetadataParser;
use crate::types::{OutputInfo, ResourceInfo, VariableInfo};

use async_trait::async_trait;
use hcl::{Block, Body, Expression};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// HCL parser for module interfaces.
///
/// Only files directly inside the directory with the configured parser
/// extension (`tf` by default) are read, in file name order.
pub struct HclMetadataParser {
    /// Extension of files to read, without the dot
    extension: String,
}

impl HclMetadataParser {
    /// Create a new parser with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            extension: config.staging.parser_extension.clone(),
        }
    }

    /// List the files to parse, sorted by name.
    fn module_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(crate::err!(DirectoryNotFound {
                path: dir.to_path_buf(),
            }));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                ModInfoError::io(path, source, file!(), line!())
            })?;

            if entry.file_type().is_file() && self.is_module_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn is_module_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    /// Parse one file's contents into `info`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid HCL or re-declares a
    /// name already present in `info`.
    pub fn parse_content(&self, content: &str, file_path: &Path, info: &mut ResourceInfo) -> Result<()> {
        let body: Body = hcl::from_str(content).map_err(|e| crate::err!(HclParse {
            file: file_path.to_path_buf(),
            message: e.to_string(),
        }))?;

        for structure in body.into_inner() {
            if let hcl::Structure::Block(block) = structure {
                match block.identifier.as_str() {
                    "variable" => {
                        let variable = parse_variable_block(&block, file_path)?;
                        if info.input(&variable.name).is_some() {
                            return Err(crate::err!(DuplicateName {
                                kind: "variable",
                                name: variable.name,
                                file: file_path.to_path_buf(),
                            }));
                        }
                        info.inputs.push(variable);
                    }
                    "output" => {
                        let output = parse_output_block(&block, file_path)?;
                        if info.output(&output.name).is_some() {
                            return Err(crate::err!(DuplicateName {
                                kind: "output",
                                name: output.name,
                                file: file_path.to_path_buf(),
                            }));
                        }
                        info.outputs.push(output);
                    }
                    _ => {
                        // source, build, locals, packer, ... carry no interface
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl MetadataParser for HclMetadataParser {
    async fn parse_metadata(&self, dir: &Path) -> Result<ResourceInfo> {
        let mut info = ResourceInfo::default();

        for file_path in self.module_files(dir)? {
            tracing::debug!(file = %file_path.display(), "Parsing file");
            let content = tokio::fs::read_to_string(&file_path)
                .await
                .with_path(&file_path)?;
            self.parse_content(&content, &file_path, &mut info)?;
        }

        tracing::debug!(
            dir = %dir.display(),
            inputs = info.inputs.len(),
            outputs = info.outputs.len(),
            "Parsing complete"
        );

        Ok(info)
    }
}

/// Name of a `variable`/`output` block from its single label.
fn block_name(block: &Block, file_path: &Path) -> Result<String> {
    match block.labels.as_slice() {
        [label] => Ok(label.as_str().to_string()),
        labels => Err(crate::err!(HclParse {
            file: file_path.to_path_buf(),
            message: format!(
                "{} block must have exactly one label, found {}",
                block.identifier.as_str(),
                labels.len()
            ),
        })),
    }
}

/// Parse a variable block into a `VariableInfo`.
fn parse_variable_block(block: &Block, file_path: &Path) -> Result<VariableInfo> {
    let name = block_name(block, file_path)?;

    let type_description = block
        .body
        .attributes()
        .find(|attr| attr.key.as_str() == "type")
        .map_or_else(|| "any".to_string(), |attr| render_expression(&attr.expr));

    let has_default = block
        .body
        .attributes()
        .any(|attr| attr.key.as_str() == "default");

    Ok(VariableInfo {
        name,
        type_description,
        has_default,
        required: !has_default,
        description: get_string_attribute(&block.body, "description"),
    })
}

/// Parse an output block into an `OutputInfo`.
fn parse_output_block(block: &Block, file_path: &Path) -> Result<OutputInfo> {
    let name = block_name(block, file_path)?;

    let sensitive = block
        .body
        .attributes()
        .find(|attr| attr.key.as_str() == "sensitive")
        .is_some_and(|attr| matches!(attr.expr, Expression::Bool(true)));

    Ok(OutputInfo {
        name,
        description: get_string_attribute(&block.body, "description"),
        sensitive,
    })
}

/// Get a string attribute from a body.
fn get_string_attribute(body: &Body, key: &str) -> Option<String> {
    body.attributes()
        .find(|attr| attr.key.as_str() == key)
        .and_then(|attr| match &attr.expr {
            Expression::String(s) => Some(s.clone()),
            _ => None,
        })
}

/// Render a type expression back to HCL text.
fn render_expression(expr: &Expression) -> String {
    hcl::format::to_string(expr).unwrap_or_else(|_| format!("{expr:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_parser() -> HclMetadataParser {
        HclMetadataParser::new(&Config::default())
    }

    fn parse(content: &str) -> Result<ResourceInfo> {
        let mut info = ResourceInfo::default();
        create_test_parser().parse_content(content, Path::new("test.pkr.hcl.tf"), &mut info)?;
        Ok(info)
    }

    #[test]
    fn test_parse_variables() {
        let info = parse(
            r#"
variable "project_id" {
  description = "Project in which to create the image"
  type        = string
}

variable "zone" {
  type    = string
  default = "us-central1-a"
}

variable "untyped" {}
"#,
        )
        .unwrap();

        assert_eq!(info.inputs.len(), 3);

        let project = &info.inputs[0];
        assert_eq!(project.name, "project_id");
        assert_eq!(project.type_description, "string");
        assert!(project.required);
        assert!(!project.has_default);
        assert_eq!(
            project.description.as_deref(),
            Some("Project in which to create the image")
        );

        let zone = &info.inputs[1];
        assert!(zone.has_default);
        assert!(!zone.required);

        assert_eq!(info.inputs[2].type_description, "any");
    }

    #[test]
    fn test_parse_outputs() {
        let info = parse(
            r#"
output "image_name" {
  description = "Name of the built image"
  value       = "x"
}

output "token" {
  value     = "y"
  sensitive = true
}
"#,
        )
        .unwrap();

        assert_eq!(info.outputs.len(), 2);
        assert_eq!(info.outputs[0].name, "image_name");
        assert_eq!(info.outputs[0].description.as_deref(), Some("Name of the built image"));
        assert!(!info.outputs[0].sensitive);
        assert!(info.outputs[1].sensitive);
    }

    #[test]
    fn test_ignores_other_blocks() {
        let info = parse(
            r#"
packer {
  required_plugins {
    googlecompute = {
      version = ">= 1.0.0"
      source  = "github.com/hashicorp/googlecompute"
    }
  }
}

source "googlecompute" "image" {
  project_id = "p"
}

build {
  sources = ["sources.googlecompute.image"]
}
"#,
        )
        .unwrap();

        assert!(info.inputs.is_empty());
        assert!(info.outputs.is_empty());
    }

    #[test]
    fn test_duplicate_variable_is_rejected() {
        let result = parse(
            r#"
variable "zone" {}
variable "zone" {}
"#,
        );

        assert!(matches!(
            result,
            Err(ModInfoError::DuplicateName { kind: "variable", name, .. }) if name == "zone"
        ));
    }

    #[test]
    fn test_duplicate_output_is_rejected() {
        let result = parse(
            r#"
output "id" { value = 1 }
output "id" { value = 2 }
"#,
        );

        assert!(matches!(result, Err(ModInfoError::DuplicateName { kind: "output", .. })));
    }

    #[test]
    fn test_variable_without_label_is_rejected() {
        let result = parse("variable {}\n");
        assert!(matches!(result, Err(ModInfoError::HclParse { .. })));
    }

    #[test]
    fn test_parse_invalid_hcl() {
        let result = parse("this is not valid { hcl");
        assert!(matches!(result, Err(ModInfoError::HclParse { .. })));
    }

    #[test]
    fn test_is_module_file() {
        let parser = create_test_parser();

        assert!(parser.is_module_file(Path::new("image.pkr.hcl.tf")));
        assert!(parser.is_module_file(Path::new("main.tf")));
        assert!(!parser.is_module_file(Path::new("image.pkr.hcl")));
        assert!(!parser.is_module_file(Path::new("README.md")));
    }

    #[tokio::test]
    async fn test_parse_metadata_reads_only_parser_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.tf"), "output \"out\" { value = 1 }\n").unwrap();
        std::fs::write(dir.path().join("a.tf"), "variable \"first\" {}\n").unwrap();
        std::fs::write(dir.path().join("c.hcl"), "variable \"ignored\" {}\n").unwrap();

        let info = create_test_parser().parse_metadata(dir.path()).await.unwrap();

        assert_eq!(info.inputs.len(), 1);
        assert_eq!(info.inputs[0].name, "first");
        assert_eq!(info.outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_parse_metadata_duplicate_across_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tf"), "variable \"zone\" {}\n").unwrap();
        std::fs::write(dir.path().join("b.tf"), "variable \"zone\" {}\n").unwrap();

        let result = create_test_parser().parse_metadata(dir.path()).await;
        assert!(matches!(result, Err(ModInfoError::DuplicateName { .. })));
    }

    #[tokio::test]
    async fn test_parse_metadata_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = create_test_parser().parse_metadata(&missing).await;
        assert!(matches!(result, Err(ModInfoError::DirectoryNotFound { .. })));
    }
}
