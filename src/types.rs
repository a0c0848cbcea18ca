//! Core data types for ModInfo.
//!
//! This module defines the main data structures used throughout the
//! application: the extracted module interface ([`ResourceInfo`]) and the
//! blueprint declarations it is validated against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Module interface
// =============================================================================

/// A declared input variable of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,

    /// The declared type rendered as HCL (`any` when undeclared)
    #[serde(rename = "type")]
    pub type_description: String,

    /// Whether a default value is declared
    pub has_default: bool,

    /// Whether a value must be supplied by the caller
    pub required: bool,

    /// Free-form description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared output of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    /// Output name
    pub name: String,

    /// Free-form description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the output is marked sensitive
    #[serde(default)]
    pub sensitive: bool,
}

/// The interface contract of a module: its inputs and outputs.
///
/// Variable names are unique, and so are output names. Values are
/// immutable once extracted; callers receive their own clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Input variables in declaration order
    pub inputs: Vec<VariableInfo>,

    /// Outputs in declaration order
    pub outputs: Vec<OutputInfo>,
}

impl ResourceInfo {
    /// Look up an input by name.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&VariableInfo> {
        self.inputs.iter().find(|v| v.name == name)
    }

    /// Look up an output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputInfo> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Inputs a caller must provide.
    pub fn required_inputs(&self) -> impl Iterator<Item = &VariableInfo> {
        self.inputs.iter().filter(|v| v.required)
    }
}

// =============================================================================
// Blueprint declarations
// =============================================================================

/// One module as referenced by a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    /// Unique id within the blueprint
    pub id: String,

    /// Source identifier (local directory)
    pub source: String,

    /// Settings passed to the module's inputs
    #[serde(default)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
}

/// The subset of a blueprint relevant to module validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Blueprint name
    #[serde(default)]
    pub blueprint_name: Option<String>,

    /// Referenced modules in declaration order
    #[serde(default)]
    pub modules: Vec<ModuleDeclaration>,
}

impl Blueprint {
    /// Parse a blueprint from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str, path: &std::path::Path) -> crate::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            crate::err!(BlueprintParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })
    }
}

/// The extracted interface of one module, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module source identifier
    pub source: String,

    /// Extracted interface
    pub info: ResourceInfo,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text format
    #[default]
    Text,
    /// JSON format
    Json,
}
