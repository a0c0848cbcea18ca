//! Blueprint module validation.
//!
//! Every module of a blueprint is read concurrently through one shared
//! [`ResourceReader`], then its settings are checked against the extracted
//! interface. Errors from all modules are collected into a single
//! [`MultiError`], each tagged with the blueprint location it belongs to.

use crate::config::{Config, ValidationOptions};
use crate::error::{BlueprintPath, MultiError, Result};
use crate::reader::ResourceReader;
use crate::types::{Blueprint, ModuleDeclaration, ModuleReport, ResourceInfo};

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Validates the modules referenced by a blueprint.
pub struct BlueprintValidator {
    reader: Arc<dyn ResourceReader>,
    options: ValidationOptions,
}

impl BlueprintValidator {
    /// Create a validator reading module interfaces through `reader`.
    #[must_use]
    pub fn new(reader: Arc<dyn ResourceReader>, config: &Config) -> Self {
        Self {
            reader,
            options: config.validation.clone(),
        }
    }

    /// Validate every module and return their interfaces in blueprint order.
    ///
    /// # Errors
    ///
    /// Returns every problem found: a single error as-is, several as
    /// [`crate::ModInfoError::Multiple`]. Each is wrapped in a
    /// [`crate::error::PathError`] naming the offending module field.
    pub async fn validate(&self, blueprint: &Blueprint) -> Result<Vec<ModuleReport>> {
        let mut errors = MultiError::new();
        let duplicates = duplicate_ids(&blueprint.modules);

        let mut reads: Vec<(usize, Result<ResourceInfo>)> =
            stream::iter(blueprint.modules.iter().enumerate())
                .map(|(index, module)| async move {
                    (index, self.reader.get_info(&module.source).await)
                })
                .buffer_unordered(self.options.max_concurrency.max(1))
                .collect()
                .await;
        reads.sort_by_key(|(index, _)| *index);

        let mut reports = Vec::with_capacity(reads.len());
        for ((index, read), module) in reads.into_iter().zip(&blueprint.modules) {
            let path = BlueprintPath::module(index);
            if duplicates.contains(&index) {
                errors.add_at(
                    &path.field("id"),
                    crate::err!(DuplicateModuleId {
                        id: module.id.clone(),
                    }),
                );
            }
            match read {
                Ok(info) => {
                    self.check_settings(&path, module, &info, &mut errors);
                    reports.push(ModuleReport {
                        source: module.source.clone(),
                        info,
                    });
                }
                Err(e) => {
                    tracing::warn!(module = %module.id, error = %e, "Failed to read module");
                    errors.add_at(&path.field("source"), e);
                }
            }
        }

        tracing::info!(
            modules = blueprint.modules.len(),
            errors = errors.len(),
            "Blueprint validation complete"
        );
        errors.into_result()?;
        Ok(reports)
    }

    /// Compare a module's settings to its declared inputs.
    fn check_settings(
        &self,
        path: &BlueprintPath,
        module: &ModuleDeclaration,
        info: &ResourceInfo,
        errors: &mut MultiError,
    ) {
        let settings = path.field("settings");

        if self.options.fail_on_unknown_settings {
            for name in module.settings.keys() {
                if info.input(name).is_none() {
                    errors.add_at(
                        &settings.field(name),
                        crate::err!(InvalidSetting {
                            module: module.id.clone(),
                            setting: name.clone(),
                        }),
                    );
                }
            }
        }

        if self.options.require_required_inputs {
            for input in info.required_inputs() {
                if !module.settings.contains_key(&input.name) {
                    errors.add_at(
                        &settings,
                        crate::err!(MissingInput {
                            module: module.id.clone(),
                            input: input.name.clone(),
                        }),
                    );
                }
            }
        }
    }
}

/// Indices of modules whose id was already used by an earlier module.
fn duplicate_ids(modules: &[ModuleDeclaration]) -> HashSet<usize> {
    let mut seen = HashSet::new();
    modules
        .iter()
        .enumerate()
        .filter(|(_, module)| !seen.insert(module.id.as_str()))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModInfoError;
    use crate::types::VariableInfo;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    /// In-memory reader: known sources resolve, anything else fails.
    #[derive(Default)]
    struct MapReader {
        infos: DashMap<String, ResourceInfo>,
    }

    #[async_trait]
    impl ResourceReader for MapReader {
        async fn get_info(&self, source: &str) -> Result<ResourceInfo> {
            self.infos.get(source).map(|i| i.value().clone()).ok_or_else(|| {
                crate::err!(DirectoryNotFound {
                    path: source.into(),
                })
            })
        }

        fn set_info(&self, source: &str, info: ResourceInfo) {
            self.infos.insert(source.to_string(), info);
        }
    }

    fn image_info() -> ResourceInfo {
        let var = |name: &str, required: bool| VariableInfo {
            name: name.to_string(),
            type_description: "string".to_string(),
            has_default: !required,
            required,
            description: None,
        };
        ResourceInfo {
            inputs: vec![var("project_id", true), var("zone", false)],
            outputs: Vec::new(),
        }
    }

    fn module(id: &str, source: &str, settings: &[&str]) -> ModuleDeclaration {
        ModuleDeclaration {
            id: id.to_string(),
            source: source.to_string(),
            settings: settings
                .iter()
                .map(|s| (s.to_string(), serde_yaml::Value::from("x")))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn validator() -> BlueprintValidator {
        let reader = Arc::new(MapReader::default());
        reader.set_info("./image", image_info());
        BlueprintValidator::new(reader, &Config::default())
    }

    fn paths(err: &ModInfoError) -> Vec<String> {
        match err {
            ModInfoError::Multiple(m) => m.iter().flat_map(paths).collect(),
            ModInfoError::Path(p) => vec![p.path().to_string()],
            other => panic!("untagged error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_valid_blueprint() {
        let blueprint = Blueprint {
            blueprint_name: None,
            modules: vec![module("a", "./image", &["project_id"]), module("b", "./image", &["project_id", "zone"])],
        };

        let reports = validator().validate(&blueprint).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].info, image_info());
    }

    #[tokio::test]
    async fn test_single_error_is_not_wrapped_in_multiple() {
        let blueprint = Blueprint {
            blueprint_name: None,
            modules: vec![module("a", "./image", &[])],
        };

        let err = validator().validate(&blueprint).await.unwrap_err();
        assert!(matches!(&err, ModInfoError::Path(_)));
        assert_eq!(paths(&err), vec!["modules[0].settings"]);
    }

    #[tokio::test]
    async fn test_all_errors_are_reported() {
        let blueprint = Blueprint {
            blueprint_name: None,
            modules: vec![
                module("a", "./missing", &[]),
                module("b", "./image", &["project_id", "colour"]),
                module("a", "./image", &[]),
            ],
        };

        let err = validator().validate(&blueprint).await.unwrap_err();

        assert_eq!(
            paths(&err),
            vec![
                "modules[0].source",
                "modules[1].settings.colour",
                "modules[2].id",
                "modules[2].settings",
            ]
        );
    }

    #[tokio::test]
    async fn test_checks_can_be_disabled() {
        let mut config = Config::default();
        config.validation.fail_on_unknown_settings = false;
        config.validation.require_required_inputs = false;
        let reader = Arc::new(MapReader::default());
        reader.set_info("./image", image_info());
        let validator = BlueprintValidator::new(reader, &config);

        let blueprint = Blueprint {
            blueprint_name: None,
            modules: vec![module("a", "./image", &["colour"])],
        };

        assert!(validator.validate(&blueprint).await.is_ok());
    }
}
