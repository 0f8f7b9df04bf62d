//! Resource catalog (per-type pipeline configuration), sync plan manifest and
//! JSON:API page decoding.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pmsync_core::{FieldKind, ResourceKind, ResourceTypeConfig, DEFAULT_KEY_COLUMN, TYPE_COLUMN};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

mod builtin;

pub const CRATE_NAME: &str = "pmsync-resources";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no configuration for resource type `{0}`")]
    UnknownResource(String),
    #[error("{kind}: key column `{column}` must be declared as a non-null string")]
    InvalidKeyColumn { kind: ResourceKind, column: String },
    #[error("{kind}: `type` column must be declared as a non-null string")]
    InvalidTypeColumn { kind: ResourceKind },
    #[error("{kind}: relationship `{api_key}` writes undeclared column `{column}`")]
    UndeclaredRelationshipColumn {
        kind: ResourceKind,
        api_key: String,
        column: String,
    },
    #[error("{kind}: relationship `{api_key}` points at {owner}, which is not configured")]
    MissingOwner {
        kind: ResourceKind,
        api_key: String,
        owner: ResourceKind,
    },
    #[error("{kind}: relationship `{api_key}` looks up {owner}.{column}, which {owner} never declares")]
    UndeclaredLookupColumn {
        kind: ResourceKind,
        api_key: String,
        owner: ResourceKind,
        column: String,
    },
    #[error("{kind}: relationship `{api_key}` must name its lookup column; {owner} is keyed by `{owner_key}`")]
    ImplicitAlternateLookup {
        kind: ResourceKind,
        api_key: String,
        owner: ResourceKind,
        owner_key: String,
    },
    #[error("{kind}: json field `{column}` is not declared with kind json")]
    InvalidJsonField { kind: ResourceKind, column: String },
}

/// Per-type configuration for every mirrored resource type, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: BTreeMap<ResourceKind, ResourceTypeConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub resources: Vec<ResourceTypeConfig>,
}

impl Catalog {
    pub fn from_configs(configs: impl IntoIterator<Item = ResourceTypeConfig>) -> Self {
        Self {
            resources: configs
                .into_iter()
                .map(|config| (config.kind, config))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::from_configs(builtin::builtin_configs())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml).context("parsing catalog yaml")?;
        Ok(Self::from_configs(file.resources))
    }

    /// Built-in catalog with every type in `path` replacing its built-in counterpart.
    pub fn builtin_with_overrides(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let overrides =
            Self::from_yaml_str(&yaml).with_context(|| format!("loading {}", path.display()))?;
        let mut catalog = Self::builtin();
        catalog.merge(overrides);
        Ok(catalog)
    }

    pub fn merge(&mut self, other: Catalog) {
        self.resources.extend(other.resources);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceTypeConfig> {
        self.resources.get(&kind)
    }

    pub fn config_for(&self, kind: ResourceKind) -> Result<&ResourceTypeConfig, CatalogError> {
        self.get(kind)
            .ok_or_else(|| CatalogError::UnknownResource(kind.to_string()))
    }

    pub fn config_for_api_type(&self, api_type: &str) -> Result<&ResourceTypeConfig, CatalogError> {
        ResourceKind::from_api_type(api_type)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| CatalogError::UnknownResource(api_type.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.resources.keys().copied()
    }

    pub fn configs(&self) -> impl Iterator<Item = &ResourceTypeConfig> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Owner kinds referenced by `kind`'s relationships, excluding itself.
    pub fn dependencies_of(&self, kind: ResourceKind) -> BTreeSet<ResourceKind> {
        self.get(kind)
            .map(|config| {
                config
                    .relationships
                    .iter()
                    .map(|rel| rel.owner)
                    .filter(|owner| *owner != kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when either kind references the other.
    pub fn related(&self, a: ResourceKind, b: ResourceKind) -> bool {
        self.dependencies_of(a).contains(&b) || self.dependencies_of(b).contains(&a)
    }

    /// Collects every structural problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<CatalogError>> {
        let mut errors = Vec::new();
        for config in self.resources.values() {
            self.validate_one(config, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_one(&self, config: &ResourceTypeConfig, errors: &mut Vec<CatalogError>) {
        let kind = config.kind;
        let key_ok = config
            .schema
            .get(&config.key_column)
            .is_some_and(|spec| spec.kind == FieldKind::String && !spec.nullable);
        if !key_ok {
            errors.push(CatalogError::InvalidKeyColumn {
                kind,
                column: config.key_column.clone(),
            });
        }

        let type_ok = config
            .schema
            .get(TYPE_COLUMN)
            .is_some_and(|spec| spec.kind == FieldKind::String && !spec.nullable);
        if !type_ok {
            errors.push(CatalogError::InvalidTypeColumn { kind });
        }

        for column in &config.json_fields {
            if config.schema.get(column).map(|spec| spec.kind) != Some(FieldKind::Json) {
                errors.push(CatalogError::InvalidJsonField {
                    kind,
                    column: column.clone(),
                });
            }
        }

        for rel in &config.relationships {
            if !config.schema.contains(&rel.local_column) {
                errors.push(CatalogError::UndeclaredRelationshipColumn {
                    kind,
                    api_key: rel.api_key.clone(),
                    column: rel.local_column.clone(),
                });
            }

            let Some(owner) = self.get(rel.owner) else {
                errors.push(CatalogError::MissingOwner {
                    kind,
                    api_key: rel.api_key.clone(),
                    owner: rel.owner,
                });
                continue;
            };

            match &rel.lookup_column {
                None if owner.key_column != DEFAULT_KEY_COLUMN => {
                    errors.push(CatalogError::ImplicitAlternateLookup {
                        kind,
                        api_key: rel.api_key.clone(),
                        owner: rel.owner,
                        owner_key: owner.key_column.clone(),
                    });
                }
                Some(column) if !owner.schema.contains(column) => {
                    errors.push(CatalogError::UndeclaredLookupColumn {
                        kind,
                        api_key: rel.api_key.clone(),
                        owner: rel.owner,
                        column: column.clone(),
                    });
                }
                _ => {}
            }
        }
    }
}

/// Ordered list of resource types to sync, with the page files holding each type's data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncPlan {
    pub resources: Vec<PlannedResource>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannedResource {
    pub kind: ResourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub pages: Vec<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

impl SyncPlan {
    pub fn enabled(&self) -> impl Iterator<Item = &PlannedResource> {
        self.resources.iter().filter(|r| r.enabled)
    }
}

/// Reads a plan; relative page paths are resolved against the plan's directory.
pub fn load_sync_plan(path: impl AsRef<Path>) -> Result<SyncPlan> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut plan: SyncPlan =
        serde_yaml::from_str(&yaml).with_context(|| format!("parsing {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for resource in &mut plan.resources {
        for page in &mut resource.pages {
            if page.is_relative() {
                *page = base.join(&*page);
            }
        }
    }
    Ok(plan)
}

/// One page of a JSON:API collection response.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub data: Vec<JsonValue>,
    pub meta: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    data: JsonValue,
    #[serde(default)]
    meta: Option<JsonValue>,
}

pub fn parse_page(bytes: &[u8]) -> Result<PageDocument> {
    let raw: RawPage = parse_json(bytes)?;
    let data = match raw.data {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        single @ JsonValue::Object(_) => vec![single],
        other => anyhow::bail!("page `data` must be an array or object, got {other}"),
    };
    Ok(PageDocument {
        data,
        meta: raw.meta,
    })
}

pub fn load_page_file(path: impl AsRef<Path>) -> Result<PageDocument> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_page(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).context("decoding json")
}
