//! Configuration loaded from environment variables and the filter
//! definition file.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::filter::PropertyMap;
use crate::metadata::ResourceDefinition;
use crate::naming::{CamelCaseToSnakeCaseNameConverter, NameConverter};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the YAML filter definition (default: ./sieve.yaml).
    pub definition_path: PathBuf,

    /// Alias of the root entity in built queries (default: o).
    pub root_alias: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let definition_path = env::var("SIEVE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./sieve.yaml"));

        let root_alias = env::var("SIEVE_ROOT_ALIAS").unwrap_or_else(|_| "o".to_string());
        anyhow::ensure!(
            is_valid_alias(&root_alias),
            "SIEVE_ROOT_ALIAS must be a plain identifier, got \"{root_alias}\""
        );

        Ok(Self {
            definition_path,
            root_alias,
        })
    }
}

fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && alias.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// Name converter selectable from the definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameConverterKind {
    CamelCaseToSnakeCase,
}

impl NameConverterKind {
    pub fn build(self) -> Arc<dyn NameConverter> {
        match self {
            NameConverterKind::CamelCaseToSnakeCase => Arc::new(CamelCaseToSnakeCaseNameConverter),
        }
    }
}

/// Kind of filter a declaration builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Date,
    Numeric,
    Range,
}

/// Enabled properties as written in the definition file: either a plain
/// list or a map of property → null-management policy (`~` for none).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertyList {
    Names(Vec<String>),
    Map(PropertyMap),
}

impl From<PropertyList> for PropertyMap {
    fn from(list: PropertyList) -> Self {
        match list {
            PropertyList::Names(names) => names.into_iter().map(|name| (name, None)).collect(),
            PropertyList::Map(map) => map,
        }
    }
}

/// One filter declared in the definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterDeclaration {
    pub name: String,
    pub kind: FilterKind,
    pub resource: String,

    /// Enabled properties; absent enables every non-nested field.
    #[serde(default)]
    pub properties: Option<PropertyList>,
}

/// Contents of the definition file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDefinition>,

    #[serde(default)]
    pub filters: Vec<FilterDeclaration>,

    #[serde(default)]
    pub name_converter: Option<NameConverterKind>,
}

impl Definition {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yml::from_str(yaml).context("failed to parse filter definition")
    }

    /// Read and parse the definition file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read filter definition {}", path.display()))?;
        Self::from_yaml_str(&yaml)
            .with_context(|| format!("invalid filter definition {}", path.display()))
    }
}
