//! External mapping configuration (TOML or JSON)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MapperError;
use crate::reflect::TypeInfo;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "OBJMAP_CONFIG";

/// One source/target member pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPair {
    pub source: String,
    pub target: String,
}

impl MemberPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        MemberPair {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Member pairs for one source/target type pair
///
/// Type names may be short (`Person`) or qualified (`app::model::Person`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub members: Vec<MemberPair>,
}

/// Declarative member pairs keyed by type names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfiguration {
    #[serde(default)]
    pub mappings: Vec<TypeMapping>,
}

impl MappingConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add member pairs for a type pair
    pub fn with_mapping<I, A, B>(mut self, source: &str, target: &str, members: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.mappings.push(TypeMapping {
            source: source.to_string(),
            target: target.to_string(),
            members: members.into_iter().map(|(s, t)| MemberPair::new(s, t)).collect(),
        });
        self
    }

    /// The entry for a type pair, if any
    pub fn find(&self, source: &TypeInfo, target: &TypeInfo) -> Option<&TypeMapping> {
        self.mappings
            .iter()
            .find(|m| source.matches_name(&m.source) && target.matches_name(&m.target))
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| MapperError::configuration(format!("invalid TOML mapping configuration: {}", e)))
    }

    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| MapperError::configuration(format!("invalid JSON mapping configuration: {}", e)))
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping configuration: {}", path.display()))?;
        let config = match Format::of(path)? {
            Format::Toml => Self::from_toml_str(&content),
            Format::Json => Self::from_json_str(&content),
        }
        .with_context(|| format!("Failed to parse mapping configuration: {}", path.display()))?;
        log::debug!("loaded {} type mappings from {}", config.mappings.len(), path.display());
        Ok(config)
    }

    /// Load from `$OBJMAP_CONFIG` or the user config directory
    ///
    /// A missing file yields an empty configuration.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                log::debug!("no mapping configuration at {}", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// `$OBJMAP_CONFIG`, else `<config dir>/objmap/mappings.toml`
pub fn default_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("objmap").join("mappings.toml"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Toml,
    Json,
}

impl Format {
    pub(crate) fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => anyhow::bail!(
                "Unsupported mapping configuration format: {} (expected .toml or .json)",
                path.display()
            ),
        }
    }
}
