//! Mapping options and external configuration
//!
//! Options decide which strategies a repository builds, and in which order.
//! A single TOML file can carry both the strategy list and the member pairs
//! of the configuration strategy:
//!
//! ```toml
//! strategies = ["manual", "attribute", "configuration", "association", "convention"]
//!
//! [[mappings]]
//! source = "Person"
//! target = "PersonDto"
//! members = [{ source = "first_name", target = "given_name" }]
//! ```

mod source;

pub use source::{default_path, MappingConfiguration, MemberPair, TypeMapping, CONFIG_ENV};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{MapperError, Result};
use crate::strategy::StrategyKind;

/// Precedence used when nothing else is configured
pub const DEFAULT_STRATEGIES: [StrategyKind; 5] = [
    StrategyKind::Manual,
    StrategyKind::Attribute,
    StrategyKind::Configuration,
    StrategyKind::Association,
    StrategyKind::Convention,
];

/// Ordered strategy kinds plus the external configuration source
///
/// The strategy list is validated on construction: it must be non-empty and
/// free of duplicates.
#[derive(Debug, Clone)]
pub struct MappingOptions {
    strategies: Vec<StrategyKind>,
    configuration: Arc<MappingConfiguration>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        MappingOptions {
            strategies: DEFAULT_STRATEGIES.to_vec(),
            configuration: Arc::new(MappingConfiguration::default()),
        }
    }
}

impl MappingOptions {
    /// Options with the given precedence and no external configuration
    pub fn new(strategies: impl IntoIterator<Item = StrategyKind>) -> Result<Self> {
        let strategies: Vec<_> = strategies.into_iter().collect();
        validate(&strategies)?;
        Ok(MappingOptions {
            strategies,
            configuration: Arc::new(MappingConfiguration::default()),
        })
    }

    /// Options from strategy names such as `"convention"`
    pub fn from_names<I>(names: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let strategies = names
            .into_iter()
            .map(|name| name.as_ref().parse::<StrategyKind>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(strategies)
    }

    pub fn builder() -> MappingOptionsBuilder {
        MappingOptionsBuilder::default()
    }

    pub fn with_configuration(mut self, configuration: MappingConfiguration) -> Self {
        self.configuration = Arc::new(configuration);
        self
    }

    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    pub fn configuration(&self) -> Arc<MappingConfiguration> {
        Arc::clone(&self.configuration)
    }

    /// Parse a strategy list and mappings from one TOML document
    ///
    /// A missing `strategies` key keeps the default precedence.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: OptionsFile = toml::from_str(content)
            .map_err(|e| MapperError::configuration(format!("invalid TOML mapping options: {}", e)))?;
        file.into_options()
    }

    /// Load options from `$OBJMAP_CONFIG` or the user config directory
    ///
    /// A missing file yields the default options.
    pub fn load_default() -> anyhow::Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                log::debug!("no mapping options at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load options from a TOML or JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping options: {}", path.display()))?;
        let options = match source::Format::of(path)? {
            source::Format::Toml => Self::from_toml_str(&content),
            source::Format::Json => serde_json::from_str::<OptionsFile>(&content)
                .map_err(|e| MapperError::configuration(format!("invalid JSON mapping options: {}", e)))
                .and_then(OptionsFile::into_options),
        }
        .with_context(|| format!("Failed to parse mapping options: {}", path.display()))?;
        Ok(options)
    }
}

fn validate(strategies: &[StrategyKind]) -> Result<()> {
    if strategies.is_empty() {
        return Err(MapperError::configuration("at least one mapping strategy is required"));
    }
    for (i, kind) in strategies.iter().enumerate() {
        if strategies[..i].contains(kind) {
            return Err(MapperError::configuration(format!(
                "mapping strategy '{}' is listed more than once",
                kind
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    strategies: Option<Vec<String>>,
    #[serde(default)]
    mappings: Vec<TypeMapping>,
}

impl OptionsFile {
    fn into_options(self) -> Result<MappingOptions> {
        let options = match self.strategies {
            Some(names) => MappingOptions::from_names(names)?,
            None => MappingOptions::default(),
        };
        Ok(options.with_configuration(MappingConfiguration {
            mappings: self.mappings,
        }))
    }
}

/// Builder for [`MappingOptions`]
#[derive(Debug, Default)]
pub struct MappingOptionsBuilder {
    strategies: Vec<StrategyKind>,
    configuration: MappingConfiguration,
}

impl MappingOptionsBuilder {
    /// Append a strategy; earlier ones take precedence
    pub fn strategy(mut self, kind: StrategyKind) -> Self {
        self.strategies.push(kind);
        self
    }

    pub fn configuration(mut self, configuration: MappingConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn build(self) -> Result<MappingOptions> {
        Ok(MappingOptions::new(self.strategies)?.with_configuration(self.configuration))
    }
}
