//! Specification source parsing
//!
//! The source is a mapping from requirement ID to
//! `{ description, priority, features }`, written as JSON or TOML. Duplicate
//! keys are rejected while parsing because both serde_json and a plain map
//! would otherwise keep the last value silently.

use std::{
    collections::HashSet,
    fmt,
    marker::PhantomData,
    path::Path,
};

use serde::{
    Deserialize,
    Deserializer,
    de::{
        self,
        MapAccess,
        Visitor,
    },
};
use tracing::info;

use super::model::{
    Priority,
    SpecificationModel,
};
use crate::error::{
    ReqcovError,
    ReqcovResult,
};

/// Source format of a specification file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    /// JSON document
    Json,
    /// TOML document
    Toml,
}

impl SpecFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> ReqcovResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SpecFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(SpecFormat::Toml),
            _ => Err(ReqcovError::malformed(format!(
                "unsupported specification file `{}` (expected .json or .toml)",
                path.display()
            ))),
        }
    }
}

/// One requirement as written in the source
#[derive(Debug, Deserialize)]
pub(crate) struct RequirementSource {
    #[serde(default)]
    pub(crate) description: Option<String>,
    pub(crate) priority:    Priority,
    #[serde(default, deserialize_with = "unique_features")]
    pub(crate) features:    Vec<(String, String)>,
}

/// Top-level source document, entries in declaration order
struct SpecSource {
    requirements: Vec<(String, RequirementSource)>,
}

impl<'de> Deserialize<'de> for SpecSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_map(UniqueEntries::new("requirement"))
            .map(|requirements| SpecSource { requirements })
    }
}

fn unique_features<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(UniqueEntries::new("feature"))
}

/// Map visitor that keeps entry order and rejects repeated keys
struct UniqueEntries<V> {
    kind:   &'static str,
    marker: PhantomData<fn() -> V>,
}

impl<V> UniqueEntries<V> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            marker: PhantomData,
        }
    }
}

impl<'de, V> Visitor<'de> for UniqueEntries<V>
where
    V: Deserialize<'de>,
{
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map keyed by {} identifier", self.kind)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!(
                    "{} `{}` is declared twice",
                    self.kind, key
                )));
            }
            let value = map.next_value::<V>()?;
            entries.push((key, value));
        }

        Ok(entries)
    }
}

impl SpecificationModel {
    /// Load a specification file, choosing the format by extension
    pub fn load(path: &Path) -> ReqcovResult<Self> {
        let format = SpecFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ReqcovError::io(path, e))?;

        let spec = Self::parse(&content, format)?;
        info!(
            path = %path.display(),
            requirements = spec.len(),
            features = spec.feature_count(),
            "loaded specification"
        );
        Ok(spec)
    }

    /// Parse a specification from in-memory source
    pub fn parse(content: &str, format: SpecFormat) -> ReqcovResult<Self> {
        match format {
            SpecFormat::Json => Self::from_json_str(content),
            SpecFormat::Toml => Self::from_toml_str(content),
        }
    }

    /// Parse a JSON specification
    pub fn from_json_str(content: &str) -> ReqcovResult<Self> {
        let source: SpecSource =
            serde_json::from_str(content).map_err(|e| ReqcovError::malformed(e.to_string()))?;
        Self::from_sources(source.requirements)
    }

    /// Parse a TOML specification
    pub fn from_toml_str(content: &str) -> ReqcovResult<Self> {
        let source: SpecSource =
            toml::from_str(content).map_err(|e| ReqcovError::malformed(e.to_string()))?;
        Self::from_sources(source.requirements)
    }
}
