//! In-memory requirement specification
//!
//! A [`SpecificationModel`] is built once at run start and is read-only
//! afterwards. Requirements keep their declaration order, which only affects
//! report presentation.

use std::fmt;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

use super::loader::RequirementSource;
use crate::error::{
    ReqcovError,
    ReqcovResult,
};

/// Separator between the requirement and feature parts of a qualified key
pub const FEATURE_SEPARATOR: char = '/';

/// Priority of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Must be verified before release
    High,
    /// Should be verified
    Medium,
    /// Nice to have
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Globally unique reference to a feature: `REQ-ID/FEATURE-ID`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureKey {
    /// Owning requirement
    pub requirement: String,
    /// Feature identifier within the requirement
    pub feature:     String,
}

impl FeatureKey {
    /// Create a qualified feature key
    pub fn new(requirement: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            feature:     feature.into(),
        }
    }

    /// Parse a qualified key; bare feature identifiers yield `None`
    pub fn parse(key: &str) -> Option<Self> {
        let (requirement, feature) = key.split_once(FEATURE_SEPARATOR)?;
        if requirement.is_empty() || feature.is_empty() {
            return None;
        }
        Some(Self::new(requirement, feature))
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.requirement, FEATURE_SEPARATOR, self.feature)
    }
}

/// Sub-aspect of a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Identifier, unique within the owning requirement
    pub id:          String,
    /// Human-readable description
    pub description: String,
}

/// Declared requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Unique identifier
    pub id:          String,
    /// Human-readable description
    pub description: String,
    /// Priority classification
    pub priority:    Priority,
    features:        IndexMap<String, Feature>,
}

impl Requirement {
    /// Look up a feature declared by this requirement
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Features in declaration order
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Number of declared features
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// Declared requirements and features for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationModel {
    requirements: IndexMap<String, Requirement>,
}

impl SpecificationModel {
    /// Start building a specification in code
    pub fn builder() -> SpecificationBuilder {
        SpecificationBuilder::default()
    }

    /// Build a validated model from source entries in declaration order
    pub(crate) fn from_sources(
        sources: Vec<(String, RequirementSource)>,
    ) -> ReqcovResult<Self> {
        let mut requirements = IndexMap::with_capacity(sources.len());

        for (id, source) in sources {
            validate_id(&id, "requirement")?;
            if requirements.contains_key(&id) {
                return Err(ReqcovError::malformed(format!(
                    "requirement `{}` is declared twice",
                    id
                )));
            }

            let description = match source.description {
                Some(description) if !description.trim().is_empty() => description,
                _ => {
                    return Err(ReqcovError::malformed(format!(
                        "requirement `{}` has no description",
                        id
                    )));
                },
            };

            let mut features = IndexMap::with_capacity(source.features.len());
            for (feature_id, feature_description) in source.features {
                validate_id(&feature_id, "feature")?;
                if features.contains_key(&feature_id) {
                    return Err(ReqcovError::malformed(format!(
                        "feature `{}` is declared twice in requirement `{}`",
                        feature_id, id
                    )));
                }
                features.insert(
                    feature_id.clone(),
                    Feature {
                        id:          feature_id,
                        description: feature_description,
                    },
                );
            }

            requirements.insert(
                id.clone(),
                Requirement {
                    id,
                    description,
                    priority: source.priority,
                    features,
                },
            );
        }

        Ok(Self { requirements })
    }

    /// Look up a requirement by identifier
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.get(id)
    }

    /// Look up a feature by owning requirement and feature identifier
    pub fn feature(&self, requirement_id: &str, feature_id: &str) -> Option<&Feature> {
        self.requirement(requirement_id)?.feature(feature_id)
    }

    /// Requirements in declaration order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    /// Whether a requirement is declared
    pub fn contains_requirement(&self, id: &str) -> bool {
        self.requirements.contains_key(id)
    }

    /// Number of declared requirements
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Whether no requirement is declared
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Number of declared features across all requirements
    pub fn feature_count(&self) -> usize {
        self.requirements.values().map(Requirement::feature_count).sum()
    }
}

fn validate_id(id: &str, kind: &str) -> ReqcovResult<()> {
    if id.trim().is_empty() {
        return Err(ReqcovError::malformed(format!("{} identifier is empty", kind)));
    }
    if id.contains(FEATURE_SEPARATOR) {
        return Err(ReqcovError::malformed(format!(
            "{} identifier `{}` contains reserved separator `{}`",
            kind, id, FEATURE_SEPARATOR
        )));
    }
    Ok(())
}

/// Programmatic construction of a [`SpecificationModel`]
///
/// `feature` attaches to the most recently added requirement.
#[derive(Debug, Default)]
pub struct SpecificationBuilder {
    sources:         Vec<(String, RequirementSource)>,
    orphan_features: Vec<String>,
}

impl SpecificationBuilder {
    /// Declare a requirement
    pub fn requirement(
        mut self,
        id: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        self.sources.push((
            id.into(),
            RequirementSource {
                description: Some(description.into()),
                priority,
                features: Vec::new(),
            },
        ));
        self
    }

    /// Declare a feature of the last declared requirement
    pub fn feature(mut self, id: impl Into<String>, description: impl Into<String>) -> Self {
        match self.sources.last_mut() {
            Some((_, source)) => source.features.push((id.into(), description.into())),
            None => self.orphan_features.push(id.into()),
        }
        self
    }

    /// Validate and build the model
    pub fn build(self) -> ReqcovResult<SpecificationModel> {
        if let Some(feature) = self.orphan_features.first() {
            return Err(ReqcovError::malformed(format!(
                "feature `{}` declared before any requirement",
                feature
            )));
        }
        SpecificationModel::from_sources(self.sources)
    }
}
