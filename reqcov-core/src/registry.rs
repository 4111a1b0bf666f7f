//! Test tag registry
//!
//! Maps a declared test to the requirement and feature IDs it claims to
//! verify. Registration is explicit: a test shim calls
//! [`TagRegistry::associate`] (or builds a [`TestTags`]) once per declared
//! test, not once per generated example.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::{
        ReqcovError,
        ReqcovResult,
    },
    requirements::FeatureKey,
};

/// Requirement and feature claims of one test
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Association {
    /// Claimed requirement IDs
    #[serde(default)]
    pub requirements: BTreeSet<String>,
    /// Claimed feature IDs, bare (`F1.1`) or qualified (`REQ-1/F1.1`)
    #[serde(default)]
    pub features:     BTreeSet<String>,
}

impl Association {
    /// Create an association from requirement and feature IDs
    pub fn new<R, F>(requirements: R, features: F) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            requirements: requirements.into_iter().map(Into::into).collect(),
            features:     features.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether nothing is claimed
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.features.is_empty()
    }

    /// Whether the requirement is claimed
    pub fn claims_requirement(&self, requirement: &str) -> bool {
        self.requirements.contains(requirement)
    }

    /// Whether the feature of `requirement` is claimed
    ///
    /// The requirement itself must be claimed too; a bare feature ID matches
    /// any claimed requirement that declares it.
    pub fn claims_feature(&self, requirement: &str, feature: &str) -> bool {
        if !self.claims_requirement(requirement) {
            return false;
        }
        self.features.contains(feature)
            || self
                .features
                .contains(&FeatureKey::new(requirement, feature).to_string())
    }
}

/// Declared associations for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    associations: BTreeMap<String, Association>,
}

/// On-disk form of a registry: `[tests."<test id>"]` tables
#[derive(Debug, Deserialize)]
struct TagFile {
    #[serde(default)]
    tests: BTreeMap<String, Association>,
}

impl TagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load associations from a TOML document
    pub fn from_toml_str(content: &str) -> ReqcovResult<Self> {
        let file: TagFile =
            toml::from_str(content).map_err(|e| ReqcovError::Config(e.to_string()))?;
        let mut registry = Self::new();
        for (test_id, association) in file.tests {
            registry.insert(test_id, association)?;
        }
        Ok(registry)
    }

    /// Associate a test with the requirements and features it claims
    ///
    /// Repeating an identical association is a no-op. A conflicting one is
    /// rejected and the first association is kept.
    pub fn associate<R, F>(
        &mut self,
        test_id: impl Into<String>,
        requirements: R,
        features: F,
    ) -> ReqcovResult<()>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        self.insert(test_id.into(), Association::new(requirements, features))
    }

    /// Associate a test with an already built association
    pub fn insert(&mut self, test_id: String, association: Association) -> ReqcovResult<()> {
        match self.associations.get(&test_id) {
            Some(existing) if *existing == association => Ok(()),
            Some(existing) => Err(ReqcovError::DuplicateAssociation {
                detail: format!(
                    "already associated with requirements {:?} and features {:?}, refusing {:?} and {:?}",
                    existing.requirements,
                    existing.features,
                    association.requirements,
                    association.features
                ),
                test_id,
            }),
            None => {
                self.associations.insert(test_id, association);
                Ok(())
            },
        }
    }

    /// Registered association of a test, if any
    ///
    /// A parameterized identifier such as `test_reverse[abc]` falls back to
    /// the declaration of `test_reverse`.
    pub fn get(&self, test_id: &str) -> Option<&Association> {
        self.associations
            .get(test_id)
            .or_else(|| self.associations.get(declared_test_id(test_id)))
    }

    /// Claims of a test; empty when the test made no declaration
    pub fn associations_for(&self, test_id: &str) -> Association {
        self.get(test_id).cloned().unwrap_or_default()
    }

    /// Iterate over all declared tests
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Association)> {
        self.associations.iter().map(|(id, assoc)| (id.as_str(), assoc))
    }

    /// Number of declared tests
    pub fn len(&self) -> usize {
        self.associations.len()
    }

    /// Whether no test is declared
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}

/// Strip a trailing `[...]` parameterization from a test identifier
pub fn declared_test_id(test_id: &str) -> &str {
    if test_id.ends_with(']') {
        if let Some(open) = test_id.find('[') {
            if open > 0 {
                return &test_id[..open];
            }
        }
    }
    test_id
}

/// Builder for declaring a test's claims, replacing decorator-style tagging
///
/// ```
/// use reqcov_core::registry::{TagRegistry, TestTags};
///
/// let mut registry = TagRegistry::new();
/// TestTags::new("test_basic_reversal")
///     .requirement("REQ-1")
///     .features(["F1.1", "F1.4"])
///     .register(&mut registry)
///     .unwrap();
/// assert!(registry.associations_for("test_basic_reversal").claims_requirement("REQ-1"));
/// ```
#[derive(Debug, Clone)]
pub struct TestTags {
    test_id:     String,
    association: Association,
}

impl TestTags {
    /// Start declaring claims for a test
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id:     test_id.into(),
            association: Association::default(),
        }
    }

    /// Claim a requirement
    pub fn requirement(mut self, id: impl Into<String>) -> Self {
        self.association.requirements.insert(id.into());
        self
    }

    /// Claim several requirements
    pub fn requirements<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.association.requirements.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Claim a feature
    pub fn feature(mut self, id: impl Into<String>) -> Self {
        self.association.features.insert(id.into());
        self
    }

    /// Claim several features
    pub fn features<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.association.features.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Test identifier being declared
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// Record the declaration in a registry
    pub fn register(self, registry: &mut TagRegistry) -> ReqcovResult<()> {
        registry.insert(self.test_id, self.association)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associate_and_lookup() {
        let mut registry = TagRegistry::new();
        registry
            .associate("test_basic_reversal", ["REQ-1"], ["F1.1", "F1.4"])
            .unwrap();

        let assoc = registry.associations_for("test_basic_reversal");
        assert!(assoc.claims_requirement("REQ-1"));
        assert!(assoc.claims_feature("REQ-1", "F1.4"));
        assert!(!assoc.claims_feature("REQ-2", "F1.4"));

        assert!(registry.associations_for("test_unknown").is_empty());
    }

    #[test]
    fn test_identical_reassociation_is_noop() {
        let mut registry = TagRegistry::new();
        registry.associate("t", ["REQ-1"], ["F1.1"]).unwrap();
        registry.associate("t", ["REQ-1"], ["F1.1"]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_reassociation_rejected() {
        let mut registry = TagRegistry::new();
        registry.associate("t", ["REQ-1"], Vec::<String>::new()).unwrap();

        let err = registry.associate("t", ["REQ-2"], Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ReqcovError::DuplicateAssociation { ref test_id, .. } if test_id == "t"));

        // First association wins
        assert!(registry.associations_for("t").claims_requirement("REQ-1"));
        assert!(!registry.associations_for("t").claims_requirement("REQ-2"));
    }

    #[test]
    fn test_qualified_feature_claim() {
        let assoc = Association::new(["REQ-1", "REQ-2"], ["REQ-2/F1"]);
        assert!(assoc.claims_feature("REQ-2", "F1"));
        assert!(!assoc.claims_feature("REQ-1", "F1"));
    }

    #[test]
    fn test_parameterized_lookup() {
        let mut registry = TagRegistry::new();
        TestTags::new("test_reverse")
            .requirement("REQ-1")
            .register(&mut registry)
            .unwrap();

        assert!(registry.get("test_reverse[hello]").is_some());
        assert!(registry.get("test_reverse_other").is_none());
        assert_eq!(declared_test_id("test[a][b]"), "test");
        assert_eq!(declared_test_id("[weird]"), "[weird]");
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
[tests.test_basic_reversal]
requirements = ["REQ-1"]
features = ["F1.1", "F1.4"]

[tests."test_empty_string"]
requirements = ["REQ-3"]
"#;
        let registry = TagRegistry::from_toml_str(content).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.associations_for("test_empty_string").features.is_empty());
    }
}
