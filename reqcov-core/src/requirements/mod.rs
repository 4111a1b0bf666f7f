//! Requirement specification model
//!
//! Requirements and their features are declared once per run, either from a
//! JSON/TOML source file or programmatically through
//! [`SpecificationModel::builder`], and are read-only afterwards.

pub mod loader;
pub mod model;

pub use loader::SpecFormat;
pub use model::{
    FEATURE_SEPARATOR,
    Feature,
    FeatureKey,
    Priority,
    Requirement,
    SpecificationBuilder,
    SpecificationModel,
};
