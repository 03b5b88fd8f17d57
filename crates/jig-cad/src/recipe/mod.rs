//! Part Recipes
//!
//! A recipe is the ordered list of features that builds one part. Replaying
//! it against a kernel yields the part's solid; the first failing feature
//! aborts the build.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureError, FeatureResult};
use crate::kernel::{CadKernel, Solid};

/// Ordered features building one named part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartRecipe {
    /// Part name
    pub name: String,
    /// Part whose solid this recipe starts from (e.g. the case for its halves)
    #[serde(default)]
    pub base: Option<String>,
    features: Vec<Feature>,
}

impl PartRecipe {
    /// Create an empty recipe that starts from nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            features: Vec::new(),
        }
    }

    /// Create an empty recipe that starts from another part's solid
    pub fn derived(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: Some(base.into()),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Builder-style append
    pub fn with(mut self, feature: Feature) -> Self {
        self.add_feature(feature);
        self
    }

    /// Get a feature by name
    pub fn find(&self, name: &str) -> Option<&Feature> {
        self.features().find(|f| f.name() == name)
    }

    /// Get all features
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Features that take part in a build
    pub fn active_features(&self) -> impl Iterator<Item = &Feature> {
        self.features().filter(|f| !f.is_suppressed())
    }

    /// Names of the parts that must be built before this one
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = self.base.as_deref().into_iter().collect();
        for part in self.active_features().filter_map(|f| f.required_part()) {
            if !deps.contains(&part) {
                deps.push(part);
            }
        }
        deps
    }

    /// Replay the features
    ///
    /// `parts` holds the solids of parts built earlier; the recipe starts from
    /// its base part's solid when it has one.
    pub fn build(
        &self,
        kernel: &dyn CadKernel,
        parts: &HashMap<String, Solid>,
    ) -> FeatureResult<Solid> {
        let mut current = match &self.base {
            Some(base) => Some(parts.get(base).cloned().ok_or_else(|| {
                FeatureError::InvalidFeature(format!(
                    "Part '{}' needs the '{}' solid",
                    self.name, base
                ))
            })?),
            None => None,
        };

        for feature in &self.features {
            if feature.is_suppressed() {
                tracing::debug!(part = %self.name, feature = feature.name(), "skipping suppressed feature");
                continue;
            }

            tracing::debug!(
                part = %self.name,
                feature = feature.name(),
                kind = feature.type_name(),
                "applying feature"
            );
            let solid = feature
                .execute(kernel, current.as_ref(), parts)
                .map_err(|e| FeatureError::Failed {
                    name: format!("{}/{}", self.name, feature.name()),
                    source: Box::new(e),
                })?;
            current = Some(solid);
        }

        current.ok_or_else(|| {
            FeatureError::InvalidFeature(format!("Part '{}' has no active features", self.name))
        })
    }
}
