//! Tag policy
//!
//! Every provisioned resource carries the same three tags, derived once per
//! run from the resolved parameters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DeploymentParameters;

/// Project tag value shared by every deployment
pub const PROJECT: &str = "HRAppLab";

pub const PROJECT_KEY: &str = "Project";
pub const DEPLOYMENT_ID_KEY: &str = "DeploymentID";
pub const OWNER_KEY: &str = "Owner";

/// Immutable tag set applied identically to every stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derive the uniform tag set for a deployment.
pub fn derive_tags(params: &DeploymentParameters) -> TagSet {
    let mut tags = BTreeMap::new();
    tags.insert(PROJECT_KEY.to_string(), PROJECT.to_string());
    tags.insert(
        DEPLOYMENT_ID_KEY.to_string(),
        params.deployment_id().to_string(),
    );
    tags.insert(OWNER_KEY.to_string(), params.owner().to_string());
    TagSet(tags)
}
