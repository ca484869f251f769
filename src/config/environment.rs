//! Account/region resolution for a run.

use serde::{Deserialize, Serialize};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Account/region pair attached identically to every stack in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    /// Target account, if known (left to the provider layer otherwise)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub region: String,
}

impl EnvironmentContext {
    /// Resolve from optional account/region values
    ///
    /// Blank values are treated as unset; region falls back to [`DEFAULT_REGION`].
    pub fn resolve(account: Option<String>, region: Option<String>) -> Self {
        let account = account
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        let region = region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self { account, region }
    }

}
