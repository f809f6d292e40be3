//! Identity-provider endpoint settings.

use serde::Deserialize;

/// Default STS endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://sts.amazonaws.com/";

/// Region the global STS endpoint signs for.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where and how to reach STS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StsConfig {
    /// Endpoint URL the identity-check request targets.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Region in the signature's credential scope.
    #[serde(default = "default_region")]
    pub region: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
