// Scan configuration for authprobe
//
// The unsafe flag is an explicit field threaded through the planner, the
// safety gate, and the scheduler; no component reads it from ambient state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Base URL of the target API; endpoint paths are joined onto it.
    pub base_url: String,
    /// Allow state-mutating methods (POST/PUT/PATCH/DELETE) to execute.
    pub unsafe_enabled: bool,
    /// Delay applied once per completed test case, in milliseconds.
    pub delay_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            unsafe_enabled: false,
            delay_ms: 200,
            timeout_ms: 8000,
        }
    }
}

impl ScanConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Join an endpoint path onto the configured base URL.
    pub fn full_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
