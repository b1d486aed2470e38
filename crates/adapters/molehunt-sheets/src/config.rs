use serde::Deserialize;

/// Configuration for the spreadsheet script endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Deployed script URL; every action is sent to this one endpoint.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 15,
            user_agent: "molehunt/0.1".to_string(),
        }
    }
}
