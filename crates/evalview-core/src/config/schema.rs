use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `evalview.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EvalviewConfig {
    pub server: ServerConfig,
    pub credentials: CredentialsConfig,
    pub terminal: TerminalConfig,
}

/// Where the dashboard backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub base_url: String,
    pub socket_path: String,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            socket_path: "/ws".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl ServerConfig {
    /// WebSocket URL of the terminal channel, derived from `base_url`.
    pub fn socket_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{ws_base}{}", self.socket_path)
    }
}

/// The single cloud identity the results view is gated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CredentialsConfig {
    pub expected_account: String,
    pub account_label: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            expected_account: "620778743555".to_string(),
            account_label: "ml-models-dev".to_string(),
        }
    }
}

/// Initial viewport geometry, used until the first local resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TerminalConfig {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            rows: 40,
            cols: 120,
        }
    }
}
