use std::path::Path;

use thiserror::Error;

mod schema;

pub use schema::{CredentialsConfig, EvalviewConfig, ServerConfig, TerminalConfig};

/// Why an `evalview.toml` could not be turned into an [`EvalviewConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    /// Bad TOML, or a key the dashboard does not know.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Read `evalview.toml` at `path`.
///
/// A missing file means a local backend: HTTP on `http://127.0.0.1:5001`,
/// the terminal socket at `ws://127.0.0.1:5001/ws` (see
/// [`ServerConfig::socket_url`]), a 30 second request timeout, a 40x120
/// viewport, and the `ml-models-dev` account as the expected identity.
pub fn load_config(path: &Path) -> Result<EvalviewConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no evalview.toml, assuming a local backend");
        return Ok(EvalviewConfig::default());
    }

    let data = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_config(&data)
}

/// Sections and keys left out keep their local-backend defaults, so
/// `[server]\nbase_url = "https://evals.internal"` alone moves both the
/// HTTP endpoints and the socket (to `wss://evals.internal/ws`).
pub fn parse_config(data: &str) -> Result<EvalviewConfig, ConfigError> {
    let config: EvalviewConfig = toml::from_str(data)?;
    validate(&config)?;
    Ok(config)
}

/// Check an assembled config, e.g. after CLI overrides were applied.
pub fn validate(config: &EvalviewConfig) -> Result<(), ConfigError> {
    let base_url = config.server.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("server.base_url must be an http(s) URL, got '{base_url}'"),
        });
    }

    if !config.server.socket_path.starts_with('/') {
        return Err(ConfigError::Validation {
            message: format!(
                "server.socket_path must start with '/', got '{}'",
                config.server.socket_path
            ),
        });
    }

    if config.server.request_timeout_seconds == 0 {
        return Err(ConfigError::Validation {
            message: "server.request_timeout_seconds must be > 0".to_string(),
        });
    }

    let account = &config.credentials.expected_account;
    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation {
            message: format!("credentials.expected_account must be 12 digits, got '{account}'"),
        });
    }

    if config.terminal.rows == 0 || config.terminal.cols == 0 {
        return Err(ConfigError::Validation {
            message: "terminal.rows and terminal.cols must be > 0".to_string(),
        });
    }

    Ok(())
}
