//! Client config load/save for `~/.clarity/config.yaml`.

use std::path::{Path, PathBuf};

use tracing::warn;

pub use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "CLARITY_CONFIG";
pub const AGENT_URL_ENV: &str = "CLARITY_AGENT_URL";
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8080";
pub const DEFAULT_ACK_TEXT: &str = "I’ve logged that entry for you.";
pub const DEFAULT_SEND_FAILURE_TEXT: &str =
    "I could not reach our thinking space just now. Please check your connection and try again.";

/// Agent section (HTTP base address; the WebSocket address is derived from it).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AgentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UserSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AudioSection {
    /// Directory to write spoken replies into. Audio is discarded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,
}

/// User-visible strings, for localization.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MessagesSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_failure: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub user: UserSection,
    #[serde(default)]
    pub audio: AudioSection,
    #[serde(default)]
    pub messages: MessagesSection,
}

impl Config {
    /// WebSocket base address. `CLARITY_AGENT_URL` wins over `agent.url`.
    pub fn agent_ws_base(&self) -> String {
        let from_env = std::env::var(AGENT_URL_ENV).ok();
        ws_base_url(from_env.as_deref().or(self.agent.url.as_deref()))
    }

    pub fn ack_default(&self) -> &str {
        self.messages.ack_default.as_deref().unwrap_or(DEFAULT_ACK_TEXT)
    }

    pub fn send_failure(&self) -> &str {
        self.messages
            .send_failure
            .as_deref()
            .unwrap_or(DEFAULT_SEND_FAILURE_TEXT)
    }
}

/// Strip trailing slashes; empty means unset.
pub fn sanitize_base_url(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Turn an HTTP base address into the matching WebSocket one, falling back to
/// [`DEFAULT_AGENT_URL`].
pub fn ws_base_url(configured: Option<&str>) -> String {
    let base = match configured.and_then(sanitize_base_url) {
        Some(url) => url,
        None => {
            warn!("agent url is not configured, falling back to {DEFAULT_AGENT_URL}");
            DEFAULT_AGENT_URL.to_string()
        }
    };
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base
    }
}

/// Returns the default config file path: `~/.clarity/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".clarity").join("config.yaml"))
}

/// Resolve config path from an explicit override, `CLARITY_CONFIG`, or the default.
pub fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        return Some(p.to_path_buf());
    }
    if let Some(val) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(val));
    }
    default_config_path()
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
