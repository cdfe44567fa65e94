//! Default path resolution for the configuration file
//!
//! Uses XDG Base Directory specification when available, with sensible fallbacks.

use std::path::PathBuf;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "PWMFAN_CONFIG";

/// Returns the default path for the configuration file.
///
/// Uses XDG config directory if available:
/// - Linux: `~/.config/pwmfan/config.toml`
/// - Fallback: `/etc/pwmfan/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("pwmfan")
        .join("config.toml")
}

/// Resolve the configuration path: explicit flag > environment > default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    })
}
