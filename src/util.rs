//! Shared utility functions used across the codebase.

use std::path::PathBuf;

/// Name of the per-user directory holding the credential file.
pub const CONFIG_DIR_NAME: &str = "trainingpeaks-mcp";

/// Parse a boolean flag value.
///
/// Recognises `1`, `true`, `yes`, `y`, `on` (case-insensitive) as `true`;
/// everything else maps to `false`.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// The user's home directory, falling back to `$HOME` and then `/root`.
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/root"))
}

/// `~/.config/trainingpeaks-mcp`, on every platform.
pub fn default_config_dir() -> PathBuf {
    home_dir().join(".config").join(CONFIG_DIR_NAME)
}
