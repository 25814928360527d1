//! Settings for the trellis engine.
//!
//! [`Settings`] holds the handful of knobs the engine and its HTTP adapter
//! read at startup. Every field has a default, so a settings file only needs to
//! name what it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The complete set of engine settings.
///
/// # Examples
///
/// ```
/// use trellis_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.view_extension, "html");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The address the HTTP adapter binds to.
    pub bind_address: String,

    // ── Views ────────────────────────────────────────────────────────

    /// Directories searched, in order, for view and layout templates.
    pub view_dirs: Vec<PathBuf>,
    /// Extension appended to view names that have none (without the dot).
    pub view_extension: String,
    /// The layout every response is wrapped in, unless a handler changes it.
    pub layout: Option<String>,
    /// Whether `{{ var }}` output is HTML-escaped.
    pub auto_escape: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level filter (e.g. "info", "debug", "trellis_http=trace").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            bind_address: "127.0.0.1:8000".to_string(),
            view_dirs: vec![PathBuf::from("views")],
            view_extension: "html".to_string(),
            layout: None,
            auto_escape: true,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.debug);
        assert!(settings.auto_escape);
        assert!(settings.layout.is_none());
        assert_eq!(settings.bind_address, "127.0.0.1:8000");
        assert_eq!(settings.view_dirs, vec![PathBuf::from("views")]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_layout() {
        let settings = Settings {
            layout: Some("layout".to_string()),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.layout.as_deref(), Some("layout"));
    }
}
