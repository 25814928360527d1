//! # trellis-core
//!
//! Core types for the trellis routing engine: the error enum shared by every
//! crate, settings and their loaders, and tracing setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Engine settings with sensible defaults
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{TrellisError, TrellisResult};
pub use settings::Settings;
