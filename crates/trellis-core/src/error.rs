//! Core error types for trellis.
//!
//! [`TrellisError`] covers the routing contract violations (unknown routes,
//! missing parameters and arguments, malformed patterns), template failures,
//! failures raised from user handlers, and configuration problems.

use thiserror::Error;

/// The primary error type for trellis.
///
/// Matching a path never produces an error; a path that no route accepts is a
/// normal "no result". Everything here is raised to the caller immediately and
/// is never retried.
#[derive(Error, Debug)]
pub enum TrellisError {
    // ── Routing ──────────────────────────────────────────────────────

    /// A route name was looked up that was never registered.
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// A `:name` token outside every optional segment had no value.
    #[error("Missing required parameter '{parameter}' for route '{route}'")]
    MissingRequiredParameter {
        /// The parameter that had no value.
        parameter: String,
        /// The route being assembled.
        route: String,
    },

    /// A handler parameter had no supplied value, no default, and is not nullable.
    #[error("Required argument missing: {0}")]
    MissingRequiredArgument(String),

    /// A route pattern could not be compiled.
    #[error("Malformed pattern '{pattern}': {reason}")]
    MalformedPattern {
        /// The offending pattern source.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    // ── Templates ────────────────────────────────────────────────────

    /// The requested template was not found by any loader.
    #[error("Template does not exist: {0}")]
    TemplateDoesNotExist(String),

    /// A template contains invalid syntax.
    #[error("Template syntax error: {0}")]
    TemplateSyntaxError(String),

    // ── Handlers ─────────────────────────────────────────────────────

    /// A failure raised by a route handler or lifecycle callback.
    #[error("Handler error: {0}")]
    HandlerError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The engine is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A generic internal failure.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrellisError {
    /// Convenience constructor for failures raised inside handlers.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerError(message.into())
    }

    /// Returns the HTTP status code a failed request should be answered with.
    ///
    /// Every variant represents a programming or configuration mistake on the
    /// server side, so they all map to 500 except a missing template, which
    /// is reported as 404 when it reaches the HTTP boundary.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::TemplateDoesNotExist(_) => 404,
            Self::UnknownRoute(_)
            | Self::MissingRequiredParameter { .. }
            | Self::MissingRequiredArgument(_)
            | Self::MalformedPattern { .. }
            | Self::TemplateSyntaxError(_)
            | Self::HandlerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::InternalServerError(_)
            | Self::IoError(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, TrellisError>`.
pub type TrellisResult<T> = Result<T, TrellisError>;
