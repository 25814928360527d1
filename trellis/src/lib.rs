//! # trellis
//!
//! A small request-routing and view-composition engine for server-rendered
//! responses.
//!
//! This is the meta-crate that re-exports all sub-crates. Depend on
//! `trellis` for everything, or on the individual crates for less.
//!
//! ```
//! use trellis::prelude::*;
//!
//! let mut app = Application::new();
//! app.route("user", "/users[/:id]", Some("a user page"), None).unwrap();
//! assert_eq!(app.render("/users/7"), "a user page");
//! assert_eq!(app.url("user", &[("id", 7)]).unwrap(), "/users/7");
//! ```

/// Error types, settings, and logging setup.
pub use trellis_core as core;

/// Route patterns, matching, URL assembly, and responses.
#[cfg(feature = "http")]
pub use trellis_http as http;

/// View loading and rendering.
#[cfg(feature = "template")]
pub use trellis_template as template;

/// Callbacks, request context, the `Application`, and the axum server.
#[cfg(feature = "views")]
pub use trellis_views as views;

pub use axum;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most applications need.
pub mod prelude {
    pub use trellis_core::{Settings, TrellisError, TrellisResult};

    #[cfg(feature = "http")]
    pub use trellis_http::{Response, RouteTable};

    #[cfg(feature = "template")]
    pub use trellis_template::{TemplateRenderer, ViewRenderer};

    #[cfg(feature = "views")]
    pub use trellis_views::{server, Application, BoundArguments, Callback, Context, Signature};
}
