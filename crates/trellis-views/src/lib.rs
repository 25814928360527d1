//! # trellis-views
//!
//! The request side of trellis: callbacks with declared parameters, the
//! per-request [`Context`] they receive, and the [`Application`] that runs
//! each request through matching, handlers, rendering, and the lifecycle
//! callbacks.
//!
//! ## Modules
//!
//! - [`binder`] - Binds named arguments onto declared parameters
//! - [`callback`] - Route handlers and lifecycle callbacks
//! - [`context`] - Request state and the callback context
//! - [`app`] - The [`Application`] orchestrator
//! - [`server`] - axum integration

pub mod app;
pub mod binder;
pub mod callback;
pub mod context;
pub mod server;

pub use app::Application;
pub use binder::{bind, ArgumentSource, BoundArguments, Parameter, Signature};
pub use callback::Callback;
pub use context::{Context, RequestState};
