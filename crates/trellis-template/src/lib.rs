//! # trellis-template
//!
//! View rendering for trellis. Templates are plain text with `{{ variable }}`
//! substitutions and `{# comments #}`; a view that no loader can find is
//! emitted as its literal name, so a route may name either a template or a
//! fixed string.
//!
//! ## Modules
//!
//! - [`lexer`] - Tokenizes template source
//! - [`loaders`] - Filesystem and in-memory template loaders
//! - [`value`] - Variable lookup, filters, and HTML escaping
//! - [`engine`] - The [`ViewRenderer`] trait and [`TemplateRenderer`]

pub mod engine;
pub mod lexer;
pub mod loaders;
pub mod value;

pub use engine::{TemplateRenderer, ViewRenderer};
pub use loaders::{FileSystemLoader, StringLoader, TemplateLoader};
