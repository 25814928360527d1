//! Per-request state and the context handed to callbacks.
//!
//! Every request starts from a fresh [`RequestState`] seeded with the
//! application's default layout and data. Callbacks never touch the
//! application itself; they get a [`Context`] borrowing that state plus the
//! route table (for URL generation).

use std::collections::HashMap;

use serde_json::{Map, Value};
use trellis_core::TrellisResult;
use trellis_http::{ParamSource, RouteTable};

use crate::callback::Callback;

/// Mutable state for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    path: String,
    captures: HashMap<String, String>,
    data: Map<String, Value>,
    view: Option<String>,
    layout: Option<String>,
    redirect: Option<String>,
}

impl RequestState {
    /// Creates request state for `path` with the given defaults.
    pub fn new(path: &str, layout: Option<String>, data: Map<String, Value>) -> Self {
        Self {
            path: path.to_string(),
            layout,
            data,
            ..Self::default()
        }
    }

    /// The request path, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn captures(&self) -> &HashMap<String, String> {
        &self.captures
    }

    pub(crate) fn set_captures(&mut self, captures: HashMap<String, String>) {
        self.captures = captures;
    }

    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// The pending redirect target, if a callback asked for one.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub(crate) fn take_redirect(&mut self) -> Option<String> {
        self.redirect.take()
    }

    pub(crate) fn set_view(&mut self, view: Option<String>) {
        self.view = view;
    }
}

/// What a callback sees of the request: read and write access to the
/// request state, and read access to the routes.
pub struct Context<'a> {
    state: &'a mut RequestState,
    routes: &'a RouteTable<Callback>,
}

impl<'a> Context<'a> {
    pub fn new(state: &'a mut RequestState, routes: &'a RouteTable<Callback>) -> Self {
        Self { state, routes }
    }

    /// The request path, including any query string.
    pub fn path(&self) -> &str {
        &self.state.path
    }

    /// Returns a parameter captured from the path.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.state.captures.get(name).map(String::as_str)
    }

    pub const fn captures(&self) -> &HashMap<String, String> {
        &self.state.captures
    }

    /// Returns a view data value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.data.get(key)
    }

    /// Sets a view data value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.data.insert(key.into(), value.into());
    }

    /// Removes a view data value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.data.remove(key)
    }

    pub const fn data(&self) -> &Map<String, Value> {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.state.data
    }

    pub fn view(&self) -> Option<&str> {
        self.state.view.as_deref()
    }

    /// Sets the view rendered for this request.
    pub fn set_view(&mut self, view: impl Into<String>) {
        self.state.view = Some(view.into());
    }

    /// Clears the view; only the layout (if any) is rendered.
    pub fn clear_view(&mut self) {
        self.state.view = None;
    }

    pub fn layout(&self) -> Option<&str> {
        self.state.layout.as_deref()
    }

    /// Sets the layout wrapped around the view for this request.
    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.state.layout = Some(layout.into());
    }

    /// Renders the view without a layout for this request.
    pub fn clear_layout(&mut self) {
        self.state.layout = None;
    }

    /// Builds the URL of a named route.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRoute` or `MissingRequiredParameter`.
    pub fn url<P: ParamSource + ?Sized>(&self, name: &str, params: &P) -> TrellisResult<String> {
        self.routes.reverse(name, params)
    }

    /// Redirects to a named route instead of rendering.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRoute` or `MissingRequiredParameter`; no redirect is
    /// recorded in that case.
    pub fn redirect<P: ParamSource + ?Sized>(&mut self, name: &str, params: &P) -> TrellisResult<()> {
        let url = self.url(name, params)?;
        self.redirect_to(url);
        Ok(())
    }

    /// Redirects to a literal URL instead of rendering.
    pub fn redirect_to(&mut self, url: impl Into<String>) {
        self.state.redirect = Some(url.into());
    }
}
