//! The route table and forward resolution.
//!
//! [`RouteTable`] keeps routes in registration order and indexes them by
//! name. Resolution tries each route in that order and returns the first
//! match, so a `*` catch-all shadows everything registered after it.

use std::collections::HashMap;
use std::fmt;

use trellis_core::TrellisResult;

use super::pattern::RoutePattern;
use super::reverse::{self, ParamSource};

/// A named route: a pattern plus an optional view and handler.
///
/// The handler type is left to the caller; the HTTP layer never invokes it.
pub struct Route<H> {
    name: String,
    pattern: RoutePattern,
    view: Option<String>,
    handler: Option<H>,
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("view", &self.view)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl<H> Route<H> {
    /// Creates a route, compiling its pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed.
    pub fn new(
        name: &str,
        pattern: &str,
        view: Option<&str>,
        handler: Option<H>,
    ) -> TrellisResult<Self> {
        Ok(Self {
            name: name.to_string(),
            pattern: RoutePattern::parse(pattern)?,
            view: view.map(String::from),
            handler,
        })
    }

    /// Returns the route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled pattern.
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Returns the view rendered when this route matches, if any.
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Returns the handler, if any.
    pub const fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }
}

/// The result of resolving a path: the matched route and its captures.
pub struct ResolverMatch<'a, H> {
    /// The matched route.
    pub route: &'a Route<H>,
    /// Captured parameters, by name. Values are raw path text.
    pub captures: HashMap<String, String>,
}

impl<H> fmt::Debug for ResolverMatch<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMatch")
            .field("route", &self.route.name)
            .field("captures", &self.captures)
            .finish()
    }
}

impl<'a, H> ResolverMatch<'a, H> {
    /// Returns the name of the matched route.
    pub fn name(&self) -> &'a str {
        self.route.name()
    }

    /// Returns the matched route's view, if any.
    pub fn view(&self) -> Option<&'a str> {
        self.route.view()
    }

    /// Returns the matched route's handler, if any.
    pub fn handler(&self) -> Option<&'a H> {
        self.route.handler()
    }

    /// Returns a captured parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }
}

/// Routes in registration order, indexed by name.
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
    index: HashMap<String, usize>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Compiles and registers a route.
    ///
    /// Registering a name that already exists replaces the earlier route in
    /// place, so it keeps its original position in the match order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed; the table is unchanged.
    pub fn register(
        &mut self,
        name: &str,
        pattern: &str,
        view: Option<&str>,
        handler: Option<H>,
    ) -> TrellisResult<()> {
        let route = Route::new(name, pattern, view, handler)?;
        self.insert(route);
        Ok(())
    }

    /// Inserts an already-built route, replacing any route with the same name.
    pub fn insert(&mut self, route: Route<H>) {
        if let Some(&position) = self.index.get(&route.name) {
            tracing::debug!(route = %route.name, pattern = %route.pattern, "replacing route");
            self.routes[position] = route;
        } else {
            tracing::debug!(route = %route.name, pattern = %route.pattern, "registering route");
            self.index.insert(route.name.clone(), self.routes.len());
            self.routes.push(route);
        }
    }

    /// Returns the route registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Route<H>> {
        self.index.get(name).map(|&position| &self.routes[position])
    }

    /// Returns `true` if a route is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over routes in match order.
    pub fn iter(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    /// Resolves a request path to the first matching route.
    ///
    /// Anything from the first `?` on is ignored. Returns `None` when no route
    /// matches; that is not an error.
    pub fn resolve(&self, path: &str) -> Option<ResolverMatch<'_, H>> {
        let path = strip_query(path);

        for route in &self.routes {
            if let Some(captures) = route.pattern.full_match(path) {
                tracing::debug!(route = %route.name, path, "route matched");
                return Some(ResolverMatch { route, captures });
            }
        }

        tracing::debug!(path, "no route matched");
        None
    }

    /// Generates the URL for a named route. See [`reverse::reverse`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown route or a missing required parameter.
    pub fn reverse<P: ParamSource + ?Sized>(&self, name: &str, params: &P) -> TrellisResult<String> {
        reverse::reverse(self, name, params)
    }
}

/// Returns `path` without its query string.
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(before, _)| before)
}
