//! The request orchestrator.
//!
//! [`Application`] owns the route table, the lifecycle callbacks, the
//! renderer, and the default layout and data. [`Application::dispatch`] runs
//! one request through the lifecycle:
//!
//! 1. fresh request state, seeded from the defaults
//! 2. `on_start` (arguments: `path`)
//! 3. route match; no match is a 404 with the body `Not found`
//! 4. the route's view, then its handler (arguments: captures plus `path`)
//! 5. a pending redirect becomes a 302
//! 6. view render, then layout render
//! 7. `on_finish` (arguments: `path`, `content`)
//!
//! A non-empty string returned by any callback becomes the body: from
//! `on_start` it ends the request immediately, from a handler it replaces the
//! rendered view, from `on_finish` it replaces the final body.
//!
//! Every failure along the way is caught here, once. It goes to `on_error`
//! (arguments: `error`, `path`, `status`); a non-empty return is the body,
//! otherwise the error message is.

use http::StatusCode;
use serde_json::{Map, Value};
use trellis_core::{Settings, TrellisError, TrellisResult};
use trellis_http::{ParamSource, ResolverMatch, Response, RouteTable};
use trellis_template::{TemplateRenderer, ViewRenderer};

use crate::callback::Callback;
use crate::context::{Context, RequestState};

/// Body of the response when no route matches.
pub const NOT_FOUND_BODY: &str = "Not found";

/// A routing and view-composition application.
///
/// # Examples
///
/// ```
/// use trellis_views::{Application, Callback, Signature};
///
/// let mut app = Application::new();
/// app.add_string_template("user", "<p>user {{ id }}</p>");
/// app.route(
///     "user",
///     "/users[/:id]",
///     Some("user"),
///     Some(Callback::new(Signature::new().nullable("id"), |ctx, args| {
///         let id = args.get("id").cloned().unwrap_or_default();
///         ctx.set("id", id);
///         Ok(None)
///     })),
/// )
/// .unwrap();
///
/// assert_eq!(app.render("/users/7?tab=posts"), "<p>user 7</p>");
/// assert_eq!(app.url("user", &[("id", 9)]).unwrap(), "/users/9");
/// ```
pub struct Application {
    routes: RouteTable<Callback>,
    renderer: Renderer,
    on_start: Option<Callback>,
    on_finish: Option<Callback>,
    on_error: Option<Callback>,
    layout: Option<String>,
    data: Map<String, Value>,
}

enum Renderer {
    Templates(TemplateRenderer),
    Custom(Box<dyn ViewRenderer>),
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.routes)
            .field("layout", &self.layout)
            .field("data", &self.data)
            .field("on_start", &self.on_start.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Creates an application rendering through an in-memory
    /// [`TemplateRenderer`].
    pub fn new() -> Self {
        Self::build(Renderer::Templates(TemplateRenderer::new()))
    }

    /// Creates an application configured from `settings`: views are loaded
    /// from `view_dirs` and `layout` becomes the default layout.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut app = Self::build(Renderer::Templates(TemplateRenderer::from_settings(settings)));
        app.layout.clone_from(&settings.layout);
        app
    }

    /// Creates an application rendering through a custom renderer.
    pub fn with_renderer(renderer: impl ViewRenderer + 'static) -> Self {
        Self::build(Renderer::Custom(Box::new(renderer)))
    }

    fn build(renderer: Renderer) -> Self {
        Self {
            routes: RouteTable::new(),
            renderer,
            on_start: None,
            on_finish: None,
            on_error: None,
            layout: None,
            data: Map::new(),
        }
    }

    /// Registers a route. A name that is already registered is replaced.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPattern` if `pattern` does not parse.
    pub fn route(
        &mut self,
        name: &str,
        pattern: &str,
        view: Option<&str>,
        handler: Option<Callback>,
    ) -> TrellisResult<&mut Self> {
        self.routes.register(name, pattern, view, handler)?;
        Ok(self)
    }

    pub fn on_start(&mut self, callback: Callback) -> &mut Self {
        self.on_start = Some(callback);
        self
    }

    pub fn on_finish(&mut self, callback: Callback) -> &mut Self {
        self.on_finish = Some(callback);
        self
    }

    pub fn on_error(&mut self, callback: Callback) -> &mut Self {
        self.on_error = Some(callback);
        self
    }

    /// Sets the default layout applied to every request.
    pub fn set_layout(&mut self, layout: Option<&str>) -> &mut Self {
        self.layout = layout.map(String::from);
        self
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Sets a default view data value, copied into every request.
    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub const fn routes(&self) -> &RouteTable<Callback> {
        &self.routes
    }

    /// Adds an in-memory view. Only applies when the application renders
    /// through its own [`TemplateRenderer`]; returns `false` otherwise.
    pub fn add_string_template(&self, name: &str, source: &str) -> bool {
        match &self.renderer {
            Renderer::Templates(templates) => {
                templates.add_string_template(name, source);
                true
            }
            Renderer::Custom(_) => false,
        }
    }

    /// Matches `path` against the routes.
    pub fn resolve(&self, path: &str) -> Option<ResolverMatch<'_, Callback>> {
        self.routes.resolve(path)
    }

    /// Builds the URL of a named route.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRoute` or `MissingRequiredParameter`.
    pub fn url<P: ParamSource + ?Sized>(&self, name: &str, params: &P) -> TrellisResult<String> {
        self.routes.reverse(name, params)
    }

    /// Processes one request and returns the response.
    ///
    /// The handler is called with `path` (the request path, query string
    /// included) plus one argument per capture. A capture named `path`
    /// takes precedence over the request path; the full path is still
    /// available through [`Context::path`].
    ///
    /// Never fails: errors become error responses.
    pub fn dispatch(&self, path: &str) -> Response {
        let mut state = RequestState::new(path, self.layout.clone(), self.data.clone());
        match self.process(&mut state) {
            Ok(response) => response,
            Err(err) => self.handle_error(&mut state, &err),
        }
    }

    /// Processes one request and returns only the body.
    pub fn render(&self, path: &str) -> String {
        self.dispatch(path).into_body()
    }

    fn process(&self, state: &mut RequestState) -> TrellisResult<Response> {
        let path = state.path().to_string();

        let args = arguments([("path", Value::String(path.clone()))]);
        if let Some(body) = self.run_callback(self.on_start.as_ref(), state, &args)? {
            return Ok(Response::ok(body));
        }

        let Some(matched) = self.routes.resolve(&path) else {
            let body = self.finish(state, NOT_FOUND_BODY.to_string())?;
            return Ok(Response::not_found(body));
        };

        if let Some(view) = matched.view() {
            state.set_view(Some(view.to_string()));
        }
        state.set_captures(matched.captures.clone());

        let mut returned = None;
        if let Some(handler) = matched.handler() {
            let mut args = arguments([("path", Value::String(path.clone()))]);
            for (name, value) in &matched.captures {
                args.insert(name.clone(), Value::String(value.clone()));
            }
            returned = self.run_callback(Some(handler), state, &args)?;
        }

        if let Some(location) = state.take_redirect() {
            tracing::debug!(route = matched.name(), %location, "redirecting");
            return Response::redirect(&location);
        }

        let content = match returned {
            Some(body) => body,
            None => self.render_view(state)?,
        };
        let body = self.finish(state, content)?;
        Ok(Response::ok(body))
    }

    fn render_view(&self, state: &RequestState) -> TrellisResult<String> {
        let renderer = self.renderer();
        let content = match state.view() {
            Some(view) => renderer.render(view, state.data())?,
            None => String::new(),
        };
        match state.layout() {
            Some(layout) => renderer.render_layout(layout, &content, state.data()),
            None => Ok(content),
        }
    }

    fn finish(&self, state: &mut RequestState, content: String) -> TrellisResult<String> {
        let args = arguments([
            ("path", Value::String(state.path().to_string())),
            ("content", Value::String(content.clone())),
        ]);
        Ok(self
            .run_callback(self.on_finish.as_ref(), state, &args)?
            .unwrap_or(content))
    }

    fn handle_error(&self, state: &mut RequestState, err: &TrellisError) -> Response {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::error!(path = state.path(), status = status.as_u16(), error = %err, "request failed");

        let args = arguments([
            ("error", Value::String(err.to_string())),
            ("path", Value::String(state.path().to_string())),
            ("status", Value::from(status.as_u16())),
        ]);
        let body = match self.run_callback(self.on_error.as_ref(), state, &args) {
            Ok(Some(body)) => body,
            Ok(None) => err.to_string(),
            Err(callback_err) => {
                tracing::warn!(error = %callback_err, "error callback failed");
                err.to_string()
            }
        };
        Response::new(status, body)
    }

    fn run_callback(
        &self,
        callback: Option<&Callback>,
        state: &mut RequestState,
        args: &Map<String, Value>,
    ) -> TrellisResult<Option<String>> {
        let Some(callback) = callback else {
            return Ok(None);
        };
        let mut context = Context::new(state, &self.routes);
        let body = callback.invoke(&mut context, args)?;
        Ok(body.filter(|body| !body.is_empty()))
    }

    fn renderer(&self) -> &dyn ViewRenderer {
        match &self.renderer {
            Renderer::Templates(templates) => templates,
            Renderer::Custom(renderer) => renderer.as_ref(),
        }
    }
}

fn arguments<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::binder::Signature;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str) -> Callback {
        let log = Arc::clone(log);
        Callback::from_fn(move |_| {
            log.lock().unwrap().push(label.to_string());
            Ok(None)
        })
    }

    /// Fails every render with the requested error.
    struct FailingRenderer(fn(String) -> TrellisError);

    impl ViewRenderer for FailingRenderer {
        fn render(&self, view: &str, _data: &Map<String, Value>) -> TrellisResult<String> {
            Err((self.0)(view.to_string()))
        }

        fn render_layout(
            &self,
            layout: &str,
            _content: &str,
            _data: &Map<String, Value>,
        ) -> TrellisResult<String> {
            Err((self.0)(layout.to_string()))
        }
    }

    #[test]
    fn test_process_runs_lifecycle_in_order() {
        let log: Log = Arc::default();
        let mut app = Application::new();
        app.add_string_template("home", "home");
        let handler_log = Arc::clone(&log);
        app.route(
            "home",
            "/",
            Some("home"),
            Some(Callback::from_fn(move |_| {
                handler_log.lock().unwrap().push("handler".to_string());
                Ok(None)
            })),
        )
        .unwrap();
        app.on_start(recorder(&log, "start"));
        app.on_finish(recorder(&log, "finish"));
        app.on_error(recorder(&log, "error"));

        let mut state = RequestState::new("/", None, Map::new());
        let response = app.process(&mut state).unwrap();
        assert_eq!(response.body(), "home");
        assert_eq!(*log.lock().unwrap(), ["start", "handler", "finish"]);
    }

    #[test]
    fn test_process_start_short_circuit_skips_route() {
        let log: Log = Arc::default();
        let mut app = Application::new();
        app.route("home", "/", None, Some(recorder(&log, "handler"))).unwrap();
        app.on_start(Callback::from_fn(|_| Ok(Some("maintenance".to_string()))));
        app.on_finish(recorder(&log, "finish"));

        let mut state = RequestState::new("/", None, Map::new());
        let response = app.process(&mut state).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "maintenance");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_process_unmatched_still_finishes() {
        let log: Log = Arc::default();
        let mut app = Application::new();
        app.on_finish(recorder(&log, "finish"));

        let mut state = RequestState::new("/nowhere", None, Map::new());
        let response = app.process(&mut state).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), NOT_FOUND_BODY);
        assert_eq!(*log.lock().unwrap(), ["finish"]);
    }

    #[test]
    fn test_process_redirect_skips_finish() {
        let log: Log = Arc::default();
        let mut app = Application::new();
        app.route(
            "old",
            "/old",
            Some("never rendered"),
            Some(Callback::from_fn(|ctx| {
                ctx.redirect_to("/new");
                Ok(None)
            })),
        )
        .unwrap();
        app.on_finish(recorder(&log, "finish"));

        let mut state = RequestState::new("/old", None, Map::new());
        let response = app.process(&mut state).unwrap();
        assert_eq!(response.location(), Some("/new"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_process_invalid_redirect_location_is_an_error() {
        let mut app = Application::new();
        app.route(
            "bad",
            "/bad",
            None,
            Some(Callback::from_fn(|ctx| {
                ctx.redirect_to("/users/Zoë");
                Ok(None)
            })),
        )
        .unwrap();

        let mut state = RequestState::new("/bad", None, Map::new());
        let err = app.process(&mut state).unwrap_err();
        assert!(matches!(err, TrellisError::InternalServerError(_)));
    }

    #[test]
    fn test_capture_named_path_shadows_request_path() {
        let mut app = Application::new();
        app.route(
            "files",
            "/files/:path",
            None,
            Some(Callback::new(Signature::new().required("path"), |ctx, args| {
                Ok(Some(format!("{} {}", args.get_str("path").unwrap_or_default(), ctx.path())))
            })),
        )
        .unwrap();

        assert_eq!(app.render("/files/readme?raw=1"), "readme /files/readme?raw=1");
    }

    #[test]
    fn test_handle_error_maps_status_and_calls_on_error() {
        let mut app = Application::new();
        app.on_error(Callback::new(
            Signature::new().required("error").required("path").required("status"),
            |_, args| {
                Ok(Some(format!(
                    "{} {} {}",
                    args.get("status").cloned().unwrap_or_default(),
                    args.get_str("path").unwrap_or_default(),
                    args.get_str("error").unwrap_or_default()
                )))
            },
        ));

        let mut state = RequestState::new("/gone", None, Map::new());
        let err = TrellisError::TemplateDoesNotExist("gone".to_string());
        let response = app.handle_error(&mut state, &err);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), "404 /gone Template does not exist: gone");
    }

    #[test]
    fn test_handle_error_falls_back_to_message() {
        let mut app = Application::new();
        app.on_error(Callback::from_fn(|_| {
            Err(TrellisError::HandlerError("error page broke".to_string()))
        }));

        let mut state = RequestState::new("/", None, Map::new());
        let err = TrellisError::InternalServerError("boom".to_string());
        let response = app.handle_error(&mut state, &err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), err.to_string());

        app.on_error(Callback::from_fn(|_| Ok(Some(String::new()))));
        let response = app.handle_error(&mut state, &err);
        assert_eq!(response.body(), err.to_string());
    }

    #[test]
    fn test_custom_renderer_errors_reach_dispatch() {
        let mut app = Application::with_renderer(FailingRenderer(TrellisError::TemplateSyntaxError));
        assert!(!app.add_string_template("home", "ignored"));
        app.route("home", "/", Some("home"), None).unwrap();

        let response = app.dispatch("/");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().contains("home"));
    }

    #[test]
    fn test_arguments() {
        let args = arguments([("path", Value::from("/")), ("status", Value::from(404))]);
        assert_eq!(args.len(), 2);
        assert_eq!(args["status"], Value::from(404));
    }
}
