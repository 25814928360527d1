//! View rendering.
//!
//! [`ViewRenderer`] is the seam the orchestrator renders through.
//! [`TemplateRenderer`] is the stock implementation: it asks its loaders for
//! the view's source, evaluates it into a buffer, and returns the buffer. A
//! view that no loader has is not an error; its identifier is emitted as the
//! output instead, so routes can name fixed strings as well as files.

use serde_json::{Map, Value};
use trellis_core::{Settings, TrellisError, TrellisResult};

use crate::lexer::{self, Token};
use crate::loaders::{FileSystemLoader, StringLoader, TemplateLoader};
use crate::value::{escape_html, Expression};

/// Name under which a layout receives the rendered view.
pub const CONTENT_KEY: &str = "content";

/// Renders views and layouts to strings.
pub trait ViewRenderer: Send + Sync {
    /// Renders `view` with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails. No partial output is returned.
    fn render(&self, view: &str, data: &Map<String, Value>) -> TrellisResult<String>;

    /// Renders `layout` with `data` plus the already-rendered `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn render_layout(
        &self,
        layout: &str,
        content: &str,
        data: &Map<String, Value>,
    ) -> TrellisResult<String>;

    /// Renders `view`, then wraps it in `layout` when one is given.
    ///
    /// # Errors
    ///
    /// Returns the first failure from either render.
    fn render_with_layout(
        &self,
        view: &str,
        layout: Option<&str>,
        data: &Map<String, Value>,
    ) -> TrellisResult<String> {
        let content = self.render(view, data)?;
        match layout {
            Some(layout) => self.render_layout(layout, &content, data),
            None => Ok(content),
        }
    }
}

/// Loader-backed template renderer.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Map};
/// use trellis_template::{TemplateRenderer, ViewRenderer};
///
/// let renderer = TemplateRenderer::new();
/// renderer.add_string_template("hello", "Hello {{ name }}!");
///
/// let mut data = Map::new();
/// data.insert("name".into(), json!("World"));
/// assert_eq!(renderer.render("hello", &data).unwrap(), "Hello World!");
///
/// // Unknown views are emitted literally.
/// assert_eq!(renderer.render("<p>static</p>", &data).unwrap(), "<p>static</p>");
/// ```
pub struct TemplateRenderer {
    loaders: Vec<Box<dyn TemplateLoader>>,
    string_loader: StringLoader,
    auto_escape: bool,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("loaders", &self.loaders.len())
            .field("auto_escape", &self.auto_escape)
            .finish_non_exhaustive()
    }
}

impl TemplateRenderer {
    /// Creates a renderer with only the in-memory loader, auto-escaping on.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            string_loader: StringLoader::new(),
            auto_escape: true,
        }
    }

    /// Creates a renderer searching `settings.view_dirs`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut renderer = Self::new();
        renderer.add_loader(Box::new(FileSystemLoader::with_extension(
            settings.view_dirs.clone(),
            &settings.view_extension,
        )));
        renderer.auto_escape = settings.auto_escape;
        renderer
    }

    /// Adds a loader, searched after those already registered.
    pub fn add_loader(&mut self, loader: Box<dyn TemplateLoader>) {
        self.loaders.push(loader);
    }

    /// Adds an in-memory template. These are searched before any loader.
    pub fn add_string_template(&self, name: &str, source: &str) {
        self.string_loader.add(name, source);
    }

    /// Sets whether variable output is HTML-escaped.
    pub fn set_auto_escape(&mut self, enabled: bool) {
        self.auto_escape = enabled;
    }

    /// Returns whether variable output is HTML-escaped.
    pub const fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    /// Loads a view's source.
    ///
    /// # Errors
    ///
    /// Returns `TemplateDoesNotExist` if no loader has it, or the first
    /// other error a loader raises.
    pub fn load_source(&self, name: &str) -> TrellisResult<String> {
        let loaders = std::iter::once(&self.string_loader as &dyn TemplateLoader)
            .chain(self.loaders.iter().map(|loader| loader.as_ref() as &dyn TemplateLoader));

        for loader in loaders {
            match loader.load(name) {
                Ok(source) => return Ok(source),
                Err(TrellisError::TemplateDoesNotExist(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Err(TrellisError::TemplateDoesNotExist(format!(
            "View '{name}' could not be found"
        )))
    }

    /// Evaluates template source against `data`.
    ///
    /// # Errors
    ///
    /// Returns a `TemplateSyntaxError` for malformed tags or unknown filters.
    pub fn render_source(
        &self,
        source: &str,
        data: &Map<String, Value>,
        safe_keys: &[&str],
    ) -> TrellisResult<String> {
        let mut out = String::with_capacity(source.len());
        for token in lexer::tokenize(source)? {
            match token {
                Token::Text(text) => out.push_str(&text),
                Token::Variable(expr) => {
                    let rendered = Expression::parse(&expr)?.evaluate(data, safe_keys)?;
                    if self.auto_escape && !rendered.safe {
                        out.push_str(&escape_html(&rendered.text));
                    } else {
                        out.push_str(&rendered.text);
                    }
                }
                Token::Comment(_) => {}
            }
        }
        Ok(out)
    }

    fn render_named(
        &self,
        name: &str,
        data: &Map<String, Value>,
        safe_keys: &[&str],
    ) -> TrellisResult<String> {
        match self.load_source(name) {
            Ok(source) => self.render_source(&source, data, safe_keys),
            Err(TrellisError::TemplateDoesNotExist(_)) => {
                tracing::trace!(view = name, "no such view, emitting literally");
                Ok(name.to_string())
            }
            Err(e) => Err(e),
        }
    }
}

impl ViewRenderer for TemplateRenderer {
    fn render(&self, view: &str, data: &Map<String, Value>) -> TrellisResult<String> {
        self.render_named(view, data, &[])
    }

    fn render_layout(
        &self,
        layout: &str,
        content: &str,
        data: &Map<String, Value>,
    ) -> TrellisResult<String> {
        let mut data = data.clone();
        data.insert(CONTENT_KEY.to_string(), Value::String(content.to_string()));
        self.render_named(layout, &data, &[CONTENT_KEY])
    }
}
