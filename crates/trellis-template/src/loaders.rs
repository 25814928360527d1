//! Template loaders.
//!
//! A [`TemplateLoader`] turns a view name into template source. The renderer
//! asks each configured loader in turn; `TemplateDoesNotExist` means "try the
//! next one", any other error aborts the render.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use trellis_core::{TrellisError, TrellisResult};

/// Loads template source text by name.
pub trait TemplateLoader: Send + Sync {
    /// Loads the template source with the given name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateDoesNotExist` if the template cannot be found.
    fn load(&self, name: &str) -> TrellisResult<String>;
}

/// Loads views from one or more directories on the filesystem.
///
/// Searches each directory in order and returns the first match. A name
/// without an extension gets the configured one appended, so the view
/// `"users/show"` loads `users/show.html`.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
    extension: String,
}

impl FileSystemLoader {
    /// Creates a loader over `dirs` using the `html` extension.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self::with_extension(dirs, "html")
    }

    /// Creates a loader over `dirs` with a custom default extension.
    ///
    /// A leading dot is ignored; an empty extension disables appending.
    pub fn with_extension(dirs: Vec<PathBuf>, extension: &str) -> Self {
        Self {
            dirs,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Returns the search directories.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn file_name(&self, name: &str) -> PathBuf {
        let path = Path::new(name.trim_start_matches('/'));
        if self.extension.is_empty() || path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(&self.extension)
        }
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> TrellisResult<String> {
        // View names come from route definitions, but keep them inside the
        // configured directories all the same.
        if name.split('/').any(|part| part == "..") {
            return Err(TrellisError::TemplateDoesNotExist(format!(
                "Refusing to load '{name}' outside the view directories"
            )));
        }

        let file_name = self.file_name(name);
        for dir in &self.dirs {
            let path = dir.join(&file_name);
            if path.is_file() {
                tracing::trace!(path = %path.display(), "loading view");
                // The file exists, so a failed read is an IO error, not a miss.
                return Ok(std::fs::read_to_string(&path)?);
            }
        }

        Err(TrellisError::TemplateDoesNotExist(format!(
            "View '{name}' not found in directories: {:?}",
            self.dirs
        )))
    }
}

/// Loads templates from an in-memory map of names to source strings.
#[derive(Debug, Default)]
pub struct StringLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl StringLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader from a map of names to source strings.
    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }
}

impl TemplateLoader for StringLoader {
    fn load(&self, name: &str) -> TrellisResult<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                TrellisError::TemplateDoesNotExist(format!(
                    "Template '{name}' not found in StringLoader"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_loader_basic() {
        let loader = StringLoader::new();
        loader.add("hello", "Hello {{ name }}!");
        assert_eq!(loader.load("hello").unwrap(), "Hello {{ name }}!");
    }

    #[test]
    fn test_string_loader_not_found() {
        let err = StringLoader::new().load("missing").unwrap_err();
        assert!(matches!(err, TrellisError::TemplateDoesNotExist(_)));
    }

    #[test]
    fn test_string_loader_from_map_and_overwrite() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), "content A".to_string());
        let loader = StringLoader::from_map(map);
        assert_eq!(loader.load("a").unwrap(), "content A");

        loader.add("a", "version 2");
        assert_eq!(loader.load("a").unwrap(), "version 2");
    }

    #[test]
    fn test_filesystem_loader_not_found() {
        let loader = FileSystemLoader::new(vec![PathBuf::from("/nonexistent/path")]);
        assert!(loader.load("missing").is_err());
    }

    #[test]
    fn test_filesystem_loader_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("users")).unwrap();
        std::fs::write(dir.path().join("users/show.html"), "user {{ id }}").unwrap();

        let loader = FileSystemLoader::new(vec![dir.path().to_path_buf()]);
        assert_eq!(loader.load("users/show").unwrap(), "user {{ id }}");
        assert_eq!(loader.load("users/show.html").unwrap(), "user {{ id }}");
        assert_eq!(loader.load("/users/show").unwrap(), "user {{ id }}");
    }

    #[test]
    fn test_filesystem_loader_search_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("page.tpl"), "first").unwrap();
        std::fs::write(second.path().join("page.tpl"), "second").unwrap();
        std::fs::write(second.path().join("only.tpl"), "only second").unwrap();

        let loader = FileSystemLoader::with_extension(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            ".tpl",
        );
        assert_eq!(loader.load("page").unwrap(), "first");
        assert_eq!(loader.load("only").unwrap(), "only second");
        assert_eq!(loader.dirs().len(), 2);
    }

    #[test]
    fn test_filesystem_loader_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileSystemLoader::new(vec![dir.path().join("views")]);
        std::fs::write(dir.path().join("secret.html"), "nope").unwrap();
        assert!(loader.load("../secret").is_err());
    }

    #[test]
    fn test_filesystem_loader_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), [0xff, 0xfe, b'h', b'i']).unwrap();
        let loader = FileSystemLoader::new(vec![dir.path().to_path_buf()]);

        let err = loader.load("page").unwrap_err();
        assert!(matches!(err, TrellisError::IoError(_)));
        assert_eq!(err.status_code(), 500);
    }
}
