//! Variable lookup, display, and filters.
//!
//! View data is a JSON object. An expression such as `user.name|upper`
//! is a dotted path into that object followed by zero or more filters.

use serde_json::{Map, Value};
use trellis_core::{TrellisError, TrellisResult};

/// A parsed `{{ ... }}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Dotted lookup path, e.g. `user.name`.
    pub path: String,
    /// Filters in application order.
    pub filters: Vec<Filter>,
}

/// A filter with its optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub argument: Option<String>,
}

/// The output of one expression: its text and whether it is already safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub safe: bool,
}

impl Expression {
    /// Parses `path|filter|filter:"arg"`.
    ///
    /// # Errors
    ///
    /// Returns a `TemplateSyntaxError` for an empty path or filter name.
    pub fn parse(source: &str) -> TrellisResult<Self> {
        let mut parts = split_filters(source).into_iter();
        let path = parts.next().unwrap_or_default().trim().to_string();
        if path.is_empty() {
            return Err(TrellisError::TemplateSyntaxError(format!(
                "Empty variable expression: '{{{{ {source} }}}}'"
            )));
        }

        let filters = parts
            .map(|part| {
                let (name, argument) = match part.split_once(':') {
                    Some((name, arg)) => (name.trim(), Some(unquote(arg.trim()))),
                    None => (part.trim(), None),
                };
                if name.is_empty() {
                    return Err(TrellisError::TemplateSyntaxError(format!(
                        "Empty filter name in '{source}'"
                    )));
                }
                Ok(Filter {
                    name: name.to_string(),
                    argument,
                })
            })
            .collect::<TrellisResult<Vec<_>>>()?;

        Ok(Self { path, filters })
    }

    /// Evaluates the expression against `data`.
    ///
    /// Keys listed in `safe_keys` start out safe (the layout's `content`).
    ///
    /// # Errors
    ///
    /// Returns a `TemplateSyntaxError` for an unknown filter.
    pub fn evaluate(&self, data: &Map<String, Value>, safe_keys: &[&str]) -> TrellisResult<Rendered> {
        let value = lookup(data, &self.path);
        let mut rendered = Rendered {
            text: value.map(display).unwrap_or_default(),
            safe: safe_keys.contains(&self.path.as_str()),
        };
        let missing = value.map_or(true, Value::is_null);

        for filter in &self.filters {
            rendered = apply_filter(rendered, filter, missing)?;
        }
        Ok(rendered)
    }
}

/// Looks up a dotted path. Object members by key, array items by index.
pub fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Converts a value to its display text. `null` displays as nothing and
/// strings display unquoted.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn apply_filter(rendered: Rendered, filter: &Filter, missing: bool) -> TrellisResult<Rendered> {
    let Rendered { text, safe } = rendered;
    Ok(match filter.name.as_str() {
        "safe" => Rendered { text, safe: true },
        "escape" => Rendered {
            text: if safe { text } else { escape_html(&text) },
            safe: true,
        },
        "upper" => Rendered {
            text: text.to_uppercase(),
            safe,
        },
        "lower" => Rendered {
            text: text.to_lowercase(),
            safe,
        },
        "default" => {
            if missing || text.is_empty() {
                Rendered {
                    text: filter.argument.clone().unwrap_or_default(),
                    safe: false,
                }
            } else {
                Rendered { text, safe }
            }
        }
        other => {
            return Err(TrellisError::TemplateSyntaxError(format!(
                "Unknown filter '{other}'"
            )))
        }
    })
}

// Splits on `|` outside double quotes.
fn split_filters(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '|' if !in_quotes => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn unquote(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_lookup_dotted() {
        let d = data(json!({"user": {"name": "ada", "tags": ["x", "y"]}}));
        assert_eq!(lookup(&d, "user.name"), Some(&json!("ada")));
        assert_eq!(lookup(&d, "user.tags.1"), Some(&json!("y")));
        assert_eq!(lookup(&d, "user.missing"), None);
        assert_eq!(lookup(&d, "user.name.deeper"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(display(&Value::Null), "");
        assert_eq!(display(&json!("s")), "s");
        assert_eq!(display(&json!(7)), "7");
        assert_eq!(display(&json!(true)), "true");
        assert_eq!(display(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_parse_expression() {
        let expr = Expression::parse(r#"title|default:"a|b"|upper"#).unwrap();
        assert_eq!(expr.path, "title");
        assert_eq!(expr.filters.len(), 2);
        assert_eq!(expr.filters[0].argument.as_deref(), Some("a|b"));
        assert_eq!(expr.filters[1].name, "upper");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expression::parse("").is_err());
        assert!(Expression::parse("x||upper").is_err());
    }

    #[test]
    fn test_evaluate_filters() {
        let d = data(json!({"name": "Ada", "empty": ""}));
        let upper = Expression::parse("name|upper").unwrap().evaluate(&d, &[]).unwrap();
        assert_eq!(upper.text, "ADA");
        assert!(!upper.safe);

        let fallback = Expression::parse(r#"nope|default:"anon""#)
            .unwrap()
            .evaluate(&d, &[])
            .unwrap();
        assert_eq!(fallback.text, "anon");

        let empty = Expression::parse(r#"empty|default:"x""#)
            .unwrap()
            .evaluate(&d, &[])
            .unwrap();
        assert_eq!(empty.text, "x");
    }

    #[test]
    fn test_evaluate_safe_keys() {
        let d = data(json!({"content": "<p>"}));
        let rendered = Expression::parse("content").unwrap().evaluate(&d, &["content"]).unwrap();
        assert!(rendered.safe);
    }

    #[test]
    fn test_unknown_filter() {
        let d = Map::new();
        let err = Expression::parse("x|shout").unwrap().evaluate(&d, &[]).unwrap_err();
        assert!(matches!(err, TrellisError::TemplateSyntaxError(_)));
    }
}
