//! Template lexer (tokenizer).
//!
//! Converts raw template source text into [`Token`]s: text literals, variable
//! references (`{{ }}`), and comments (`{# #}`). Anything else, including
//! `{%`, is plain text.

use trellis_core::TrellisError;

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A literal text segment.
    Text(String),
    /// A variable expression: `{{ expression }}`, trimmed.
    Variable(String),
    /// A comment: `{# comment text #}`.
    Comment(String),
}

#[derive(Debug, Clone, Copy)]
enum TagType {
    Variable, // {{
    Comment,  // {#
}

/// Tokenizes a template source string.
///
/// # Errors
///
/// Returns a `TemplateSyntaxError` if a variable or comment is opened but
/// never closed.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TrellisError> {
    let mut tokens = Vec::new();
    let mut remaining = source;

    while !remaining.is_empty() {
        let Some((pos, tag_type)) = find_next_open(remaining) else {
            tokens.push(Token::Text(remaining.to_string()));
            break;
        };

        if pos > 0 {
            tokens.push(Token::Text(remaining[..pos].to_string()));
        }

        let after_open = &remaining[pos + 2..];
        let (closer, what) = match tag_type {
            TagType::Variable => ("}}", "variable"),
            TagType::Comment => ("#}", "comment"),
        };

        let Some(end) = after_open.find(closer) else {
            return Err(TrellisError::TemplateSyntaxError(format!(
                "Unclosed {what} tag: expected '{closer}'"
            )));
        };

        let content = after_open[..end].trim().to_string();
        tokens.push(match tag_type {
            TagType::Variable => Token::Variable(content),
            TagType::Comment => Token::Comment(content),
        });
        remaining = &after_open[end + 2..];
    }

    Ok(tokens)
}

fn find_next_open(s: &str) -> Option<(usize, TagType)> {
    let variable = s.find("{{").map(|pos| (pos, TagType::Variable));
    let comment = s.find("{#").map(|pos| (pos, TagType::Comment));

    match (variable, comment) {
        (Some(v), Some(c)) => Some(if c.0 < v.0 { c } else { v }),
        (v, c) => v.or(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("Hello world").unwrap();
        assert_eq!(tokens, vec![Token::Text("Hello world".to_string())]);
    }

    #[test]
    fn test_variable_tag() {
        let tokens = tokenize("Hi {{ name }}!").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("Hi ".to_string()),
                Token::Variable("name".to_string()),
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_variable_with_filter() {
        let tokens = tokenize("{{ body|safe }}").unwrap();
        assert_eq!(tokens, vec![Token::Variable("body|safe".to_string())]);
    }

    #[test]
    fn test_comment() {
        let tokens = tokenize("a{# note #}b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".to_string()),
                Token::Comment("note".to_string()),
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_block_syntax_is_text() {
        let tokens = tokenize("{% if x %}").unwrap();
        assert_eq!(tokens, vec![Token::Text("{% if x %}".to_string())]);
    }

    #[test]
    fn test_unclosed_variable() {
        let err = tokenize("Hello {{ name").unwrap_err();
        assert!(matches!(err, TrellisError::TemplateSyntaxError(_)));
    }

    #[test]
    fn test_unclosed_comment() {
        assert!(tokenize("{# forever").is_err());
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
