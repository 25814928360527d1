//! Route pattern parsing, matching, and assembly.
//!
//! A pattern is a path template built from:
//!
//! - literal text, matched and emitted verbatim;
//! - `:name`, a required parameter matching one or more non-`/` characters
//!   (a letter followed by letters, digits, or underscores);
//! - `[...]`, an optional segment that may nest further segments and
//!   parameters;
//! - `*` as the whole pattern, a wildcard accepting any path.
//!
//! [`RoutePattern`] parses the source once into a small tree of [`Segment`]s.
//! Matching compiles that tree to an anchored regex; assembly walks the same
//! tree to substitute parameter values.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use trellis_core::{TrellisError, TrellisResult};

use super::reverse::ParamSource;

/// One node of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text.
    Literal(String),
    /// A `:name` parameter.
    Parameter(String),
    /// A bracketed `[...]` group, included only when all of its own
    /// parameters are available.
    Optional(Vec<Segment>),
}

/// A parameter declared by a pattern, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParameter {
    /// The parameter name, without the leading `:`.
    pub name: String,
    /// `true` if at least one occurrence sits outside every optional segment.
    pub required: bool,
}

#[derive(Debug)]
enum Matcher {
    Wildcard,
    Compiled {
        regex: Regex,
        /// Parameter name for each capture group, by group index minus one.
        groups: Vec<String>,
    },
}

/// A compiled route pattern.
///
/// # Examples
///
/// ```
/// use trellis_http::urls::pattern::RoutePattern;
///
/// let pattern = RoutePattern::parse("/users[/:id]").unwrap();
/// assert!(pattern.full_match("/users").unwrap().is_empty());
/// assert_eq!(pattern.full_match("/users/7").unwrap()["id"], "7");
/// assert!(pattern.full_match("/users/7/edit").is_none());
/// ```
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    matcher: Matcher,
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regex = match &self.matcher {
            Matcher::Wildcard => "*",
            Matcher::Compiled { regex, .. } => regex.as_str(),
        };
        f.debug_struct("RoutePattern")
            .field("source", &self.source)
            .field("regex", &regex)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for RoutePattern {
    type Err = TrellisError;

    fn from_str(source: &str) -> TrellisResult<Self> {
        Self::parse(source)
    }
}

impl RoutePattern {
    /// Parses and compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::MalformedPattern`] for an unmatched `]` or an
    /// unclosed `[`.
    pub fn parse(source: &str) -> TrellisResult<Self> {
        if source == "*" {
            return Ok(Self {
                source: source.to_string(),
                segments: Vec::new(),
                matcher: Matcher::Wildcard,
            });
        }

        let segments = parse_segments(source)?;

        let mut regex_str = String::from("^");
        let mut groups = Vec::new();
        compile_segments(&segments, &mut regex_str, &mut groups);
        regex_str.push('$');

        let regex = Regex::new(&regex_str).map_err(|e| TrellisError::MalformedPattern {
            pattern: source.to_string(),
            reason: format!("invalid regex: {e}"),
        })?;

        Ok(Self {
            source: source.to_string(),
            segments,
            matcher: Matcher::Compiled { regex, groups },
        })
    }

    /// Returns the original pattern string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed segments. Empty for the wildcard.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if this is the `*` wildcard.
    pub const fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Wildcard)
    }

    /// Returns the regex the pattern compiled to, or `None` for the wildcard.
    pub const fn regex(&self) -> Option<&Regex> {
        match &self.matcher {
            Matcher::Wildcard => None,
            Matcher::Compiled { regex, .. } => Some(regex),
        }
    }

    /// Lists the pattern's parameters in order of first appearance.
    pub fn parameters(&self) -> Vec<PatternParameter> {
        let mut params: Vec<PatternParameter> = Vec::new();
        collect_parameters(&self.segments, false, &mut params);
        params
    }

    /// Matches the whole of `path` against the pattern.
    ///
    /// Returns the captured parameters on success. Parameters inside optional
    /// segments that did not participate are absent from the map. A parameter
    /// that appears more than once must capture the same text everywhere.
    pub fn full_match(&self, path: &str) -> Option<HashMap<String, String>> {
        let Matcher::Compiled { regex, groups } = &self.matcher else {
            return Some(HashMap::new());
        };

        let captures = regex.captures(path)?;
        let mut kwargs = HashMap::new();

        for (index, name) in groups.iter().enumerate() {
            let Some(m) = captures.get(index + 1) else {
                continue;
            };
            match kwargs.entry(name.clone()) {
                Entry::Occupied(existing) => {
                    if existing.get() != m.as_str() {
                        return None;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(m.as_str().to_string());
                }
            }
        }

        Some(kwargs)
    }

    /// Builds a concrete path from parameter values.
    ///
    /// Optional segments are resolved innermost first; a segment is dropped
    /// entirely when any parameter directly inside it is missing. Parameters
    /// outside every optional segment are required. `route` only names the
    /// route in the error.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::MissingRequiredParameter`] when a required
    /// parameter has no value.
    pub fn assemble<P: ParamSource + ?Sized>(&self, route: &str, params: &P) -> TrellisResult<String> {
        if self.is_wildcard() {
            return Ok(self.source.clone());
        }

        let mut url = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Parameter(name) => {
                    let value = params.param(name).ok_or_else(|| {
                        TrellisError::MissingRequiredParameter {
                            parameter: name.clone(),
                            route: route.to_string(),
                        }
                    })?;
                    url.push_str(&value);
                }
                Segment::Optional(children) => {
                    if let Some(text) = assemble_optional(children, params) {
                        url.push_str(&text);
                    }
                }
            }
        }
        Ok(url)
    }
}

/// Returns `None` when the bracket must be dropped.
fn assemble_optional<P: ParamSource + ?Sized>(segments: &[Segment], params: &P) -> Option<String> {
    let mut text = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(literal) => text.push_str(literal),
            Segment::Parameter(name) => text.push_str(&params.param(name)?),
            Segment::Optional(children) => {
                if let Some(inner) = assemble_optional(children, params) {
                    text.push_str(&inner);
                }
            }
        }
    }
    Some(text)
}

fn collect_parameters(segments: &[Segment], optional: bool, out: &mut Vec<PatternParameter>) {
    for segment in segments {
        match segment {
            Segment::Literal(_) => {}
            Segment::Parameter(name) => {
                if let Some(existing) = out.iter_mut().find(|p| &p.name == name) {
                    existing.required |= !optional;
                } else {
                    out.push(PatternParameter {
                        name: name.clone(),
                        required: !optional,
                    });
                }
            }
            Segment::Optional(children) => collect_parameters(children, true, out),
        }
    }
}

fn compile_segments(segments: &[Segment], regex_str: &mut String, groups: &mut Vec<String>) {
    for segment in segments {
        match segment {
            Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
            Segment::Parameter(name) => {
                regex_str.push_str("([^/]+)");
                groups.push(name.clone());
            }
            Segment::Optional(children) => {
                regex_str.push_str("(?:");
                compile_segments(children, regex_str, groups);
                regex_str.push_str(")?");
            }
        }
    }
}

fn flush_literal(stack: &mut [Vec<Segment>], literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn malformed(source: &str, reason: String) -> TrellisError {
    TrellisError::MalformedPattern {
        pattern: source.to_string(),
        reason,
    }
}

/// Parses a pattern into segments. A `:` not followed by a letter is literal.
fn parse_segments(source: &str) -> TrellisResult<Vec<Segment>> {
    let mut stack: Vec<Vec<Segment>> = vec![Vec::new()];
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '[' => {
                flush_literal(&mut stack, &mut literal);
                stack.push(Vec::new());
            }
            ']' => {
                flush_literal(&mut stack, &mut literal);
                if stack.len() == 1 {
                    return Err(malformed(source, format!("unmatched ']' at byte {pos}")));
                }
                let children = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.push(Segment::Optional(children));
                }
            }
            ':' if chars.peek().is_some_and(|(_, next)| next.is_ascii_alphabetic()) => {
                flush_literal(&mut stack, &mut literal);
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Some(top) = stack.last_mut() {
                    top.push(Segment::Parameter(name));
                }
            }
            _ => literal.push(c),
        }
    }

    flush_literal(&mut stack, &mut literal);
    if stack.len() > 1 {
        return Err(malformed(
            source,
            format!("{} unclosed '['", stack.len() - 1),
        ));
    }
    Ok(stack.pop().unwrap_or_default())
}
