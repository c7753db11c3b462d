//! # Path Patterns
//!
//! Compiles route patterns such as `/users/:id/files/*` into a segment
//! matcher.
//!
//! ## Syntax
//!
//! - `:name` binds exactly one non-empty path segment
//! - a final `*` binds the rest of the path (possibly empty)
//! - `\:name` is the literal segment `:name`
//! - everything else matches literally and case-sensitively

use crate::error::{Error, Result};

/// Sentinel that opens a named parameter segment
pub const PARAM_SENTINEL: char = ':';

/// Segment that captures the remainder of the path
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
    params: Vec<String>,
}

impl RoutePattern {
    /// Parse a pattern that starts with `/`
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPattern` if the pattern does not start with
    /// `/`, a parameter name is empty or repeated, or `*` is not the final
    /// segment.
    pub fn parse(pattern: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| malformed("pattern must start with '/'"))?;

        let mut segments = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if body.is_empty() {
            return Ok(Self { segments, params });
        }

        let raw_segments: Vec<&str> = body.split('/').collect();
        let last = raw_segments.len() - 1;

        for (i, raw) in raw_segments.into_iter().enumerate() {
            if raw == WILDCARD {
                if i != last {
                    return Err(malformed("wildcard must be the final segment"));
                }
                params.push(WILDCARD.to_string());
                segments.push(Segment::Wildcard);
            } else if let Some(name) = raw.strip_prefix(PARAM_SENTINEL) {
                if name.is_empty() {
                    return Err(malformed("empty parameter name"));
                }
                if params.iter().any(|p| p == name) {
                    return Err(malformed(&format!("duplicate parameter '{name}'")));
                }
                params.push(name.to_string());
                segments.push(Segment::Param(name.to_string()));
            } else if let Some(escaped) = raw.strip_prefix('\\') {
                segments.push(Segment::Literal(escaped.to_string()));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self { segments, params })
    }

    /// Parameter names in declaration order, `*` included
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Match a request path, capturing parameters
    ///
    /// Returns `None` when the path does not match.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut rest = path.strip_prefix('/')?;
        let mut captured = PathParams::default();

        if self.segments.is_empty() {
            return rest.is_empty().then_some(captured);
        }

        let mut exhausted = false;
        for segment in &self.segments {
            if *segment == Segment::Wildcard {
                captured.push(WILDCARD, rest);
                return Some(captured);
            }
            if exhausted {
                return None;
            }

            let head = match rest.split_once('/') {
                Some((head, tail)) => {
                    rest = tail;
                    head
                }
                None => {
                    exhausted = true;
                    std::mem::take(&mut rest)
                }
            };

            match segment {
                Segment::Literal(literal) if literal == head => {}
                Segment::Param(name) if !head.is_empty() => captured.push(name, head),
                _ => return None,
            }
        }

        exhausted.then_some(captured)
    }
}

/// Parameters captured by a successful match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    pub(crate) fn wildcard_only(path: &str) -> Self {
        let mut captured = Self::default();
        captured.push(WILDCARD, path.strip_prefix('/').unwrap_or(path));
        captured
    }

    fn push(&mut self, name: &str, value: &str) {
        self.values.push((name.to_string(), value.to_string()));
    }

    /// Value captured for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Remainder captured by a trailing `*`
    #[must_use]
    pub fn wildcard(&self) -> Option<&str> {
        self.get(WILDCARD)
    }

    /// Iterate `(name, value)` pairs in pattern order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of captured values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}
