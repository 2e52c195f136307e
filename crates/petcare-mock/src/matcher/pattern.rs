//! Route patterns and the pure matching functions behind each tier.

use crate::error::RegistryError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Marker for a single anonymous path segment in a template pattern.
pub const WILDCARD: &str = "*";

/// Compiled form of a route pattern.
#[derive(Debug, Clone)]
pub enum PatternKind {
    /// Plain path such as `/api/boards`.
    Literal,
    /// Path ending with `/`; the rest of the request path is handed to the handler.
    DynamicSuffix,
    /// Path with `{name}` or `*` segments.
    Template { regex: Arc<Regex>, names: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    kind: PatternKind,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        if !raw.starts_with('/') {
            return Err(invalid(raw, "pattern must start with '/'"));
        }
        if raw.contains('?') {
            return Err(invalid(raw, "pattern must not contain a query string"));
        }

        let kind = if is_template(raw) {
            let (regex, names) = compile_template(raw)?;
            PatternKind::Template {
                regex: Arc::new(regex),
                names,
            }
        } else if raw.len() > 1 && raw.ends_with('/') {
            PatternKind::DynamicSuffix
        } else {
            PatternKind::Literal
        };

        Ok(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, PatternKind::Template { .. })
    }
}

fn invalid(pattern: &str, reason: &str) -> RegistryError {
    RegistryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

fn is_template(raw: &str) -> bool {
    raw.contains(WILDCARD) || raw.contains('{') || raw.contains('}')
}

fn compile_template(raw: &str) -> Result<(Regex, Vec<String>), RegistryError> {
    let mut names = Vec::new();
    let mut parts = Vec::new();

    for segment in raw.split('/') {
        if segment == WILDCARD {
            parts.push("[^/]+".to_string());
        } else if let Some(name) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            let valid = !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(invalid(raw, "capture names must be identifiers"));
            }
            if names.iter().any(|n| n == name) {
                return Err(invalid(raw, "capture names must be unique"));
            }
            parts.push(format!("(?P<{name}>[^/]+)"));
            names.push(name.to_string());
        } else if is_template(segment) {
            return Err(invalid(
                raw,
                "'*' and '{name}' must occupy a whole path segment",
            ));
        } else {
            parts.push(regex::escape(segment));
        }
    }

    let regex = Regex::new(&format!("^{}$", parts.join("/")))
        .map_err(|e| invalid(raw, &e.to_string()))?;
    Ok((regex, names))
}

/// Pattern and path are equal, ignoring one trailing `/` on either side.
pub fn match_exact(pattern: &str, path: &str) -> bool {
    trim_trailing_slash(pattern) == trim_trailing_slash(path)
}

/// Named captures when `path` fits a template pattern.
pub fn match_template(
    regex: &Regex,
    names: &[String],
    path: &str,
) -> Option<BTreeMap<String, String>> {
    let caps = regex.captures(path)?;
    Some(
        names
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect(),
    )
}

/// Remainder of `path` after a pattern ending in `/`, without leading slashes.
///
/// The pattern minus its trailing separator only has to be a prefix of the
/// path, so `/api/boards/` accepts `/api/boards`, `/api/boards/42` and
/// `/api/boards/42/comments`.
pub fn match_dynamic_suffix<'a>(pattern: &str, path: &'a str) -> Option<&'a str> {
    if !pattern.ends_with('/') {
        return None;
    }
    let base = pattern.trim_end_matches('/');
    path.strip_prefix(base)
        .map(|rest| rest.trim_start_matches('/'))
}

/// Path contains the pattern. Patterns carrying the wildcard marker never
/// take part.
pub fn match_substring(pattern: &str, path: &str) -> bool {
    !pattern.contains(WILDCARD) && path.contains(pattern)
}

fn trim_trailing_slash(s: &str) -> &str {
    if s.len() > 1 {
        s.strip_suffix('/').unwrap_or(s)
    } else {
        s
    }
}
