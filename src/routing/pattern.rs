//! Path template compilation.
//!
//! # Responsibilities
//! - Split a route template on `/`, ignoring empty segments
//! - Classify segments: literal, `:name`, `:name?`, `*`
//! - Pick a matching strategy for the compiled pattern
//! - Extract ordered parameter bindings from a request path
//!
//! # Design Decisions
//! - Templates made of literals and `:name` only compile to a segment list
//!   (no regex on the hot path)
//! - Optional params and wildcards compile to one anchored regex
//! - Both strategies bind the same names in declaration order

use regex::Regex;
use thiserror::Error;

use crate::http::request::Params;

/// Name under which a `*` segment binds the rest of the path.
pub const WILDCARD: &str = "*";

/// Errors raised for structurally invalid templates.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `:` segment without a name.
    #[error("empty parameter name in route template '{0}'")]
    EmptyParam(String),

    /// The same parameter name declared twice.
    #[error("duplicate parameter '{name}' in route template '{template}'")]
    DuplicateParam { template: String, name: String },

    /// The generated expression was rejected by the regex engine.
    #[error("invalid route template '{template}': {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// Which algorithm a compiled pattern uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Equal segment counts, literal or single-segment captures.
    Segments,
    /// One anchored regex, required for optional params and wildcards.
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
    Optional(String),
    Wildcard,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param,
}

#[derive(Debug, Clone)]
enum Strategy {
    Segments(Vec<Segment>),
    Regex(Regex),
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    params: Vec<String>,
    strategy: Strategy,
}

impl PathPattern {
    /// Compile a template such as `/user/:id/:action`, `/test/:id?` or `/files/*`.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;

        let mut params: Vec<String> = Vec::new();
        for token in &tokens {
            let name = match token {
                Token::Param(name) | Token::Optional(name) => name.as_str(),
                Token::Wildcard => WILDCARD,
                Token::Literal(_) => continue,
            };
            if params.iter().any(|p| p == name) {
                return Err(PatternError::DuplicateParam {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            params.push(name.to_string());
        }

        let needs_regex = tokens
            .iter()
            .any(|t| matches!(t, Token::Optional(_) | Token::Wildcard));

        let strategy = if needs_regex {
            let regex = build_regex(&tokens).map_err(|source| PatternError::Regex {
                template: template.to_string(),
                source,
            })?;
            debug_assert_eq!(regex.captures_len() - 1, params.len());
            Strategy::Regex(regex)
        } else {
            Strategy::Segments(
                tokens
                    .into_iter()
                    .map(|t| match t {
                        Token::Literal(lit) => Segment::Literal(lit),
                        _ => Segment::Param,
                    })
                    .collect(),
            )
        };

        Ok(Self {
            template: template.to_string(),
            params,
            strategy,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared parameter names, in template order.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub fn kind(&self) -> PatternKind {
        match self.strategy {
            Strategy::Segments(_) => PatternKind::Segments,
            Strategy::Regex(_) => PatternKind::Regex,
        }
    }

    /// Match a normalized pathname, returning the bound parameters.
    ///
    /// `path` is expected to carry no query string; a trailing slash is
    /// ignored so `/test` and `/test/` behave the same.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let path = trim_trailing_slash(path);
        match &self.strategy {
            Strategy::Segments(segments) => self.match_segments(segments, path),
            Strategy::Regex(regex) => self.match_regex(regex, path),
        }
    }

    fn match_segments(&self, segments: &[Segment], path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != segments.len() {
            return None;
        }

        let mut names = self.params.iter();
        let mut params = Params::with_capacity(self.params.len());
        for (segment, part) in segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param if part.is_empty() => return None,
                Segment::Param => {
                    let name = names.next()?;
                    params.insert(name.clone(), part);
                }
            }
        }
        Some(params)
    }

    fn match_regex(&self, regex: &Regex, path: &str) -> Option<Params> {
        let captures = regex.captures(path)?;
        let mut params = Params::with_capacity(self.params.len());
        for (i, name) in self.params.iter().enumerate() {
            match captures.get(i + 1) {
                Some(value) => params.insert(name.clone(), value.as_str()),
                None if name == WILDCARD => params.insert(name.clone(), ""),
                None => {}
            }
        }
        Some(params)
    }
}

fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment == WILDCARD {
                return Ok(Token::Wildcard);
            }
            let Some(name) = segment.strip_prefix(':') else {
                return Ok(Token::Literal(segment.to_string()));
            };
            let (name, optional) = match name.strip_suffix('?') {
                Some(name) => (name, true),
                None => (name, false),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyParam(template.to_string()));
            }
            Ok(if optional {
                Token::Optional(name.to_string())
            } else {
                Token::Param(name.to_string())
            })
        })
        .collect()
}

fn build_regex(tokens: &[Token]) -> Result<Regex, regex::Error> {
    let mut source = String::from("^");
    for token in tokens {
        match token {
            Token::Literal(lit) => {
                source.push('/');
                source.push_str(&regex::escape(lit));
            }
            Token::Param(_) => source.push_str("/([^/]+)"),
            Token::Optional(_) => source.push_str("(?:/([^/]+))?"),
            Token::Wildcard => source.push_str("(?:/(.*))?"),
        }
    }
    source.push_str("/?$");
    Regex::new(&source)
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(template: &str, path: &str) -> Option<Vec<(String, String)>> {
        PathPattern::compile(template)
            .unwrap()
            .matches(path)
            .map(|p| p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_literal_and_params() {
        let pattern = PathPattern::compile("/user/:id/:action").unwrap();
        assert_eq!(pattern.kind(), PatternKind::Segments);
        assert_eq!(pattern.param_names(), ["id", "action"]);

        let params = pattern.matches("/user/123/profile").unwrap();
        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("action"), Some("profile"));

        assert!(pattern.matches("/user/123").is_none());
        assert!(pattern.matches("/users/123/profile").is_none());
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert!(bind("/test", "/test").is_some());
        assert!(bind("/test", "/test/").is_some());
        assert!(bind("/test/", "/test").is_some());
        assert!(bind("/", "/").is_some());
        assert!(bind("/", "/other").is_none());
    }

    #[test]
    fn test_optional_param() {
        let pattern = PathPattern::compile("/test/:id?").unwrap();
        assert_eq!(pattern.kind(), PatternKind::Regex);

        let without = pattern.matches("/test").unwrap();
        assert!(without.is_empty());
        assert_eq!(without.get("id"), None);

        let with = pattern.matches("/test/123").unwrap();
        assert_eq!(with.get("id"), Some("123"));

        assert!(pattern.matches("/test/123/456").is_none());
    }

    #[test]
    fn test_wildcard_binds_remainder() {
        assert_eq!(
            bind("/files/*", "/files"),
            Some(vec![("*".into(), "".into())])
        );
        assert_eq!(
            bind("/files/*", "/files/a"),
            Some(vec![("*".into(), "a".into())])
        );
        assert_eq!(
            bind("/files/*", "/files/a/b"),
            Some(vec![("*".into(), "a/b".into())])
        );
        assert!(bind("/files/*", "/filesystem").is_none());
    }

    #[test]
    fn test_param_before_wildcard_keeps_positions() {
        let params = bind("/repo/:owner/*", "/repo/alice/src/lib.rs").unwrap();
        assert_eq!(
            params,
            vec![
                ("owner".to_string(), "alice".to_string()),
                ("*".to_string(), "src/lib.rs".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_segments_match_the_same_in_both_strategies() {
        for path in ["/user//123", "//user/123"] {
            assert!(bind("/user/:id", path).is_none(), "{path}");
            assert!(bind("/user/:id?", path).is_none(), "{path}");
        }
        assert!(bind("/a/:x/b", "/a//b").is_none());

        assert!(bind("/user/:id", "/user/123//").is_some());
        assert!(bind("/user/:id?", "/user/123//").is_some());
    }

    #[test]
    fn test_literals_are_escaped() {
        assert!(bind("/v1.0/:id?", "/v1.0/7").is_some());
        assert!(bind("/v1.0/:id?", "/v1x0/7").is_none());
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            PathPattern::compile("/a/:"),
            Err(PatternError::EmptyParam(_))
        ));
        assert!(matches!(
            PathPattern::compile("/a/:id/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }
}
