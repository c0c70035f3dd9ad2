//! Compiled pathname patterns
//!
//! A `PathPattern` is parsed once when a route is built and matched against
//! every request path afterwards. Matching walks pattern and path segments
//! side by side, the same way for every route, so it never allocates for
//! routes that fail on their first static segment.

use std::collections::HashMap;
use std::fmt;

use crate::path::normalize_path;
use crate::route::parser::count_params;
use crate::route::pattern::{classify_segment, PatternSegment, WILDCARD};

/// Captured values keyed by parameter name; a wildcard is stored under `*`
pub type Params = HashMap<String, String>;

/// A pathname compiled into typed segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pathname: String,
    segments: Vec<PatternSegment>,
    score: usize,
}

impl PathPattern {
    /// Compiles a pathname such as `/users/:id` or `/assets/*`
    ///
    /// The pathname is normalized first, so `users/:id/` and `/users/:id`
    /// compile to the same pattern.
    pub fn parse(pathname: &str) -> Self {
        let pathname = normalize_path(pathname).into_owned();
        let segments = pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(classify_segment)
            .collect();
        let score = count_params(&pathname);

        Self {
            pathname,
            segments,
            score,
        }
    }

    /// The normalized pathname this pattern was compiled from
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Specificity score (see [`count_params`])
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Whether the pattern contains no captures at all
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| !s.is_dynamic())
    }

    /// Whether any segment is a `*` wildcard
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::Wildcard)
    }

    /// Matches this pattern against a request path (case-sensitive)
    ///
    /// A trailing `*` takes every remaining segment, including none, joined
    /// with `/`. A `*` anywhere else stands for exactly one segment.
    ///
    /// ```
    /// use pathway_router::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/docs/*");
    /// let params = pattern.matches("/docs/guide/intro").unwrap();
    /// assert_eq!(params.get("*"), Some(&"guide/intro".to_string()));
    /// assert!(pattern.matches("/blog").is_none());
    /// ```
    pub fn matches(&self, path: &str) -> Option<Params> {
        let path = normalize_path(path);
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = self.segments.len().checked_sub(1);
        let mut params = Params::new();

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PatternSegment::Wildcard if Some(idx) == last => {
                    let rest = path_segments.get(idx..).unwrap_or_default().join("/");
                    params.insert(WILDCARD.to_string(), rest);
                    return Some(params);
                }
                PatternSegment::Wildcard => {
                    let value = path_segments.get(idx)?;
                    params.insert(WILDCARD.to_string(), (*value).to_string());
                }
                PatternSegment::Param(name) => {
                    let value = path_segments.get(idx)?;
                    params.insert(name.clone(), (*value).to_string());
                }
                PatternSegment::Static(expected) => {
                    if path_segments.get(idx) != Some(&expected.as_str()) {
                        return None;
                    }
                }
            }
        }

        (path_segments.len() == self.segments.len()).then_some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pathname)
    }
}
