/// Segment classification for route pathnames
///
/// Pure functional parsing of pathname segments into typed segments.

/// Literal segment that captures the remainder of a path
pub const WILDCARD: &str = "*";

/// Represents the different kinds of pathname segments
///
/// # Examples
///
/// ```
/// use pathway_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert_eq!(classify_segment("about"), PatternSegment::Static("about".to_string()));
/// assert_eq!(classify_segment(":id"), PatternSegment::Param("id".to_string()));
/// assert_eq!(classify_segment("*"), PatternSegment::Wildcard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Wildcard segment: `*`
    Wildcard,
    /// Named capture: `:id`
    Param(String),
    /// Static text segment
    Static(String),
}

impl PatternSegment {
    /// Whether the segment captures anything
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, PatternSegment::Static(_))
    }
}

/// Classifies a segment into a pattern type (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Wildcard**: exactly `*`
/// 2. **Param**: `:` followed by a non-empty name
/// 3. **Static**: any other text (a lone `:` included)
pub fn classify_segment(segment: &str) -> PatternSegment {
    if segment == WILDCARD {
        return PatternSegment::Wildcard;
    }

    match segment.strip_prefix(':') {
        Some(name) if !name.is_empty() => PatternSegment::Param(name.to_string()),
        _ => PatternSegment::Static(segment.to_string()),
    }
}
