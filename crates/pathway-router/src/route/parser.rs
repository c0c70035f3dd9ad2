/// Specificity scoring and ordering for route pathnames
///
/// Lower score = more specific = evaluated first.

use std::cmp::Ordering;

use super::pattern::{classify_segment, PatternSegment};

/// Counts `:name` segments plus every literal `*` in the pathname
///
/// Used purely as a specificity score.
///
/// ```
/// use pathway_router::count_params;
///
/// assert_eq!(count_params("/a/:b/*"), 2);
/// assert_eq!(count_params("/a/b"), 0);
/// ```
pub fn count_params(pathname: &str) -> usize {
    let named = pathname
        .split('/')
        .filter(|segment| matches!(classify_segment(segment), PatternSegment::Param(_)))
        .count();

    named + pathname.matches('*').count()
}

/// Orders two pathnames by specificity: fewer parameters sorts first
///
/// Meant as the key of a *stable* sort, so insertion order stays the
/// secondary key. Equal scores are not a statement about conflicts.
///
/// ```
/// use pathway_router::compare_specificity;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_specificity("/users", "/users/:id"), Ordering::Less);
/// assert_eq!(compare_specificity("/*", "/users/:id"), Ordering::Equal);
/// ```
pub fn compare_specificity(a: &str, b: &str) -> Ordering {
    count_params(a).cmp(&count_params(b))
}

/// Whether any segment of the pathname is exactly `*`
pub fn has_wildcard(pathname: &str) -> bool {
    pathname
        .split('/')
        .any(|segment| classify_segment(segment) == PatternSegment::Wildcard)
}

/// Evaluation order of two pathnames
///
/// Specificity first; on equal scores a pathname without a wildcard
/// segment goes before one with, so `/users/:id` is tried before `/*`.
/// Anything still equal is left to the stability of the sort.
///
/// ```
/// use pathway_router::compare_precedence;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_precedence("/users/:id", "/*"), Ordering::Less);
/// assert_eq!(compare_precedence("/*", "/users/:id"), Ordering::Greater);
/// assert_eq!(compare_precedence("/:a", "/:b"), Ordering::Equal);
/// ```
pub fn compare_precedence(a: &str, b: &str) -> Ordering {
    compare_specificity(a, b).then_with(|| has_wildcard(a).cmp(&has_wildcard(b)))
}
