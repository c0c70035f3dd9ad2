//! # Pathway Router
//!
//! A zero-dependency path library for convention-based (file-routed) sites:
//! - File path → route pathname (`users/:id/index.ts` → `/users/:id/index`)
//! - Specificity scoring (`count_params`) and ordering (`compare_specificity`)
//! - Compiled pathname patterns with `:name` captures and a trailing `*`
//!
//! ## Pathname Conventions
//!
//! - A segment written `:name` captures exactly one path segment
//! - A segment written `*` captures everything that remains (possibly nothing)
//! - Every other segment matches literally and case-sensitively
//!
//! ## Specificity
//!
//! Fewer parameters sorts first, and on equal scores a pathname with a `*`
//! segment goes after one without (`compare_precedence`). This is only the
//! key of a stable sort; two routes with the same method and pathname are
//! a conflict for the caller to report, never something the ordering
//! resolves.
//!
//! ## Example
//!
//! ```
//! use pathway_router::{parse_path, count_params, PathPattern};
//!
//! let pathname = parse_path("users/:id.ts", &[".ts"]);
//! assert_eq!(pathname, "/users/:id");
//! assert_eq!(count_params(&pathname), 1);
//!
//! let pattern = PathPattern::parse(&pathname);
//! let params = pattern.matches("/users/42").unwrap();
//! assert_eq!(params.get("id"), Some(&"42".to_string()));
//! ```

pub mod matcher;
pub mod path;
pub mod route;

pub use matcher::{Params, PathPattern};
pub use path::{is_valid_path, normalize_path, parse_path, strip_extension};
pub use route::parser::{compare_precedence, compare_specificity, count_params, has_wildcard};
pub use route::pattern::{classify_segment, PatternSegment, WILDCARD};
