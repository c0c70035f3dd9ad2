/// Path utilities for validation, normalization and file-path conversion
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use pathway_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/about"));
/// assert!(is_valid_path("/users/:id"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about")); // Missing leading /
/// assert!(!is_valid_path("/about/")); // Trailing /
/// assert!(!is_valid_path("/about//page")); // Double //
/// assert!(!is_valid_path("/about\\page")); // Backslash
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    if path == "/" {
        return true;
    }

    !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations),
/// `Cow::Owned` when normalization was needed.
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
/// - Missing leading slash: `path` → `/path`
///
/// # Examples
///
/// ```
/// use pathway_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// let path = normalize_path("/about");
/// assert!(matches!(path, Cow::Borrowed("/about")));
///
/// assert_eq!(normalize_path("/about/"), "/about");
/// assert_eq!(normalize_path("\\users\\123"), "/users/123");
/// assert_eq!(normalize_path("docs//intro"), "/docs/intro");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Strips the first extension in `known_extensions` that suffixes `path`
///
/// Order of the list decides, not the length of the extension: with
/// `[".ts", ".d.ts"]` the file `types.d.ts` becomes `types.d`.
/// A file whose whole name is the extension is left alone.
///
/// ```
/// use pathway_router::path::strip_extension;
///
/// assert_eq!(strip_extension("about.tsx", &[".ts", ".tsx"]), "about");
/// assert_eq!(strip_extension("styles.css", &[".ts"]), "styles.css");
/// ```
pub fn strip_extension<'a, S: AsRef<str>>(path: &'a str, known_extensions: &[S]) -> &'a str {
    known_extensions
        .iter()
        .map(|ext| ext.as_ref())
        .filter(|ext| !ext.is_empty())
        .find_map(|ext| {
            path.strip_suffix(ext)
                .filter(|rest| !rest.is_empty() && !rest.ends_with('/'))
        })
        .unwrap_or(path)
}

/// Converts a file path relative to the site root into a route pathname
///
/// Strips the first matching extension and guarantees a single leading `/`.
/// Directory segments written `:name` and a file named `*` pass through
/// untouched so they become captures in the compiled pattern.
///
/// ```
/// use pathway_router::parse_path;
///
/// assert_eq!(parse_path("about.ts", &[".ts"]), "/about");
/// assert_eq!(parse_path("users/:id/posts.ts", &[".ts"]), "/users/:id/posts");
/// assert_eq!(parse_path("docs/*.ts", &[".ts"]), "/docs/*");
/// assert_eq!(parse_path("styles.css", &[".ts"]), "/styles.css");
/// assert_eq!(parse_path("assets\\logo.svg", &[] as &[&str]), "/assets/logo.svg");
/// ```
pub fn parse_path<S: AsRef<str>>(relative_path: &str, known_extensions: &[S]) -> String {
    let unified = relative_path.replace('\\', "/");
    let stripped = strip_extension(&unified, known_extensions);
    normalize_path(stripped).into_owned()
}
