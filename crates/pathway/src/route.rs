//! Route table types
//!
//! A build produces [`TaggedRoute`]s into a [`SiteRouteSet`]; assembly
//! flattens the set into the ordered table the dispatcher consumes.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use pathway_router::{compare_precedence, PathPattern};

use crate::client::shell::ShellRenderer;
use crate::handler::Handler;

/// Method, pathname, compiled matcher and handler of one route
#[derive(Clone)]
pub struct RouteDefinition {
    pub method: Method,

    /// Always starts with `/`; `:name` captures, trailing `*` wildcard
    pub pathname: String,

    pub pattern: PathPattern,
    pub handler: Handler,
}

impl RouteDefinition {
    pub fn new(method: Method, pathname: &str, handler: Handler) -> Self {
        let pattern = PathPattern::parse(pathname);
        Self {
            method,
            pathname: pattern.pathname().to_string(),
            pattern,
            handler,
        }
    }

    /// Specificity score; lower is more specific
    pub fn specificity(&self) -> usize {
        self.pattern.score()
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("method", &self.method)
            .field("pathname", &self.pathname)
            .finish_non_exhaustive()
    }
}

/// Bucket a route was discovered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Server,
    Static,
    Client,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteKind::Server => "server",
            RouteKind::Static => "static",
            RouteKind::Client => "client",
        })
    }
}

/// Route plus where it came from; never mutated after classification
#[derive(Debug, Clone)]
pub struct TaggedRoute {
    pub route: RouteDefinition,
    pub kind: RouteKind,
    pub source_path: PathBuf,

    /// Export (or generated artifact) that contributed the route
    pub component: Option<String>,
}

impl TaggedRoute {
    pub fn new(route: RouteDefinition, kind: RouteKind, source_path: impl Into<PathBuf>) -> Self {
        Self {
            route,
            kind,
            source_path: source_path.into(),
            component: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.route.method
    }

    pub fn pathname(&self) -> &str {
        &self.route.pathname
    }
}

/// Server, static and client routes in discovery order
///
/// `merge` concatenates bucket by bucket, so it is associative and keeps
/// order; `Default` is its identity. Sorting waits for assembly.
#[derive(Debug, Clone, Default)]
pub struct SiteRouteSet {
    pub server: Vec<TaggedRoute>,
    pub static_routes: Vec<TaggedRoute>,
    pub client: Vec<TaggedRoute>,
}

impl SiteRouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding a single route in the bucket matching its kind
    pub fn single(route: TaggedRoute) -> Self {
        let mut set = Self::new();
        set.push(route);
        set
    }

    pub fn push(&mut self, route: TaggedRoute) {
        match route.kind {
            RouteKind::Server => self.server.push(route),
            RouteKind::Static => self.static_routes.push(route),
            RouteKind::Client => self.client.push(route),
        }
    }

    pub fn merge(mut self, other: SiteRouteSet) -> Self {
        self.server.extend(other.server);
        self.static_routes.extend(other.static_routes);
        self.client.extend(other.client);
        self
    }

    pub fn len(&self) -> usize {
        self.server.len() + self.static_routes.len() + self.client.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every route in evaluation order: server, static, client
    pub fn iter(&self) -> impl Iterator<Item = &TaggedRoute> {
        self.server
            .iter()
            .chain(self.static_routes.iter())
            .chain(self.client.iter())
    }

    /// Stable-sorts each bucket by precedence and concatenates the buckets
    ///
    /// Within a bucket: fewer parameters first, then parameterized before
    /// wildcard, then discovery order.
    pub fn into_ordered(self) -> Vec<TaggedRoute> {
        let SiteRouteSet {
            mut server,
            mut static_routes,
            mut client,
        } = self;

        for bucket in [&mut server, &mut static_routes, &mut client] {
            bucket.sort_by(|a, b| compare_precedence(a.pathname(), b.pathname()));
        }

        server.extend(static_routes);
        server.extend(client);
        server
    }
}

impl FromIterator<TaggedRoute> for SiteRouteSet {
    fn from_iter<I: IntoIterator<Item = TaggedRoute>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|route| set.push(route));
        set
    }
}

/// Reserved file names that configure the client app instead of routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialSlot {
    /// `_root.*`: wraps every client page
    Root,
    /// `_index.*`: renders the HTML shell
    Index,
    /// `_404.*`: rendered when no client page matches
    NotFound,
}

impl SpecialSlot {
    /// Slot for a file stem, exact and case-sensitive
    pub fn from_stem(stem: &str) -> Option<Self> {
        match stem {
            "_root" => Some(SpecialSlot::Root),
            "_index" => Some(SpecialSlot::Index),
            "_404" => Some(SpecialSlot::NotFound),
            _ => None,
        }
    }
}

impl fmt::Display for SpecialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpecialSlot::Root => "_root",
            SpecialSlot::Index => "_index",
            SpecialSlot::NotFound => "_404",
        })
    }
}

/// A discovered special file
#[derive(Clone)]
pub struct SpecialFile {
    pub absolute_path: PathBuf,
    pub relative_path: String,

    /// Export holding the component
    pub export_name: String,

    /// Shell renderer exported by an index file
    pub shell: Option<Arc<dyn ShellRenderer>>,
}

impl fmt::Debug for SpecialFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecialFile")
            .field("relative_path", &self.relative_path)
            .field("export_name", &self.export_name)
            .field("shell", &self.shell.is_some())
            .finish()
    }
}

/// At most one file per special slot; the first discovered wins
#[derive(Debug, Clone, Default)]
pub struct SpecialFiles {
    pub root: Option<SpecialFile>,
    pub index: Option<SpecialFile>,
    pub not_found: Option<SpecialFile>,
}

impl SpecialFiles {
    pub fn get(&self, slot: SpecialSlot) -> Option<&SpecialFile> {
        match slot {
            SpecialSlot::Root => self.root.as_ref(),
            SpecialSlot::Index => self.index.as_ref(),
            SpecialSlot::NotFound => self.not_found.as_ref(),
        }
    }

    /// Fills an empty slot; returns the file back when the slot is taken
    pub fn insert(&mut self, slot: SpecialSlot, file: SpecialFile) -> Result<(), SpecialFile> {
        let entry = match slot {
            SpecialSlot::Root => &mut self.root,
            SpecialSlot::Index => &mut self.index,
            SpecialSlot::NotFound => &mut self.not_found,
        };

        if entry.is_some() {
            return Err(file);
        }
        *entry = Some(file);
        Ok(())
    }
}

/// A detected client page; immutable once derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPageEntry {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    pub pathname: String,
    pub title: String,

    /// PascalCase identifier the generated entry module imports the page as
    pub component_alias: String,

    /// Export of the page module holding the component
    pub component_export_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use crate::response;

    fn tagged(method: Method, pathname: &str, kind: RouteKind) -> TaggedRoute {
        let h = handler(|_ctx| async { Ok(response::text("")) });
        TaggedRoute::new(RouteDefinition::new(method, pathname, h), kind, pathname)
    }

    fn names(routes: &[TaggedRoute]) -> Vec<&str> {
        routes.iter().map(|r| r.pathname()).collect()
    }

    #[test]
    fn test_route_definition_normalizes_pathname() {
        let h = handler(|_ctx| async { Ok(response::text("")) });
        let route = RouteDefinition::new(Method::GET, "users/:id/", h);
        assert_eq!(route.pathname, "/users/:id");
        assert_eq!(route.specificity(), 1);
    }

    #[test]
    fn test_merge_is_associative_and_order_preserving() {
        let a = SiteRouteSet::single(tagged(Method::GET, "/a", RouteKind::Server));
        let b = SiteRouteSet::single(tagged(Method::GET, "/b.css", RouteKind::Static));
        let c = SiteRouteSet::single(tagged(Method::GET, "/c", RouteKind::Server));

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));

        assert_eq!(names(&left.server), names(&right.server));
        assert_eq!(names(&left.static_routes), names(&right.static_routes));
        assert_eq!(names(&left.server), vec!["/a", "/c"]);
        assert_eq!(SiteRouteSet::new().merge(left.clone()).len(), left.len());
    }

    #[test]
    fn test_into_ordered_sorts_within_buckets_only() {
        let set: SiteRouteSet = vec![
            tagged(Method::GET, "/*", RouteKind::Client),
            tagged(Method::GET, "/users/:id", RouteKind::Server),
            tagged(Method::GET, "/app.js", RouteKind::Static),
            tagged(Method::GET, "/users", RouteKind::Server),
            tagged(Method::GET, "/", RouteKind::Client),
        ]
        .into_iter()
        .collect();

        let ordered = set.into_ordered();
        assert_eq!(
            names(&ordered),
            vec!["/users", "/users/:id", "/app.js", "/", "/*"]
        );
    }

    #[test]
    fn test_into_ordered_tries_params_before_wildcards() {
        // discovery order puts `*` first, as a name-sorted walk does
        let set: SiteRouteSet = vec![
            tagged(Method::GET, "/*", RouteKind::Server),
            tagged(Method::GET, "/docs/*", RouteKind::Server),
            tagged(Method::GET, "/users/:id", RouteKind::Server),
            tagged(Method::GET, "/about", RouteKind::Server),
        ]
        .into_iter()
        .collect();

        let ordered = set.into_ordered();
        assert_eq!(
            names(&ordered),
            vec!["/about", "/users/:id", "/*", "/docs/*"]
        );
    }

    #[test]
    fn test_special_files_first_wins() {
        let file = |rel: &str| SpecialFile {
            absolute_path: PathBuf::from("/site").join(rel),
            relative_path: rel.to_string(),
            export_name: "default".to_string(),
            shell: None,
        };

        let mut special = SpecialFiles::default();
        assert!(special.insert(SpecialSlot::Root, file("_root.tsx")).is_ok());
        let rejected = special.insert(SpecialSlot::Root, file("nested/_root.tsx"));
        assert_eq!(rejected.unwrap_err().relative_path, "nested/_root.tsx");
        assert_eq!(
            special.get(SpecialSlot::Root).map(|f| f.relative_path.as_str()),
            Some("_root.tsx")
        );
        assert_eq!(SpecialSlot::from_stem("_404"), Some(SpecialSlot::NotFound));
        assert_eq!(SpecialSlot::from_stem("_Root"), None);
    }
}
