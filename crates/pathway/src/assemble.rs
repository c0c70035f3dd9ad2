//! Route assembly and conflict detection
//!
//! [`Discovery`] is the accumulator threaded through the walk. Once the
//! walk is done, [`check_client_overlap`] rejects pathnames claimed by both
//! a server route and a client page, and [`assemble`] orders the table and
//! rejects duplicate `method + pathname` keys.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use axum::http::Method;
use tracing::{debug, warn};

use crate::classify::Classification;
use crate::client::codegen::dedupe_alias;
use crate::error::{BuildError, ConflictRecord};
use crate::route::{ClientPageEntry, SiteRouteSet, SpecialFiles, TaggedRoute};

/// Everything classification found so far
#[derive(Debug, Default)]
pub struct Discovery {
    pub routes: SiteRouteSet,
    pub special: SpecialFiles,
    pub client_pages: Vec<ClientPageEntry>,
    aliases: HashSet<String>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one file's classification into the accumulator
    pub fn absorb(mut self, classification: Classification) -> Self {
        match classification {
            Classification::Server(routes) => {
                self.routes = self.routes.merge(routes.into_iter().collect());
            }
            Classification::Static(route) => {
                self.routes = self.routes.merge(SiteRouteSet::single(route));
            }
            Classification::Special(slot, file) => {
                if let Err(dup) = self.special.insert(slot, file) {
                    warn!(
                        "Ignoring {}: {} is already provided by {}",
                        dup.relative_path,
                        slot,
                        self.special
                            .get(slot)
                            .map(|f| f.relative_path.as_str())
                            .unwrap_or_default()
                    );
                }
            }
            Classification::ClientPage(mut page) => {
                page.component_alias = dedupe_alias(page.component_alias, &mut self.aliases);
                self.client_pages.push(page);
            }
            Classification::Skipped => {}
        }
        self
    }
}

/// Fails when a client page resolves to the pathname of a server `GET` route
pub fn check_client_overlap(
    routes: &SiteRouteSet,
    pages: &[ClientPageEntry],
) -> Result<(), BuildError> {
    for page in pages {
        let mut sources: Vec<PathBuf> = routes
            .server
            .iter()
            .filter(|r| r.method() == Method::GET && r.pathname() == page.pathname)
            .map(|r| r.source_path.clone())
            .collect();

        if !sources.is_empty() {
            sources.push(PathBuf::from(&page.relative_path));
            return Err(ConflictRecord {
                path: page.pathname.clone(),
                method: Method::GET,
                sources,
            }
            .into());
        }
    }
    Ok(())
}

/// Orders the routes for dispatch and rejects duplicate keys
///
/// Buckets are stable-sorted by specificity and concatenated server,
/// static, client. Two routes sharing method and pathname are always a
/// conflict, whatever their bucket.
pub fn assemble(routes: SiteRouteSet) -> Result<Vec<TaggedRoute>, BuildError> {
    let ordered = routes.into_ordered();

    {
        let mut seen: HashMap<(&Method, &str), &TaggedRoute> = HashMap::with_capacity(ordered.len());
        for route in &ordered {
            if let Some(first) = seen.insert((route.method(), route.pathname()), route) {
                return Err(ConflictRecord {
                    path: route.pathname().to_string(),
                    method: route.method().clone(),
                    sources: vec![first.source_path.clone(), route.source_path.clone()],
                }
                .into());
            }
        }
    }

    debug!("Assembled {} routes", ordered.len());
    Ok(ordered)
}
