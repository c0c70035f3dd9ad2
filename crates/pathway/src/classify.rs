//! Module classifier
//!
//! Decides what a walked file contributes. The checks form a priority chain
//! that stops at the first category with a result:
//!
//! 1. server routes from method-named handler exports and partial routes
//! 2. special files (`_root`, `_index`, `_404`) and client pages, when
//!    client building is on and the file has a client extension
//! 3. a static route, when the extension is not a code extension
//!
//! Anything else is skipped.

use axum::http::Method;
use glob::Pattern;
use pathway_router::parse_path;
use tracing::{debug, warn};

use crate::client::codegen::component_alias;
use crate::config::SiteConfig;
use crate::error::BuildError;
use crate::handler::handler;
use crate::module::{ModuleExports, ModuleLoader};
use crate::response;
use crate::route::{
    ClientPageEntry, RouteDefinition, RouteKind, SpecialFile, SpecialSlot, TaggedRoute,
};
use crate::walker::FileDescriptor;

/// Export names recognised as HTTP method handlers
pub const METHOD_EXPORTS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "CONNECT", "TRACE",
];

/// What one file contributes to the build
#[derive(Debug)]
pub enum Classification {
    /// One or more server routes, in export order
    Server(Vec<TaggedRoute>),
    Special(SpecialSlot, SpecialFile),
    ClientPage(ClientPageEntry),
    Static(TaggedRoute),
    Skipped,
}

impl Classification {
    pub fn kind(&self) -> &'static str {
        match self {
            Classification::Server(_) => "server",
            Classification::Special(..) => "special",
            Classification::ClientPage(_) => "client",
            Classification::Static(_) => "static",
            Classification::Skipped => "skipped",
        }
    }
}

pub struct Classifier<'a> {
    config: &'a SiteConfig,
    loader: &'a dyn ModuleLoader,
    ignore: Vec<Pattern>,
}

impl<'a> Classifier<'a> {
    /// Fails when a `static_ignore` entry is not a valid glob
    pub fn new(config: &'a SiteConfig, loader: &'a dyn ModuleLoader) -> Result<Self, BuildError> {
        let ignore = config
            .static_ignore
            .iter()
            .map(|raw| {
                Pattern::new(raw)
                    .map_err(|e| BuildError::Config(format!("static_ignore `{}`: {}", raw, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            loader,
            ignore,
        })
    }

    fn is_server_file(&self, file: &FileDescriptor) -> bool {
        file.has_extension(&self.config.server_extensions)
    }

    fn is_client_file(&self, file: &FileDescriptor) -> bool {
        file.has_extension(&self.config.client.client_extensions)
    }

    fn is_ignored(&self, file: &FileDescriptor) -> bool {
        self.ignore
            .iter()
            .any(|p| p.matches(&file.relative_path) || p.matches(&file.filename))
    }

    pub async fn classify(&self, file: &FileDescriptor) -> Result<Classification, BuildError> {
        let server_file = self.is_server_file(file);
        let client_file = self.is_client_file(file);

        if !server_file && !client_file {
            return self.classify_static(file).await;
        }

        let exports = match self.loader.load(file).await {
            Ok(exports) => exports,
            Err(source) if self.config.strict_imports && server_file => {
                return Err(BuildError::RouteBuild {
                    path: file.absolute_path.clone(),
                    source,
                });
            }
            Err(e) => {
                warn!("Skipping {}: import failed: {:#}", file.relative_path, e);
                return Ok(Classification::Skipped);
            }
        };

        if server_file {
            let routes = self.server_routes(file, &exports)?;
            if !routes.is_empty() {
                debug!("{}: {} server routes", file.relative_path, routes.len());
                return Ok(Classification::Server(routes));
            }
        }

        if self.config.client.enabled && client_file {
            if let Some(slot) = SpecialSlot::from_stem(file.stem()) {
                debug!("{}: special file {}", file.relative_path, slot);
                return Ok(Classification::Special(slot, special_file(file, &exports)));
            }
            if let Some(page) = self.client_page(file, &exports) {
                debug!("{}: client page {}", file.relative_path, page.pathname);
                return Ok(Classification::ClientPage(page));
            }
        }

        debug!("{}: no routes", file.relative_path);
        Ok(Classification::Skipped)
    }

    fn server_routes(
        &self,
        file: &FileDescriptor,
        exports: &ModuleExports,
    ) -> Result<Vec<TaggedRoute>, BuildError> {
        let pathname = parse_path(&file.relative_path, &self.config.server_extensions);
        let mut routes = Vec::new();

        for (name, export) in exports.iter() {
            if let Some(h) = export.as_handler() {
                if !METHOD_EXPORTS.contains(&name) {
                    continue;
                }
                let method = parse_method(file, name)?;
                routes.push(server_route(file, method, &pathname, h.clone(), name));
            } else if let Some(partials) = export.as_partial_routes() {
                for partial in partials {
                    let method = parse_method(file, &partial.method)?;
                    routes.push(server_route(file, method, &pathname, partial.handler.clone(), name));
                }
            }
        }

        Ok(routes)
    }

    fn client_page(&self, file: &FileDescriptor, exports: &ModuleExports) -> Option<ClientPageEntry> {
        let page = exports.iter().find_map(|(_, e)| e.as_client_page())?;
        let pathname = parse_path(&file.relative_path, &self.config.client.client_extensions);

        Some(ClientPageEntry {
            absolute_path: file.absolute_path.clone(),
            relative_path: file.relative_path.clone(),
            title: page
                .title
                .clone()
                .unwrap_or_else(|| self.config.client.title.clone()),
            component_alias: component_alias(&pathname),
            component_export_name: page.component.clone(),
            pathname,
        })
    }

    async fn classify_static(&self, file: &FileDescriptor) -> Result<Classification, BuildError> {
        if self.is_ignored(file) {
            debug!("{}: ignored", file.relative_path);
            return Ok(Classification::Skipped);
        }

        let contents = file.read_bytes().await?;
        let mime = file.mime_type.clone();
        let serve = handler(move |_ctx| {
            let contents = contents.clone();
            let mime = mime.clone();
            async move { Ok(response::bytes(contents, mime.as_deref())) }
        });

        let pathname = parse_path(&file.relative_path, &[] as &[&str]);
        debug!("{}: static route {}", file.relative_path, pathname);
        Ok(Classification::Static(TaggedRoute::new(
            RouteDefinition::new(Method::GET, &pathname, serve),
            RouteKind::Static,
            &file.relative_path,
        )))
    }
}

fn parse_method(file: &FileDescriptor, raw: &str) -> Result<Method, BuildError> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).map_err(|e| {
        BuildError::RouteBuild {
            path: file.absolute_path.clone(),
            source: anyhow::anyhow!("invalid HTTP method `{}`: {}", raw, e),
        }
    })
}

fn server_route(
    file: &FileDescriptor,
    method: Method,
    pathname: &str,
    handler: crate::handler::Handler,
    export_name: &str,
) -> TaggedRoute {
    TaggedRoute::new(
        RouteDefinition::new(method, pathname, handler),
        RouteKind::Server,
        &file.relative_path,
    )
    .with_component(export_name)
}

fn special_file(file: &FileDescriptor, exports: &ModuleExports) -> SpecialFile {
    let export_name = exports
        .iter()
        .find(|(_, e)| e.is_component())
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "default".to_string());
    let shell = exports.iter().find_map(|(_, e)| e.as_shell()).cloned();

    SpecialFile {
        absolute_path: file.absolute_path.clone(),
        relative_path: file.relative_path.clone(),
        export_name,
        shell,
    }
}
