//! Module exports and the module loading collaborator
//!
//! A route file is described by the values it exports. Instead of probing
//! arbitrary values for marker properties, every export is one variant of
//! [`Export`] and the classifier asks for the shape it needs through the
//! refinement methods (`as_handler`, `as_partial_routes`, ...).
//!
//! Loading is a collaborator: [`ModuleLoader`] turns a walked file into its
//! exports. [`ModuleRegistry`] is the explicit manifest implementation where
//! every route file registers its exports under its relative path.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::client::shell::ShellRenderer;
use crate::handler::Handler;
use crate::walker::FileDescriptor;

/// Route object carrying its own method; the pathname comes from the file
#[derive(Clone)]
pub struct PartialRoute {
    pub method: String,
    pub handler: Handler,
}

impl PartialRoute {
    pub fn new(method: impl Into<String>, handler: Handler) -> Self {
        Self {
            method: method.into(),
            handler,
        }
    }
}

impl fmt::Debug for PartialRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialRoute")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Marker identifying a client-rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPage {
    /// Document title; the site title is used when absent
    pub title: Option<String>,

    /// Name of the export holding the page component
    pub component: String,
}

impl ClientPage {
    /// Page whose component is the module's default export
    pub fn new() -> Self {
        Self {
            title: None,
            component: "default".to_string(),
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new()
        }
    }

    pub fn component(mut self, export_name: impl Into<String>) -> Self {
        self.component = export_name.into();
        self
    }
}

/// A single exported value, tagged by what it is
#[derive(Clone)]
pub enum Export {
    /// Request handler; becomes a route when exported under a method name
    Handler(Handler),
    Route(PartialRoute),
    Routes(Vec<PartialRoute>),
    ClientPage(ClientPage),
    /// UI component (root wrapper, not-found page, page component)
    Component,
    /// Renderer for the HTML shell, exported by the index special file
    IndexShell(Arc<dyn ShellRenderer>),
    /// Any other exported value; ignored by classification
    Value(serde_json::Value),
}

impl Export {
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Export::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_partial_routes(&self) -> Option<&[PartialRoute]> {
        match self {
            Export::Route(route) => Some(std::slice::from_ref(route)),
            Export::Routes(routes) => Some(routes),
            _ => None,
        }
    }

    pub fn as_client_page(&self) -> Option<&ClientPage> {
        match self {
            Export::ClientPage(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<&Arc<dyn ShellRenderer>> {
        match self {
            Export::IndexShell(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Export::Component)
    }

    fn kind(&self) -> &'static str {
        match self {
            Export::Handler(_) => "handler",
            Export::Route(_) => "route",
            Export::Routes(_) => "routes",
            Export::ClientPage(_) => "client-page",
            Export::Component => "component",
            Export::IndexShell(_) => "index-shell",
            Export::Value(_) => "value",
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::ClientPage(page) => f.debug_tuple("ClientPage").field(page).finish(),
            Export::Route(route) => f.debug_tuple("Route").field(route).finish(),
            Export::Routes(routes) => f.debug_tuple("Routes").field(routes).finish(),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Exports of one module, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    exports: Vec<(String, Export)>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an export
    pub fn with(mut self, name: impl Into<String>, export: Export) -> Self {
        let name = name.into();
        match self.exports.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = export,
            None => self.exports.push((name, export)),
        }
        self
    }

    /// Shorthand for a method-named handler export (`GET`, `POST`, ...)
    pub fn method(self, method: &str, handler: Handler) -> Self {
        self.with(method.to_ascii_uppercase(), Export::Handler(handler))
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

/// Loads the exports of a walked file
///
/// Any error means "this file could not be imported"; the classifier
/// decides whether that is fatal.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, file: &FileDescriptor) -> Result<ModuleExports>;
}

/// Explicit manifest of route modules keyed by path relative to the site root
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleExports>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module under its relative path (`users/:id.ts`)
    pub fn register(mut self, relative_path: &str, exports: ModuleExports) -> Self {
        self.modules.insert(registry_key(relative_path), exports);
        self
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.modules.contains_key(&registry_key(relative_path))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn registry_key(relative_path: &str) -> String {
    relative_path
        .replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn load(&self, file: &FileDescriptor) -> Result<ModuleExports> {
        match self.modules.get(&registry_key(&file.relative_path)) {
            Some(exports) => Ok(exports.clone()),
            None => bail!("no module registered for {}", file.relative_path),
        }
    }
}
