//! Site builder
//!
//! Runs one build: walk the root, classify every file into the
//! [`Discovery`] accumulator, check client overlap, bundle the client app,
//! and assemble the final table. Files are processed one at a time in walk
//! order because that order is the tie-break of the specificity sort.

use std::any::Any;
use std::sync::Arc;

use tracing::info;

use crate::assemble::{assemble, check_client_overlap, Discovery};
use crate::classify::Classifier;
use crate::client::{build_client, Bundler, EsbuildBundler, ShellRenderer};
use crate::config::SiteConfig;
use crate::dispatch::{DispatchOptions, Dispatcher};
use crate::error::BuildError;
use crate::handler::{AppState, Handler, Middleware};
use crate::module::{ModuleLoader, ModuleRegistry};
use crate::route::{RouteDefinition, RouteKind, TaggedRoute};
use crate::walker::walk_files;

/// Build inputs that do not fit in [`SiteConfig`]
pub struct SiteBuilder {
    config: SiteConfig,
    loader: Arc<dyn ModuleLoader>,
    bundler: Option<Arc<dyn Bundler>>,
    renderer: Option<Arc<dyn ShellRenderer>>,
    options: DispatchOptions,
}

impl SiteBuilder {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            loader: Arc::new(ModuleRegistry::new()),
            bundler: None,
            renderer: None,
            options: DispatchOptions::default(),
        }
    }

    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Defaults to [`EsbuildBundler`] running `client.bundler_command`
    pub fn bundler(mut self, bundler: impl Bundler + 'static) -> Self {
        self.bundler = Some(Arc::new(bundler));
        self
    }

    /// Shell renderer used when no `_index` file exports one
    pub fn renderer(mut self, renderer: impl ShellRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Appends a middleware; earlier middlewares wrap later ones
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.options.middlewares.push(middleware);
        self
    }

    pub fn default_handler(mut self, handler: Handler) -> Self {
        self.options.default_handler = Some(handler);
        self
    }

    pub fn state<T: Any + Send + Sync>(mut self, state: T) -> Self {
        self.options.state = AppState::new(state);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub async fn build(self) -> Result<Site, BuildError> {
        let SiteBuilder {
            config,
            loader,
            bundler,
            renderer,
            options,
        } = self;

        info!("Building site from {}", config.root_path.display());
        let classifier = Classifier::new(&config, loader.as_ref())?;

        let mut discovery = Discovery::new();
        for file in walk_files(&config.root_path) {
            let file = file?;
            let classification = classifier.classify(&file).await?;
            discovery = discovery.absorb(classification);
        }

        check_client_overlap(&discovery.routes, &discovery.client_pages)?;

        let bundler: Arc<dyn Bundler> = match bundler {
            Some(bundler) => bundler,
            None => Arc::new(EsbuildBundler::from_config(&config.client)),
        };
        let client = build_client(
            &config,
            &discovery.client_pages,
            &discovery.special,
            bundler.as_ref(),
            renderer,
        )
        .await?;

        let routes = assemble(discovery.routes.merge(client))?;
        let count = |kind: RouteKind| routes.iter().filter(|r| r.kind == kind).count();
        info!(
            "Built {} routes ({} server, {} static, {} client)",
            routes.len(),
            count(RouteKind::Server),
            count(RouteKind::Static),
            count(RouteKind::Client)
        );

        Ok(Site {
            config,
            routes,
            options,
        })
    }
}

/// Result of a successful build
pub struct Site {
    config: SiteConfig,
    routes: Vec<TaggedRoute>,
    options: DispatchOptions,
}

impl Site {
    /// Routes in evaluation order, with their origin
    pub fn routes(&self) -> &[TaggedRoute] {
        &self.routes
    }

    pub fn definitions(&self) -> Vec<RouteDefinition> {
        self.routes.iter().map(|r| r.route.clone()).collect()
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.definitions(), self.options.clone())
    }

    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.routes.into_iter().map(|r| r.route), self.options)
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("root_path", &self.config.root_path)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
