//! Client build orchestration
//!
//! Once every client page is known the orchestrator generates the entry
//! module, hands it to the [`Bundler`], renders the HTML shell around the
//! bundled assets, and returns the routes serving all of it. Any failure
//! aborts the build; nothing from a half-finished bundle is published.

pub mod bundler;
pub mod codegen;
pub mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::error::{BuildError, BuildPhase};
use crate::handler::handler;
use crate::response;
use crate::route::{ClientPageEntry, RouteDefinition, RouteKind, SiteRouteSet, SpecialFiles, TaggedRoute};
use crate::walker::{guess_mime, SCRATCH_PREFIX};

pub use bundler::{BundleOptions, BundleOutput, BundleRequest, Bundler, EsbuildBundler};
pub use shell::{DefaultShell, ShellContext, ShellRenderer, MOUNT_ID};

/// File name of the generated entry module inside the scratch dir
pub const ENTRY_FILE: &str = "entry.tsx";

/// Pathnames answered with the shell no matter which pages exist
pub const SHELL_PATHS: [&str; 3] = ["/", "/index.html", "/*"];

/// Bundle outputs split by how the shell references them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAssets {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
}

/// `.js`/`.mjs` become scripts, `.css` become styles, the rest is only served
pub fn partition_outputs(outputs: &[BundleOutput]) -> ClientAssets {
    let mut assets = ClientAssets::default();

    for output in outputs {
        let url = asset_url(output);
        match output.extension() {
            Some(".js") | Some(".mjs") => assets.scripts.push(url),
            Some(".css") => assets.styles.push(url),
            _ => {}
        }
    }
    assets
}

fn asset_url(output: &BundleOutput) -> String {
    format!("/{}", output.path.trim_start_matches('/'))
}

/// Bundles the client pages and returns their routes
///
/// Returns an empty set when client building is off or there are no pages.
/// The shell comes from the `_index` file's renderer when it exports one,
/// then from `renderer`, then from [`DefaultShell`].
pub async fn build_client(
    config: &SiteConfig,
    pages: &[ClientPageEntry],
    special: &SpecialFiles,
    bundler: &dyn Bundler,
    renderer: Option<Arc<dyn ShellRenderer>>,
) -> Result<SiteRouteSet, BuildError> {
    if !config.client.enabled || pages.is_empty() {
        return Ok(SiteRouteSet::new());
    }

    let source = codegen::entry_module(pages, special, &config.client)?;
    let outputs = bundle_entry(config, source, bundler).await?;
    let assets = partition_outputs(&outputs);
    info!(
        "Bundled {} client pages into {} files ({} scripts, {} styles)",
        pages.len(),
        outputs.len(),
        assets.scripts.len(),
        assets.styles.len()
    );

    let renderer: Arc<dyn ShellRenderer> = match special
        .index
        .as_ref()
        .and_then(|index| index.shell.clone())
        .or(renderer)
    {
        Some(renderer) => renderer,
        None => Arc::new(DefaultShell),
    };

    let shell = ShellContext {
        title: config.client.title.clone(),
        scripts: assets.scripts,
        styles: assets.styles,
    };
    let html = renderer.render(&shell).map_err(|source| BuildError::Render {
        phase: BuildPhase::Render,
        source,
    })?;

    Ok(client_routes(outputs, pages, Bytes::from(html)))
}

/// Writes the entry module into a scratch dir, bundles it, removes the dir
async fn bundle_entry(
    config: &SiteConfig,
    source: String,
    bundler: &dyn Bundler,
) -> Result<Vec<BundleOutput>, BuildError> {
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(&config.root_path)
        .map_err(|e| BuildError::fs(BuildPhase::WriteEntry, &config.root_path, e))?;

    let entrypoint = scratch.path().join(ENTRY_FILE);
    tokio::fs::write(&entrypoint, source)
        .await
        .map_err(|e| BuildError::fs(BuildPhase::WriteEntry, &entrypoint, e))?;
    debug!("Wrote client entry module to {}", entrypoint.display());

    let request = BundleRequest {
        entrypoint,
        outdir: scratch.path().join("out"),
        options: BundleOptions::from_config(&config.client, &config.root_path),
    };
    let bundled = bundler.bundle(&request).await;
    remove_scratch(scratch);

    bundled.map_err(|source| BuildError::Bundler {
        phase: BuildPhase::Bundle,
        source,
    })
}

fn remove_scratch(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(
            phase = %BuildPhase::Cleanup,
            "Failed to remove build scratch dir {}: {}",
            path.display(),
            e
        );
    }
}

fn client_routes(outputs: Vec<BundleOutput>, pages: &[ClientPageEntry], html: Bytes) -> SiteRouteSet {
    let mut routes = SiteRouteSet::new();

    for output in outputs {
        let url = asset_url(&output);
        let mime = output.extension().and_then(guess_mime);
        let contents = output.contents;
        let serve = handler(move |_ctx| {
            let contents = contents.clone();
            async move { Ok(response::bytes(contents, mime)) }
        });
        routes.push(
            TaggedRoute::new(
                RouteDefinition::new(Method::GET, &url, serve),
                RouteKind::Static,
                PathBuf::from(output.path),
            )
            .with_component("bundle"),
        );
    }

    for page in pages {
        if SHELL_PATHS.contains(&page.pathname.as_str()) {
            continue;
        }
        routes.push(
            TaggedRoute::new(
                RouteDefinition::new(Method::GET, &page.pathname, shell_handler(&html)),
                RouteKind::Client,
                PathBuf::from(&page.relative_path),
            )
            .with_component(page.component_alias.clone()),
        );
    }

    for pathname in SHELL_PATHS {
        routes.push(
            TaggedRoute::new(
                RouteDefinition::new(Method::GET, pathname, shell_handler(&html)),
                RouteKind::Client,
                PathBuf::from(ENTRY_FILE),
            )
            .with_component("shell"),
        );
    }

    routes
}

fn shell_handler(html: &Bytes) -> crate::handler::Handler {
    let html = html.clone();
    handler(move |_ctx| {
        let html = html.clone();
        async move { Ok(response::html(html)) }
    })
}
