// File: src/config.rs
// Purpose: Build configuration parsing from pathway.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Site build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory walked for route files (default: "routes")
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Extensions treated as code: stripped from pathnames, never served as static files
    #[serde(default = "default_server_extensions")]
    pub server_extensions: Vec<String>,

    /// Glob patterns (relative to `root_path`) excluded from static serving
    #[serde(default)]
    pub static_ignore: Vec<String>,

    /// Whether a code file that fails to load aborts the build
    #[serde(default = "default_false")]
    pub strict_imports: bool,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Single-page-application build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,

    /// Document title used by the HTML shell and by pages without their own
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub jsx_mode: JsxMode,

    /// Module providing `createElement` (and the JSX runtime in automatic mode)
    #[serde(default = "default_jsx_import_source")]
    pub jsx_import_source: String,

    /// Module providing `createRoot`
    #[serde(default = "default_dom_module")]
    pub dom_module: String,

    #[serde(default = "default_false")]
    pub minify: bool,

    #[serde(default = "default_false")]
    pub sourcemap: bool,

    #[serde(default = "default_false")]
    pub splitting: bool,

    #[serde(default = "default_target")]
    pub target: Vec<String>,

    /// Extensions eligible for client page detection
    #[serde(default = "default_client_extensions")]
    pub client_extensions: Vec<String>,

    /// Executable invoked by the esbuild bundler
    #[serde(default = "default_bundler_command")]
    pub bundler_command: String,

    /// Extra directories for bare-import resolution (passed as NODE_PATH)
    #[serde(default)]
    pub node_paths: Vec<PathBuf>,
}

/// JSX transform used when bundling client pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsxMode {
    #[default]
    Automatic,
    Classic,
}

/// Host listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest request body buffered before dispatch
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default values
fn default_root_path() -> PathBuf {
    PathBuf::from("routes")
}

fn default_server_extensions() -> Vec<String> {
    [".ts", ".tsx", ".js", ".jsx", ".mjs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_client_extensions() -> Vec<String> {
    vec![".tsx".to_string(), ".jsx".to_string()]
}

fn default_title() -> String {
    "Pathway App".to_string()
}

fn default_jsx_import_source() -> String {
    "react".to_string()
}

fn default_dom_module() -> String {
    "react-dom/client".to_string()
}

fn default_target() -> Vec<String> {
    vec!["es2020".to_string()]
}

fn default_bundler_command() -> String {
    "esbuild".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_false() -> bool {
    false
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            server_extensions: default_server_extensions(),
            static_ignore: Vec::new(),
            strict_imports: false,
            client: ClientConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            title: default_title(),
            jsx_mode: JsxMode::default(),
            jsx_import_source: default_jsx_import_source(),
            dom_module: default_dom_module(),
            minify: false,
            sourcemap: false,
            splitting: false,
            target: default_target(),
            client_extensions: default_client_extensions(),
            bundler_command: default_bundler_command(),
            node_paths: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl SiteConfig {
    /// Configuration rooted at `root_path` with every other field defaulted
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: SiteConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./pathway.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("pathway.toml")
    }

    /// Builder-style switch for client page bundling
    pub fn with_client(mut self, enabled: bool) -> Self {
        self.client.enabled = enabled;
        self
    }

    /// Address the host listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
