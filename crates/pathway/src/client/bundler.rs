//! External bundler collaborator

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::config::{ClientConfig, JsxMode};

/// Knobs handed to the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    pub minify: bool,
    pub sourcemap: bool,
    pub splitting: bool,
    pub target: Vec<String>,
    pub jsx_mode: JsxMode,
    pub jsx_import_source: String,

    /// Directory bare imports are resolved from
    pub resolve_dir: PathBuf,

    /// Extra module resolution roots
    pub node_paths: Vec<PathBuf>,
}

impl BundleOptions {
    pub fn from_config(client: &ClientConfig, resolve_dir: impl Into<PathBuf>) -> Self {
        Self {
            minify: client.minify,
            sourcemap: client.sourcemap,
            splitting: client.splitting,
            target: client.target.clone(),
            jsx_mode: client.jsx_mode,
            jsx_import_source: client.jsx_import_source.clone(),
            resolve_dir: resolve_dir.into(),
            node_paths: client.node_paths.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub entrypoint: PathBuf,

    /// Scratch directory the bundler may write into
    pub outdir: PathBuf,

    pub options: BundleOptions,
}

/// One emitted file; `path` is relative to the output root, `/`-separated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutput {
    pub path: String,
    pub contents: Bytes,
}

impl BundleOutput {
    pub fn new(path: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next()?;
        let dot = name.rfind('.')?;
        Some(&name[dot..])
    }
}

#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(&self, request: &BundleRequest) -> Result<Vec<BundleOutput>>;
}

/// Runs the esbuild CLI and reads its output directory back
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    command: String,
}

impl EsbuildBundler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(client: &ClientConfig) -> Self {
        Self::new(client.bundler_command.clone())
    }

    fn command(&self, request: &BundleRequest) -> Command {
        let options = &request.options;
        let mut cmd = Command::new(&self.command);

        cmd.arg(&request.entrypoint)
            .arg("--bundle")
            .arg(format!("--outdir={}", request.outdir.display()))
            .arg("--format=esm")
            .arg("--platform=browser")
            .arg("--entry-names=[name]-[hash]")
            .arg("--log-level=warning");

        if options.minify {
            cmd.arg("--minify");
        }
        if options.sourcemap {
            cmd.arg("--sourcemap");
        }
        if options.splitting {
            cmd.arg("--splitting");
        }
        if !options.target.is_empty() {
            cmd.arg(format!("--target={}", options.target.join(",")));
        }

        match options.jsx_mode {
            JsxMode::Automatic => {
                cmd.arg("--jsx=automatic")
                    .arg(format!("--jsx-import-source={}", options.jsx_import_source));
            }
            JsxMode::Classic => {
                cmd.arg("--jsx=transform");
            }
        }

        if !options.node_paths.is_empty() {
            if let Ok(joined) = std::env::join_paths(&options.node_paths) {
                cmd.env("NODE_PATH", joined);
            }
        }

        cmd.current_dir(&options.resolve_dir).kill_on_drop(true);
        cmd
    }
}

impl Default for EsbuildBundler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

#[async_trait]
impl Bundler for EsbuildBundler {
    async fn bundle(&self, request: &BundleRequest) -> Result<Vec<BundleOutput>> {
        let output = self
            .command(request)
            .output()
            .await
            .with_context(|| format!("failed to execute `{}`. Is esbuild installed?", self.command))?;

        if !output.status.success() {
            bail!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        read_outputs(&request.outdir).await
    }
}

/// Every file below `outdir`, in file name order
pub async fn read_outputs(outdir: &Path) -> Result<Vec<BundleOutput>> {
    let mut outputs = Vec::new();

    for entry in WalkDir::new(outdir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to read {}", outdir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(outdir)
            .with_context(|| format!("{} escaped the output dir", entry.path().display()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        let contents = tokio::fs::read(entry.path())
            .await
            .with_context(|| format!("failed to read {}", entry.path().display()))?;

        outputs.push(BundleOutput::new(relative, contents));
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_extension() {
        assert_eq!(BundleOutput::new("entry-AB12.js", "").extension(), Some(".js"));
        assert_eq!(BundleOutput::new("chunks/a.css", "").extension(), Some(".css"));
        assert_eq!(BundleOutput::new("v1.2/LICENSE", "").extension(), None);
    }

    #[test]
    fn test_esbuild_arguments() {
        let client = ClientConfig {
            minify: true,
            splitting: true,
            ..ClientConfig::default()
        };
        let request = BundleRequest {
            entrypoint: PathBuf::from("/tmp/entry.tsx"),
            outdir: PathBuf::from("/tmp/out"),
            options: BundleOptions::from_config(&client, "/site"),
        };

        let cmd = EsbuildBundler::from_config(&client).command(&request);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "/tmp/entry.tsx");
        assert!(args.contains(&"--outdir=/tmp/out".to_string()));
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--splitting".to_string()));
        assert!(!args.contains(&"--sourcemap".to_string()));
        assert!(args.contains(&"--target=es2020".to_string()));
        assert!(args.contains(&"--jsx-import-source=react".to_string()));
        assert_eq!(cmd.as_std().get_current_dir(), Some(Path::new("/site")));
    }

    #[tokio::test]
    async fn test_read_outputs_is_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("chunks")).unwrap();
        std::fs::write(dir.path().join("entry.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join("chunks/a.js"), "a").unwrap();
        std::fs::write(dir.path().join("entry.css"), "body{}").unwrap();

        let outputs = read_outputs(dir.path()).await.unwrap();
        let paths: Vec<&str> = outputs.iter().map(|o| o.path.as_str()).collect();

        assert_eq!(paths, vec!["chunks/a.js", "entry.css", "entry.js"]);
        assert_eq!(outputs[2].contents, Bytes::from("console.log(1)"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = BundleRequest {
            entrypoint: dir.path().join("entry.tsx"),
            outdir: dir.path().join("out"),
            options: BundleOptions::from_config(&ClientConfig::default(), dir.path()),
        };

        let err = EsbuildBundler::new("pathway-no-such-bundler")
            .bundle(&request)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pathway-no-such-bundler"));
    }
}
