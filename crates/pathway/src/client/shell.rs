//! HTML shell rendering
//!
//! The shell is the one HTML document every client route answers with. It
//! must contain an element with id [`MOUNT_ID`]; the generated entry module
//! mounts the app there.

use anyhow::Result;
use maud::{html, DOCTYPE};

/// Id of the element the client app is mounted into
pub const MOUNT_ID: &str = "root";

/// What a shell needs to reference the bundled assets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellContext {
    pub title: String,

    /// Script URLs, loaded as ES modules
    pub scripts: Vec<String>,

    /// Stylesheet URLs
    pub styles: Vec<String>,
}

/// UI renderer collaborator producing the shell document
pub trait ShellRenderer: Send + Sync {
    fn render(&self, shell: &ShellContext) -> Result<String>;
}

impl<F> ShellRenderer for F
where
    F: Fn(&ShellContext) -> Result<String> + Send + Sync,
{
    fn render(&self, shell: &ShellContext) -> Result<String> {
        self(shell)
    }
}

/// Minimal shell used when neither the site nor an `_index` file provides one
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShell;

impl ShellRenderer for DefaultShell {
    fn render(&self, shell: &ShellContext) -> Result<String> {
        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (shell.title) }
                    @for href in &shell.styles {
                        link rel="stylesheet" href=(href);
                    }
                }
                body {
                    div id=(MOUNT_ID) {}
                    @for src in &shell.scripts {
                        script type="module" src=(src) {}
                    }
                }
            }
        };
        Ok(markup.into_string())
    }
}
