//! Entry module synthesis
//!
//! The bundler gets one generated module that imports every client page,
//! the optional `_root` wrapper and `_404` page, and mounts a tiny
//! history-based router into the shell's mount element.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use once_cell::sync::Lazy;
use pathway_router::compare_precedence;
use regex::Regex;

use crate::client::shell::MOUNT_ID;
use crate::config::{ClientConfig, JsxMode};
use crate::error::{BuildError, BuildPhase};
use crate::route::{ClientPageEntry, SpecialFile, SpecialFiles};

/// Prefix every page alias starts with
pub const ALIAS_PREFIX: &str = "Page";

const ROOT_ALIAS: &str = "RootWrapper";
const NOT_FOUND_ALIAS: &str = "NotFound";

static WORD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").expect("word pattern compiles"));

static IDENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles"));

/// PascalCase identifier for a page pathname
///
/// `/users/:id` becomes `PageUsersId`, `/` becomes `PageIndex`.
pub fn component_alias(pathname: &str) -> String {
    let mut alias = String::from(ALIAS_PREFIX);
    let mut words = 0;

    for word in WORD_REGEX.find_iter(pathname) {
        let mut chars = word.as_str().chars();
        if let Some(first) = chars.next() {
            alias.push(first.to_ascii_uppercase());
            alias.push_str(chars.as_str());
            words += 1;
        }
    }

    if words == 0 {
        alias.push_str("Index");
    }
    alias
}

/// Makes `alias` unique among `taken` with a numeric suffix
pub fn dedupe_alias(alias: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(alias.clone()) {
        return alias;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{alias}{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Source of the generated entry module
pub fn entry_module(
    pages: &[ClientPageEntry],
    special: &SpecialFiles,
    client: &ClientConfig,
) -> Result<String, BuildError> {
    let mut pages: Vec<&ClientPageEntry> = pages.iter().collect();
    pages.sort_by(|a, b| compare_precedence(&a.pathname, &b.pathname));

    let mut out = String::new();
    let source = js_string(&client.jsx_import_source)?;

    out.push_str("// Generated by pathway. Do not edit.\n");
    if client.jsx_mode == JsxMode::Classic {
        let _ = writeln!(out, "import React from {source};");
    }
    let _ = writeln!(out, "import {{ createElement, useEffect, useState }} from {source};");
    let _ = writeln!(out, "import {{ createRoot }} from {};", js_string(&client.dom_module)?);

    for page in &pages {
        out.push_str(&import_line(
            &page.component_alias,
            &page.component_export_name,
            &page.absolute_path,
        )?);
    }
    if let Some(root) = &special.root {
        out.push_str(&special_import(ROOT_ALIAS, root)?);
    }
    if let Some(not_found) = &special.not_found {
        out.push_str(&special_import(NOT_FOUND_ALIAS, not_found)?);
    }

    out.push_str("\nconst routes = [\n");
    for page in &pages {
        let _ = writeln!(
            out,
            "  {{ pattern: {}, title: {}, component: {} }},",
            js_string(&page.pathname)?,
            js_string(&page.title)?,
            page.component_alias
        );
    }
    out.push_str("];\n\n");
    let _ = writeln!(out, "const siteTitle = {};", js_string(&client.title)?);

    out.push_str(MATCHER_SOURCE);

    let fallback = if special.not_found.is_some() {
        format!("createElement({NOT_FOUND_ALIAS}, {{ pathname, navigate }})")
    } else {
        "createElement(\"h1\", null, \"Not Found\")".to_string()
    };
    let view = if special.root.is_some() {
        format!("createElement({ROOT_ALIAS}, {{ pathname, navigate }}, page)")
    } else {
        "page".to_string()
    };

    let _ = write!(
        out,
        r#"
function App() {{
  const [pathname, setPathname] = useState(window.location.pathname);
  useEffect(() => {{
    const onPop = () => setPathname(window.location.pathname);
    window.addEventListener("popstate", onPop);
    return () => window.removeEventListener("popstate", onPop);
  }}, []);

  const match = resolve(pathname);
  const title = match && match.route.title ? match.route.title : siteTitle;
  useEffect(() => {{
    document.title = title;
  }}, [title]);

  const page = match
    ? createElement(match.route.component, {{ params: match.params, navigate }})
    : {fallback};
  return {view};
}}

createRoot(document.getElementById({mount})).render(createElement(App));
"#,
        mount = js_string(MOUNT_ID)?,
    );

    Ok(out)
}

const MATCHER_SOURCE: &str = r#"
function matchPattern(pattern, pathname) {
  const want = pattern.split("/").filter(Boolean);
  const have = pathname.split("/").filter(Boolean);
  const params = {};
  for (let i = 0; i < want.length; i++) {
    const segment = want[i];
    if (segment === "*" && i === want.length - 1) {
      params["*"] = have.slice(i).join("/");
      return params;
    }
    if (have[i] === undefined) return null;
    if (segment === "*") {
      params["*"] = have[i];
    } else if (segment.startsWith(":") && segment.length > 1) {
      params[segment.slice(1)] = decodeURIComponent(have[i]);
    } else if (segment !== have[i]) {
      return null;
    }
  }
  return have.length === want.length ? params : null;
}

function resolve(pathname) {
  const path = pathname === "/index.html" ? "/" : pathname;
  for (const route of routes) {
    const params = matchPattern(route.pattern, path) || (path === "/" ? matchPattern(route.pattern, "/index") : null);
    if (params) return { route, params };
  }
  return null;
}

export function navigate(to) {
  window.history.pushState(null, "", to);
  window.dispatchEvent(new PopStateEvent("popstate"));
}
"#;

fn import_line(alias: &str, export_name: &str, path: &Path) -> Result<String, BuildError> {
    let specifier = module_specifier(path)?;

    if export_name == "default" {
        return Ok(format!("import {alias} from {specifier};\n"));
    }
    if !IDENT_REGEX.is_match(export_name) {
        return Err(BuildError::Codegen {
            phase: BuildPhase::Codegen,
            message: format!(
                "export `{export_name}` of {} is not a valid identifier",
                path.display()
            ),
        });
    }
    Ok(format!("import {{ {export_name} as {alias} }} from {specifier};\n"))
}

fn special_import(alias: &str, file: &SpecialFile) -> Result<String, BuildError> {
    import_line(alias, &file.export_name, &file.absolute_path)
}

fn module_specifier(path: &Path) -> Result<String, BuildError> {
    let path = path.to_str().ok_or_else(|| BuildError::Codegen {
        phase: BuildPhase::Codegen,
        message: format!("module path {} is not valid UTF-8", path.display()),
    })?;
    js_string(&path.replace('\\', "/"))
}

/// Quoted JavaScript string literal
fn js_string(value: &str) -> Result<String, BuildError> {
    serde_json::to_string(value).map_err(|e| BuildError::Codegen {
        phase: BuildPhase::Codegen,
        message: e.to_string(),
    })
}
