//! Linearizes the analyzable modules of a snapshot into one script.
//!
//! Layout of the generated code:
//!
//! 1. declaration of the shared default-export slot,
//! 2. one resolution binding per recognized import,
//! 3. every transformed module body in store order, each preceded by a
//!    provenance comment.
//!
//! The shared slot is a single global. Every module with an `export default`
//! writes it, so with several default exports the last module in store order
//! wins. That collision is deliberate and covered by tests.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analyzer::{is_analyzable, ModuleRecord};
use crate::cache::ModuleCache;
use crate::document::js_string;
use crate::error::BuildError;
use crate::options::PreviewOptions;
use crate::resolver::{resolve_specifier, Resolution, ResolvedImport};
use crate::vfs::ProjectSnapshot;

lazy_static! {
    /// Static import statements of every shape, including multi-line named
    /// lists, wherever they start on a line.
    static ref IMPORT_STATEMENT_RE: Regex = Regex::new(
        r#"(?m)(?:^[ \t]*)?\bimport\s+(?:[\w$*{}\s,]+?\s*from\s*)?['"][^'"\n]*['"][ \t]*;?[ \t]*\r?\n?"#
    )
    .unwrap();
    static ref EXPORT_DEFAULT_FUNCTION_RE: Regex =
        Regex::new(r"export\s+default\s+function\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap();
    static ref EXPORT_DEFAULT_RE: Regex = Regex::new(r"export\s+default\s+").unwrap();
    static ref EXPORT_DECLARATION_RE: Regex =
        Regex::new(r"export\s+((?:async\s+)?function|const|let|var|class)\b").unwrap();
    static ref EXPORT_LIST_RE: Regex = Regex::new(
        r#"(?m)(?:^[ \t]*)?\bexport\s*(?:\{[^}]*\}|\*(?:\s*as\s+[A-Za-z_$][A-Za-z0-9_$]*)?)(?:\s*from\s*['"][^'"\n]*['"])?[ \t]*;?"#
    )
    .unwrap();

    /// Top-level (unindented) declarations of the name `App`.
    static ref APP_DECLARATION_RE: Regex =
        Regex::new(r"(?m)^(?:async\s+)?(?:function(?:\s*\*\s*|\s+)|(?:class|const|let|var)\s+)App\b")
            .unwrap();
    /// Top-level (unindented) function declarations with an uppercase name.
    static ref COMPONENT_FUNCTION_RE: Regex =
        Regex::new(r"(?m)^(?:async\s+)?function(?:\s*\*\s*|\s+)([A-Z][A-Za-z0-9_$]*)").unwrap();
}

/// One module after its module syntax was stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedModule {
    pub path: String,
    pub code: String,
    pub writes_shared_slot: bool,
}

/// What the entry detection needs to know about a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryHints {
    /// A global binding named `App` exists.
    pub defines_app: bool,
    /// Last module, in build order, that assigns the shared slot.
    pub shared_slot_writer: Option<String>,
    /// Uppercase top-level function declarations, in bundle order.
    pub component_candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub modules: Vec<ModuleRecord>,
    pub imports: Vec<ResolvedImport>,
    pub transformed: Vec<TransformedModule>,
    pub resolution_code: String,
    pub body: String,
    /// Slot declaration, resolution bindings and body, ready to execute.
    pub code: String,
    pub hints: EntryHints,
}

pub struct Bundler<'a> {
    options: &'a PreviewOptions,
    cache: Option<&'a mut ModuleCache>,
}

impl<'a> Bundler<'a> {
    pub fn new(options: &'a PreviewOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a mut ModuleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(mut self, snapshot: &ProjectSnapshot) -> Result<Bundle, BuildError> {
        self.options.validate()?;

        let sources: Vec<(&str, &str)> = snapshot
            .entries()
            .filter(|e| is_analyzable(e))
            .map(|e| (e.path.as_str(), e.content.as_str()))
            .collect();
        if sources.is_empty() {
            return Err(BuildError::NoScriptFiles);
        }
        tracing::debug!(
            files = ?sources.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            "analyzing modules"
        );

        let modules: Vec<ModuleRecord> = sources
            .iter()
            .map(|(path, source)| match self.cache.as_deref_mut() {
                Some(cache) => cache.analyze(path, source),
                None => crate::analyzer::analyze_module(path, source),
            })
            .collect();

        let imports: Vec<ResolvedImport> = modules
            .iter()
            .flat_map(|module| {
                module.imports.iter().map(move |import| ResolvedImport {
                    importer: module.path.clone(),
                    import: import.clone(),
                    resolution: resolve_specifier(snapshot, &module.path, &import.specifier),
                })
            })
            .collect();

        let by_path: HashMap<&str, &ModuleRecord> =
            modules.iter().map(|m| (m.path.as_str(), m)).collect();
        let resolution_code = emit_resolution_bindings(&imports, &by_path, self.options);

        let slot = self.options.shared_default_slot.as_str();
        let transformed: Vec<TransformedModule> = sources
            .iter()
            .map(|(path, source)| transform_module(path, source, slot))
            .collect();

        let mut body = String::new();
        for module in &transformed {
            body.push_str(&format!("\n// === {} ===\n{}\n", module.path, module.code));
        }

        let hints = collect_hints(&imports, &transformed, &body);
        let code = format!("var {};\n{}{}", slot, resolution_code, body);

        Ok(Bundle {
            modules,
            imports,
            transformed,
            resolution_code,
            body,
            code,
            hints,
        })
    }
}

/// Bundle without a cache.
pub fn bundle_project(
    snapshot: &ProjectSnapshot,
    options: &PreviewOptions,
) -> Result<Bundle, BuildError> {
    Bundler::new(options).build(snapshot)
}

/// Strip module syntax from one file. Declarations survive as plain globals;
/// default exports are redirected into `slot`.
pub fn transform_module(path: &str, source: &str, slot: &str) -> TransformedModule {
    let code = IMPORT_STATEMENT_RE.replace_all(source, "");
    let code = EXPORT_LIST_RE.replace_all(&code, "");

    let mut default_functions = Vec::new();
    let code = EXPORT_DEFAULT_FUNCTION_RE.replace_all(&code, |caps: &regex::Captures| {
        default_functions.push(caps[1].to_string());
        format!("function {}", &caps[1])
    });

    let mut writes_default_expr = false;
    let code = EXPORT_DEFAULT_RE.replace_all(&code, |_: &regex::Captures| {
        writes_default_expr = true;
        format!("{} = ", slot)
    });

    let mut code = EXPORT_DECLARATION_RE
        .replace_all(&code, "${1}")
        .into_owned();

    // Declarations are hoisted, so the slot can be assigned after the body.
    for name in &default_functions {
        code.push_str(&format!("\n{} = {};", slot, name));
    }

    TransformedModule {
        path: path.to_string(),
        code,
        writes_shared_slot: writes_default_expr || !default_functions.is_empty(),
    }
}

fn emit_resolution_bindings(
    imports: &[ResolvedImport],
    modules: &HashMap<&str, &ModuleRecord>,
    options: &PreviewOptions,
) -> String {
    let placeholder = options.placeholder_literal.as_str();
    let mut out = String::new();

    for resolved in imports {
        let local = resolved.import.local_name.as_str();
        let target = match &resolved.resolution {
            Resolution::Resolved { path, .. } => Some((
                path.as_str(),
                modules.get(path.as_str()).and_then(|m| m.default_export()),
            )),
            Resolution::Unresolved => None,
        };

        match target {
            Some((path, Some(binding))) if binding == local => {
                out.push_str(&format!(
                    "// Import resolution for {}: {} is declared by {}\n",
                    resolved.importer, local, path
                ));
            }
            Some((path, Some(binding))) => {
                out.push_str(&format!(
                    "// Import resolution for {}: {} from {}\n",
                    resolved.importer, local, path
                ));
                let warning = js_string(&format!("Import {} from {} failed:", local, path));
                out.push_str(&format!(
                    "var {} = (function () {{ try {{ return {}; }} catch (e) {{ console.warn({}, e); return {}; }} }})();\n",
                    local, binding, warning, placeholder
                ));
            }
            Some((path, None)) => {
                out.push_str(&format!(
                    "// Import resolution for {}: {} has no default export\n",
                    resolved.importer, path
                ));
                out.push_str(&placeholder_binding(local, placeholder));
            }
            None => {
                out.push_str(&format!(
                    "// Import not found: {} from {}\n",
                    local, resolved.import.specifier
                ));
                out.push_str(&placeholder_binding(local, placeholder));
            }
        }
    }

    out
}

/// Runtime-provided globals (`React` from a UMD script) are left alone.
fn placeholder_binding(local: &str, placeholder: &str) -> String {
    format!(
        "var {0} = typeof {0} !== \"undefined\" ? {0} : {1};\n",
        local, placeholder
    )
}

fn collect_hints(
    imports: &[ResolvedImport],
    transformed: &[TransformedModule],
    body: &str,
) -> EntryHints {
    let defines_app = APP_DECLARATION_RE.is_match(body)
        || imports.iter().any(|i| i.import.local_name == "App");

    let shared_slot_writer = transformed
        .iter()
        .rev()
        .find(|m| m.writes_shared_slot)
        .map(|m| m.path.clone());

    let mut component_candidates: Vec<String> = Vec::new();
    for cap in COMPONENT_FUNCTION_RE.captures_iter(body) {
        let name = cap[1].to_string();
        if !component_candidates.contains(&name) {
            component_candidates.push(name);
        }
    }

    EntryHints {
        defines_app,
        shared_slot_writer,
        component_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOT: &str = "__defaultExport";

    #[test]
    fn test_strips_every_import_shape() {
        let src = "import React, { useState } from \"react\";\nimport {\n  a,\n  b\n} from './ab';\nimport * as ns from './ns'\nimport './side.css';\nimport Product from \"./Product\";\nconst x = 1;\n";
        let out = transform_module("App.js", src, SLOT);
        assert_eq!(out.code, "const x = 1;\n");
        assert!(!out.writes_shared_slot);
    }

    #[test]
    fn test_strips_imports_sharing_a_line() {
        let src = "import A from './a'; import B from './b';\nconst x = 1;\n";
        assert_eq!(crate::analyzer::analyze_module("m.js", src).imports.len(), 2);
        let out = transform_module("m.js", src, SLOT);
        assert_eq!(out.code, "const x = 1;\n");

        let out = transform_module("m.js", "\"use client\"; import A from './a';\nA();\n", SLOT);
        assert!(!out.code.contains("import"));
        assert!(out.code.starts_with("\"use client\"; "));

        let out = transform_module("m.js", "const a = 1; export { a };\n", SLOT);
        assert!(!out.code.contains("export"));
    }

    #[test]
    fn test_dynamic_import_is_kept() {
        let out = transform_module("a.js", "const m = import('./lazy');\n", SLOT);
        assert!(out.code.contains("import('./lazy')"));
    }

    #[test]
    fn test_default_function_keeps_declaration_and_writes_slot() {
        let out = transform_module("App.js", "export default function App() { return 1 }", SLOT);
        assert!(out.code.starts_with("function App() { return 1 }"));
        assert!(out.code.ends_with("__defaultExport = App;"));
        assert!(out.writes_shared_slot);
    }

    #[test]
    fn test_default_expression_binds_slot() {
        let out = transform_module("App.js", "const A = () => 1;\nexport default A;", SLOT);
        assert_eq!(out.code, "const A = () => 1;\n__defaultExport = A;");
        assert!(out.writes_shared_slot);
    }

    #[test]
    fn test_named_exports_lose_keyword() {
        let src = "export const a = 1;\nexport function b() {}\nexport async function c() {}\nexport class D {}\nexport { a, b };\nexport * from './x';";
        let out = transform_module("m.js", src, SLOT);
        assert!(!out.code.contains("export"));
        assert!(out.code.contains("const a = 1;"));
        assert!(out.code.contains("function b() {}"));
        assert!(out.code.contains("async function c() {}"));
        assert!(out.code.contains("class D {}"));
    }

    #[test]
    fn test_empty_project_is_rejected() {
        let snapshot = ProjectSnapshot::from_files([("index.html", "<div></div>"), ("a.js", "  ")]);
        let err = bundle_project(&snapshot, &PreviewOptions::default()).unwrap_err();
        assert_eq!(err, BuildError::NoScriptFiles);
        assert_eq!(err.to_string(), "No JavaScript/TypeScript files found");
    }

    #[test]
    fn test_resolution_bindings() {
        let snapshot = ProjectSnapshot::from_files([
            ("App.js", "import Product from './Product';\nimport Item from './Product';\nimport Gone from './missing';\nimport Util from './util';\nfunction App() {}\nexport default App;"),
            ("Product.js", "function Product() {}\nexport default Product;"),
            ("util.js", "export const helper = 1;"),
        ]);
        let bundle = bundle_project(&snapshot, &PreviewOptions::default()).unwrap();
        let code = &bundle.resolution_code;

        assert!(!code.contains("var Product ="));
        assert!(code.contains("var Item = (function () { try { return Product; } catch (e) { console.warn(\"Import Item from Product.js failed:\", e); return null; } })();"));
        assert!(code.contains("// Import not found: Gone from ./missing"));
        assert!(code.contains("var Gone = typeof Gone !== \"undefined\" ? Gone : null;"));
        assert!(code.contains("var Util = typeof Util !== \"undefined\" ? Util : null;"));
        assert_eq!(bundle.imports.len(), 4);
        assert_eq!(bundle.imports[2].resolution, Resolution::Unresolved);
    }

    #[test]
    fn test_code_layout_and_provenance() {
        let snapshot = ProjectSnapshot::from_files([
            ("a.js", "export const a = 1;"),
            ("notes.md", "ignored"),
            ("src/b.js", "export const b = 2;"),
        ]);
        let bundle = bundle_project(&snapshot, &PreviewOptions::default()).unwrap();
        assert!(bundle.code.starts_with("var __defaultExport;\n"));
        let a = bundle.body.find("// === a.js ===").unwrap();
        let b = bundle.body.find("// === src/b.js ===").unwrap();
        assert!(a < b);
        assert!(!bundle.body.contains("notes.md"));
        assert_eq!(bundle.modules.len(), 2);
    }

    #[test]
    fn test_hints() {
        let snapshot = ProjectSnapshot::from_files([
            ("Card.js", "function Card() {\n  function Inner() {}\n}\nexport default Card;"),
            ("App.js", "const App = () => null;\nfunction helper() {}\nfunction Layout() {}"),
        ]);
        let bundle = bundle_project(&snapshot, &PreviewOptions::default()).unwrap();
        assert!(bundle.hints.defines_app);
        assert_eq!(bundle.hints.shared_slot_writer.as_deref(), Some("Card.js"));
        assert_eq!(bundle.hints.component_candidates, vec!["Card", "Layout"]);
    }

    #[test]
    fn test_invalid_slot_option_fails_build() {
        let options = PreviewOptions {
            shared_default_slot: "1bad".into(),
            ..PreviewOptions::default()
        };
        let snapshot = ProjectSnapshot::from_files([("a.js", "x")]);
        assert!(matches!(
            bundle_project(&snapshot, &options),
            Err(BuildError::InvalidOption { .. })
        ));
    }
}
