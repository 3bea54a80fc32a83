//! Module analysis by pattern matching.
//!
//! This is not a parser. A fixed set of textual shapes is recognized:
//!
//! | Shape                                   | Recorded as                        |
//! |-----------------------------------------|------------------------------------|
//! | `export default X`                      | export `default` -> `X`            |
//! | `export default function X`             | export `default` -> `X`            |
//! | `export function\|const\|let\|var X`     | export `X` -> `X` (every match)    |
//! | `import X from "./m"`                   | import `X` from `./m` (every match) |
//!
//! Anything else (named or namespace imports, side-effect imports, export
//! lists, anonymous defaults) contributes nothing. That is an omission, not an
//! error.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::options::SCRIPT_EXTENSIONS;
use crate::vfs::FileEntry;

lazy_static! {
    static ref DEFAULT_EXPORT_RE: Regex =
        Regex::new(r"export\s+default\s+(?:function\s+)?([A-Za-z_$][A-Za-z0-9_$]*)").unwrap();
    static ref NAMED_EXPORT_RE: Regex =
        Regex::new(r"export\s+(?:function|const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap();
    static ref DEFAULT_IMPORT_RE: Regex = Regex::new(
        r#"import\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+from\s+['"]([^'"]+)['"]"#
    )
    .unwrap();
}

pub const DEFAULT_EXPORT_NAME: &str = "default";

/// Words that can follow `export default` without naming a binding.
const NON_BINDING_WORDS: &[&str] = &[
    "async", "await", "class", "false", "function", "new", "null", "this", "true", "typeof",
    "void",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBinding {
    pub exported_name: String,
    pub local_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    pub local_name: String,
    pub specifier: String,
}

/// Export/import facts of one file. Recomputed every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub path: String,
    pub exports: Vec<ExportBinding>,
    pub imports: Vec<ImportBinding>,
}

impl ModuleRecord {
    /// Binding name behind `export default`, if one was recognized.
    pub fn default_export(&self) -> Option<&str> {
        self.exports
            .iter()
            .find(|e| e.exported_name == DEFAULT_EXPORT_NAME)
            .map(|e| e.local_name.as_str())
    }
}

pub fn has_script_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !stem.ends_with('/') => {
            SCRIPT_EXTENSIONS.contains(&ext)
        }
        _ => false,
    }
}

/// Only script files with non-blank content take part in a build.
pub fn is_analyzable(entry: &FileEntry) -> bool {
    has_script_extension(&entry.path) && !entry.content.trim().is_empty()
}

pub fn analyze_module(path: &str, source: &str) -> ModuleRecord {
    let mut exports = Vec::new();

    if let Some(cap) = DEFAULT_EXPORT_RE.captures(source) {
        if !NON_BINDING_WORDS.contains(&&cap[1]) {
            exports.push(ExportBinding {
                exported_name: DEFAULT_EXPORT_NAME.to_string(),
                local_name: cap[1].to_string(),
            });
        }
    }

    for cap in NAMED_EXPORT_RE.captures_iter(source) {
        exports.push(ExportBinding {
            exported_name: cap[1].to_string(),
            local_name: cap[1].to_string(),
        });
    }

    let imports = DEFAULT_IMPORT_RE
        .captures_iter(source)
        .map(|cap| ImportBinding {
            local_name: cap[1].to_string(),
            specifier: cap[2].to_string(),
        })
        .collect();

    ModuleRecord {
        path: path.to_string(),
        exports,
        imports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_identifier() {
        let record = analyze_module("App.js", "function App() {}\nexport default App;");
        assert_eq!(record.default_export(), Some("App"));
        assert_eq!(record.exports.len(), 1);
    }

    #[test]
    fn test_default_export_function() {
        let record = analyze_module("App.js", "export default function Main() { return null }");
        assert_eq!(record.default_export(), Some("Main"));
    }

    #[test]
    fn test_anonymous_default_is_omitted() {
        let record = analyze_module("App.js", "export default () => null;");
        assert_eq!(record.default_export(), None);
        let record = analyze_module("App.js", "export default class Main {}");
        assert_eq!(record.default_export(), None);
        let record = analyze_module("App.js", "export default function () {}");
        assert_eq!(record.default_export(), None);
    }

    #[test]
    fn test_named_exports_match_repeatedly() {
        let src = "export const a = 1;\nexport let b = 2;\nexport var c;\nexport function d() {}";
        let record = analyze_module("m.ts", src);
        let names: Vec<_> = record.exports.iter().map(|e| e.exported_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(record.exports.iter().all(|e| e.exported_name == e.local_name));
    }

    #[test]
    fn test_only_default_imports_are_recognized() {
        let src = r#"
            import React, { useState } from "react";
            import Product from "./Product";
            import { Header } from './Header';
            import * as utils from "./utils";
            import "./styles.css";
            import Card from './ui/Card'
        "#;
        let record = analyze_module("App.js", src);
        let imports: Vec<_> = record
            .imports
            .iter()
            .map(|i| (i.local_name.as_str(), i.specifier.as_str()))
            .collect();
        assert_eq!(imports, vec![("Product", "./Product"), ("Card", "./ui/Card")]);
    }

    #[test]
    fn test_analyzable_files() {
        assert!(is_analyzable(&FileEntry::new("src/App.tsx", "x")));
        assert!(!is_analyzable(&FileEntry::new("src/App.tsx", "  \n")));
        assert!(!is_analyzable(&FileEntry::new("index.html", "<div/>")));
        assert!(!is_analyzable(&FileEntry::new("src/.folder", "")));
        assert!(!is_analyzable(&FileEntry::new("src/.js", "x")));
        assert!(!is_analyzable(&FileEntry::new("notes.json", "{}")));
    }
}
