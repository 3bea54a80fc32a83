//! # Preview Document Assembly
//!
//! Turns a [`Bundle`] into one self-contained HTML document:
//!
//! 1. the entry markup (`index.html` or the fallback root element),
//! 2. an error reporter installed before anything else runs,
//! 3. the runtime scripts (React, ReactDOM, Babel),
//! 4. one bundle script: runtime prelude, slot declaration, resolution
//!    bindings, module bodies and the entry epilogue.
//!
//! ## Entry Detection
//!
//! Evaluated in order, first hit wins:
//!
//! 1. a global binding named `App`,
//! 2. the shared default-export slot, if assigned,
//! 3. the first uppercase top-level function that is a global function at
//!    runtime.
//!
//! Without a hit a static "no component found" notice is rendered. Exceptions
//! thrown during detection or rendering are caught by the epilogue and shown
//! inline in the output root. [`detect_entry`] applies the same list at build
//! time from [`EntryHints`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bundle::{Bundle, Bundler, EntryHints};
use crate::cache::ModuleCache;
use crate::error::BuildError;
use crate::options::PreviewOptions;
use crate::vfs::ProjectSnapshot;

lazy_static! {
    static ref SCRIPT_CLOSE_RE: Regex = Regex::new(r"(?i)</script").unwrap();
}

/// Global function the generated scripts use to show messages in the root.
const REPORTER: &str = "__previewReport";

pub const NO_COMPONENT_MESSAGE: &str =
    "No React component found. Make sure you have a default export.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum EntryPoint {
    /// The global `App` binding.
    Named(String),
    /// The shared slot, last written by the named module.
    SharedSlot(String),
    /// First uppercase function declaration.
    Heuristic(String),
    None,
}

pub fn detect_entry(hints: &EntryHints) -> EntryPoint {
    if hints.defines_app {
        return EntryPoint::Named("App".to_string());
    }
    if let Some(writer) = &hints.shared_slot_writer {
        return EntryPoint::SharedSlot(writer.clone());
    }
    match hints.component_candidates.first() {
        Some(name) => EntryPoint::Heuristic(name.clone()),
        None => EntryPoint::None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub html: String,
    pub entry: EntryPoint,
}

/// Result of one full rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBuild {
    pub bundle: Bundle,
    pub document: PreviewDocument,
}

pub fn build_preview(
    snapshot: &ProjectSnapshot,
    options: &PreviewOptions,
) -> Result<PreviewBuild, BuildError> {
    build_preview_with(snapshot, options, None)
}

pub fn build_preview_with(
    snapshot: &ProjectSnapshot,
    options: &PreviewOptions,
    cache: Option<&mut ModuleCache>,
) -> Result<PreviewBuild, BuildError> {
    let bundler = match cache {
        Some(cache) => Bundler::new(options).with_cache(cache),
        None => Bundler::new(options),
    };
    let bundle = bundler.build(snapshot)?;
    let markup = snapshot.entry_markup(&options.fallback_entry_markup);
    let document = generate_document(&bundle, markup, options);
    Ok(PreviewBuild { bundle, document })
}

pub fn generate_document(
    bundle: &Bundle,
    entry_markup: &str,
    options: &PreviewOptions,
) -> PreviewDocument {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "  <title>{}</title>\n",
        escape_html(&options.document_title)
    ));
    html.push_str(
        "  <style>\n    body { font-family: system-ui, -apple-system, sans-serif; margin: 0; padding: 16px; background: #f5f5f5; color: #333; }\n",
    );
    html.push_str(&format!(
        "    #{} {{ min-height: 100vh; }}\n  </style>\n</head>\n<body>\n",
        options.root_element_id
    ));

    html.push_str(entry_markup);
    html.push('\n');

    html.push_str("<script>\n");
    html.push_str(&reporter_script(options));
    html.push_str("</script>\n");

    for src in &options.runtime_scripts {
        html.push_str(&format!(
            "<script crossorigin src=\"{}\"></script>\n",
            escape_html(src)
        ));
    }

    html.push_str(&bundle_script_open(options));
    html.push_str(&escape_script(&options.runtime_prelude));
    html.push('\n');
    html.push_str(&escape_script(&bundle.code));
    html.push('\n');
    html.push_str(&epilogue_script(&bundle.hints, options));
    html.push_str("</script>\n</body>\n</html>\n");

    PreviewDocument {
        html,
        entry: detect_entry(&bundle.hints),
    }
}

fn bundle_script_open(options: &PreviewOptions) -> String {
    let mut tag = String::from("<script");
    if !options.bundle_script_type.is_empty() {
        tag.push_str(&format!(" type=\"{}\"", escape_html(&options.bundle_script_type)));
    }
    if !options.bundle_presets.is_empty() {
        tag.push_str(&format!(
            " data-presets=\"{}\"",
            escape_html(&options.bundle_presets)
        ));
    }
    tag.push_str(">\n");
    tag
}

/// Installs the inline reporter and routes uncaught errors through it.
fn reporter_script(options: &PreviewOptions) -> String {
    let root_id = js_string(&options.root_element_id);
    format!(
        r#"window.{reporter} = function (message, color) {{
  var root = document.getElementById({root_id}) || document.body;
  var box = document.createElement("div");
  box.style.padding = "20px";
  box.style.color = color;
  box.textContent = message;
  root.innerHTML = "";
  root.appendChild(box);
}};
window.addEventListener("error", function (event) {{
  var message = event.error && event.error.message ? event.error.message : event.message;
  window.{reporter}("Error: " + message, "red");
}});
"#,
        reporter = REPORTER,
        root_id = root_id,
    )
}

fn epilogue_script(hints: &EntryHints, options: &PreviewOptions) -> String {
    let candidates =
        serde_json::to_string(&hints.component_candidates).unwrap_or_else(|_| "[]".to_string());
    format!(
        r##"
(function () {{
  try {{
    var Entry = null;
    if (typeof App !== "undefined") {{
      Entry = App;
    }} else if (typeof {slot} !== "undefined") {{
      Entry = {slot};
    }} else {{
      var candidates = {candidates};
      for (var i = 0; i < candidates.length; i++) {{
        if (typeof window[candidates[i]] === "function") {{
          Entry = window[candidates[i]];
          break;
        }}
      }}
    }}
    if (typeof Entry === "function") {{
      var root = document.getElementById({root_id}) || document.body;
      ReactDOM.createRoot(root).render(React.createElement(Entry));
    }} else {{
      window.{reporter}({no_component}, "#666");
    }}
  }} catch (error) {{
    window.{reporter}("Error: " + (error && error.message ? error.message : String(error)), "red");
  }}
}})();
"##,
        slot = options.shared_default_slot,
        candidates = candidates,
        root_id = js_string(&options.root_element_id),
        reporter = REPORTER,
        no_component = js_string(NO_COMPONENT_MESSAGE),
    )
}

pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Keep user code from closing the surrounding script element.
fn escape_script(code: &str) -> String {
    SCRIPT_CLOSE_RE.replace_all(code, "<\\/script").into_owned()
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(app: bool, writer: Option<&str>, candidates: &[&str]) -> EntryHints {
        EntryHints {
            defines_app: app,
            shared_slot_writer: writer.map(str::to_string),
            component_candidates: candidates.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_detect_entry_order() {
        assert_eq!(
            detect_entry(&hints(true, Some("a.js"), &["Card"])),
            EntryPoint::Named("App".into())
        );
        assert_eq!(
            detect_entry(&hints(false, Some("a.js"), &["Card"])),
            EntryPoint::SharedSlot("a.js".into())
        );
        assert_eq!(
            detect_entry(&hints(false, None, &["Card", "Layout"])),
            EntryPoint::Heuristic("Card".into())
        );
        assert_eq!(detect_entry(&hints(false, None, &[])), EntryPoint::None);
    }

    #[test]
    fn test_document_sections_in_order() {
        let snapshot = ProjectSnapshot::from_files([("App.js", "function App() { return null }")]);
        let build = build_preview(&snapshot, &PreviewOptions::default()).unwrap();
        let html = &build.document.html;

        let markup = html.find(r#"<div id="root"></div>"#).unwrap();
        let reporter = html.find("window.__previewReport = function").unwrap();
        let react = html.find("react.development.js").unwrap();
        let bundle = html.find("<script type=\"text/babel\" data-presets=\"react\">").unwrap();
        let prelude = html.find("const { useState, useEffect, useRef, useMemo } = React;").unwrap();
        let body = html.find("// === App.js ===").unwrap();
        let epilogue = html.find("if (typeof App !== \"undefined\")").unwrap();
        assert!(markup < reporter && reporter < react && react < bundle);
        assert!(bundle < prelude && prelude < body && body < epilogue);
        assert_eq!(build.document.entry, EntryPoint::Named("App".into()));
    }

    #[test]
    fn test_epilogue_checks_app_before_slot_before_candidates() {
        let snapshot = ProjectSnapshot::from_files([(
            "Card.js",
            "function Card() {}\nfunction Badge() {}\nexport default Card;",
        )]);
        let html = build_preview(&snapshot, &PreviewOptions::default())
            .unwrap()
            .document
            .html;
        let app = html.find("typeof App !== \"undefined\"").unwrap();
        let slot = html.find("typeof __defaultExport !== \"undefined\"").unwrap();
        let scan = html.find(r#"var candidates = ["Card","Badge"];"#).unwrap();
        assert!(app < slot && slot < scan);
        assert!(html.contains(NO_COMPONENT_MESSAGE));
        assert!(html.contains("} catch (error) {"));
    }

    #[test]
    fn test_entry_document_and_fallback() {
        let mut snapshot = ProjectSnapshot::from_files([("a.js", "function Foo() {}")]);
        let html = build_preview(&snapshot, &PreviewOptions::default())
            .unwrap()
            .document
            .html;
        assert!(html.contains(r#"<div id="root"></div>"#));

        snapshot.files.insert(
            "index.html".into(),
            crate::vfs::FileEntry::new("index.html", "<section id=\"root\">hi</section>"),
        );
        let html = build_preview(&snapshot, &PreviewOptions::default())
            .unwrap()
            .document
            .html;
        assert!(html.contains("<section id=\"root\">hi</section>"));
        assert!(!html.contains(r#"<div id="root"></div>"#));
    }

    #[test]
    fn test_script_close_tags_are_escaped() {
        let snapshot =
            ProjectSnapshot::from_files([("a.js", "const s = \"</script><b>x</b>\";")]);
        let html = build_preview(&snapshot, &PreviewOptions::default())
            .unwrap()
            .document
            .html;
        assert!(html.contains(r#"const s = "<\/script><b>x</b>";"#));
        assert_eq!(html.matches("</script>").count(), 5);
    }

    #[test]
    fn test_prelude_cannot_close_the_bundle_script() {
        let options = PreviewOptions {
            runtime_prelude: "var p = \"</script>\";".into(),
            ..PreviewOptions::default()
        };
        let snapshot = ProjectSnapshot::from_files([("a.js", "function Foo() {}")]);
        let html = build_preview(&snapshot, &options).unwrap().document.html;
        assert!(html.contains(r#"var p = "<\/script>";"#));
        assert_eq!(html.matches("</script>").count(), 5);
    }

    #[test]
    fn test_plain_script_without_presets() {
        let options = PreviewOptions {
            bundle_script_type: String::new(),
            bundle_presets: String::new(),
            runtime_scripts: vec![],
            ..PreviewOptions::default()
        };
        let snapshot = ProjectSnapshot::from_files([("a.js", "function Foo() {}")]);
        let html = build_preview(&snapshot, &options).unwrap().document.html;
        assert!(html.contains("<script>\nconst { useState"));
        assert!(!html.contains("crossorigin"));
    }

    #[test]
    fn test_title_is_escaped() {
        let options = PreviewOptions {
            document_title: "<Demo & Co>".into(),
            ..PreviewOptions::default()
        };
        let snapshot = ProjectSnapshot::from_files([("a.js", "x")]);
        let html = build_preview(&snapshot, &options).unwrap().document.html;
        assert!(html.contains("<title>&lt;Demo &amp; Co&gt;</title>"));
    }
}
