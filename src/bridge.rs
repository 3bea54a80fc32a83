//! JavaScript host entry points.

use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::document::{build_preview, EntryPoint};
use crate::options::PreviewOptions;
use crate::tree::build_tree;
use crate::vfs::ProjectSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[napi(object)]
pub struct NativePreview {
    /// Generated document, `None` when the build failed.
    pub html: Option<String>,
    pub bundle_code: Option<String>,
    pub entry_kind: Option<String>,
    pub entry_name: Option<String>,
    pub diagnostic: Option<String>,
}

fn entry_parts(entry: &EntryPoint) -> (String, Option<String>) {
    match entry {
        EntryPoint::Named(name) => ("named".into(), Some(name.clone())),
        EntryPoint::SharedSlot(path) => ("sharedSlot".into(), Some(path.clone())),
        EntryPoint::Heuristic(name) => ("heuristic".into(), Some(name.clone())),
        EntryPoint::None => ("none".into(), None),
    }
}

/// Build a preview from a serialized project snapshot. Build failures are
/// reported through `diagnostic`; malformed input is a thrown error.
#[napi]
pub fn build_preview_native(
    snapshot_json: serde_json::Value,
    options_json: Option<serde_json::Value>,
) -> napi::Result<NativePreview> {
    let mut snapshot: ProjectSnapshot = serde_json::from_value(snapshot_json)
        .map_err(|e| napi::Error::from_reason(format!("Snapshot parse error: {}", e)))?;
    snapshot.normalize();
    let options: PreviewOptions = match options_json {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(format!("Options parse error: {}", e)))?,
        None => PreviewOptions::default(),
    };

    Ok(match build_preview(&snapshot, &options) {
        Ok(build) => {
            let (kind, name) = entry_parts(&build.document.entry);
            NativePreview {
                html: Some(build.document.html),
                bundle_code: Some(build.bundle.code),
                entry_kind: Some(kind),
                entry_name: name,
                diagnostic: None,
            }
        }
        Err(err) => NativePreview {
            html: None,
            bundle_code: None,
            entry_kind: None,
            entry_name: None,
            diagnostic: Some(err.to_string()),
        },
    })
}

#[napi]
pub fn build_tree_native(paths: Vec<String>) -> napi::Result<serde_json::Value> {
    let tree = build_tree(paths.iter().map(String::as_str));
    serde_json::to_value(tree).map_err(|e| napi::Error::from_reason(e.to_string()))
}
