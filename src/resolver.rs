//! Import specifier resolution against the flat store.
//!
//! Only `./`-relative specifiers are looked up. The candidate order is fixed:
//! the bare path, then `.js`, `.jsx`, `.ts`, `.tsx`. The first candidate that
//! names a store key wins; several existing candidates are not reported as
//! ambiguous, the losers are only logged. Misses never fail the build.

use serde::{Deserialize, Serialize};

use crate::analyzer::ImportBinding;
use crate::options::SCRIPT_EXTENSIONS;
use crate::vfs::ProjectSnapshot;

const RELATIVE_PREFIX: &str = "./";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Resolution {
    Resolved {
        path: String,
        /// Other candidates that also exist but lost to `path`.
        shadowed: Vec<String>,
    },
    Unresolved,
}

impl Resolution {
    pub fn path(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { path, .. } => Some(path.as_str()),
            Resolution::Unresolved => None,
        }
    }
}

/// Directory of `path`: everything before the last separator, or empty.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Lookup candidates for `specifier` imported from `importer`, in order.
/// Empty for non-relative specifiers.
pub fn candidate_paths(importer: &str, specifier: &str) -> Vec<String> {
    let Some(rest) = specifier.strip_prefix(RELATIVE_PREFIX) else {
        return Vec::new();
    };
    let dir = parent_dir(importer);
    let base = if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", dir, rest)
    };

    let mut candidates = Vec::with_capacity(SCRIPT_EXTENSIONS.len() + 1);
    candidates.push(base.clone());
    for ext in SCRIPT_EXTENSIONS {
        candidates.push(format!("{}.{}", base, ext));
    }
    candidates
}

pub fn resolve_specifier(snapshot: &ProjectSnapshot, importer: &str, specifier: &str) -> Resolution {
    let mut hits = candidate_paths(importer, specifier)
        .into_iter()
        .filter(|c| snapshot.contains(c));

    match hits.next() {
        Some(path) => {
            let shadowed: Vec<String> = hits.collect();
            if !shadowed.is_empty() {
                tracing::debug!(
                    importer,
                    specifier,
                    resolved = %path,
                    ?shadowed,
                    "specifier matches several files; first candidate wins"
                );
            }
            Resolution::Resolved { path, shadowed }
        }
        None => {
            tracing::debug!(importer, specifier, "import left unresolved");
            Resolution::Unresolved
        }
    }
}

/// One import of one module, together with where it landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImport {
    pub importer: String,
    pub import: ImportBinding,
    pub resolution: Resolution,
}
