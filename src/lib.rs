//! # Playground Preview Core
//!
//! Turns a virtual, in-memory project into a live preview:
//!
//! ```text
//! VirtualFileSystem -> TreeBuilder            (navigation view)
//!                   -> ModuleAnalyzer -> ModuleResolver -> Bundler
//!                   -> preview document -> SandboxRunner (isolated surface)
//! ```
//!
//! ## Pipeline Invariants
//!
//! 1. **Flat Store**: paths are unique keys in insertion order. Directories
//!    are implicit prefixes or explicit `"<dir>/.folder"` markers.
//!
//! 2. **Full Rebuilds**: every change re-runs the whole pipeline on a fresh
//!    snapshot. A build is deterministic for a given snapshot and options.
//!
//! 3. **Fail Open**: an import that resolves nowhere becomes a placeholder
//!    binding. The only build-level failure is a project without analyzable
//!    script files.
//!
//! 4. **One Shared Slot**: every default export writes the same global slot;
//!    the last writer in store order wins.
//!
//! 5. **Entry Order**: global `App`, then the shared slot, then the first
//!    uppercase top-level function, else a static notice.
//!
//! 6. **Handle Lifecycle**: the runner keeps one live preview handle and
//!    releases the previous one once the next is installed.

#[cfg(feature = "napi")]
mod bridge;

mod analyzer;
mod bundle;
mod cache;
mod document;
mod error;
mod options;
mod persist;
mod resolver;
mod sandbox;
mod session;
mod starter;
mod tree;
mod vfs;


#[cfg(feature = "napi")]
pub use bridge::{build_preview_native, build_tree_native, NativePreview};

pub use analyzer::{
    analyze_module, has_script_extension, is_analyzable, ExportBinding, ImportBinding,
    ModuleRecord, DEFAULT_EXPORT_NAME,
};
pub use bundle::{bundle_project, transform_module, Bundle, Bundler, EntryHints, TransformedModule};
pub use cache::ModuleCache;
pub use document::{
    build_preview, build_preview_with, detect_entry, generate_document, EntryPoint,
    PreviewBuild, PreviewDocument, NO_COMPONENT_MESSAGE,
};
pub use error::{BuildError, StoreError};
pub use options::{is_identifier, PreviewOptions, SCRIPT_EXTENSIONS};
pub use persist::{
    export_directory, import_directory, load_or_starter, snapshot_from_json, DirectoryStore,
    MemoryStore, ProjectStore,
};
pub use resolver::{candidate_paths, parent_dir, resolve_specifier, Resolution, ResolvedImport};
pub use sandbox::{MemoryHost, PreviewHost, ResourceHandle, SandboxRunner};
pub use session::PreviewSession;
pub use tree::{build_tree, TreeNode};
pub use vfs::{
    is_folder_marker, marker_directory, FileEntry, ProjectSnapshot, VirtualFileSystem,
    DEFAULT_ENTRY_DOCUMENT, FOLDER_MARKER,
};
