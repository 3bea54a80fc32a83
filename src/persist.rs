//! Project persistence collaborators and on-disk import/export.
//!
//! The payload is the serialized [`ProjectSnapshot`]:
//! `{ "files": { path: { path, content } }, "activePath", "entryDocumentPath" }`
//! with key order preserved.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StoreError;
use crate::vfs::{marker_directory, FileEntry, ProjectSnapshot, FOLDER_MARKER};

pub trait ProjectStore {
    fn load(&self, id: &str) -> Result<ProjectSnapshot, StoreError>;
    fn save(&mut self, id: &str, snapshot: &ProjectSnapshot) -> Result<(), StoreError>;
}

/// Parse a stored payload, repairing what the loader is allowed to repair.
pub fn snapshot_from_json(id: &str, raw: &str) -> Result<ProjectSnapshot, StoreError> {
    let mut snapshot: ProjectSnapshot =
        serde_json::from_str(raw).map_err(|source| StoreError::Format {
            id: id.to_string(),
            source,
        })?;
    snapshot.normalize();
    if snapshot.active_path.is_empty() {
        snapshot.active_path = snapshot.first_file_path().unwrap_or_default();
    }
    Ok(snapshot)
}

/// Load `id`, falling back to the starter project when it is missing or
/// unreadable.
pub fn load_or_starter(store: &dyn ProjectStore, id: &str) -> ProjectSnapshot {
    match store.load(id) {
        Ok(snapshot) => snapshot,
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(id, "no saved project, using starter");
            ProjectSnapshot::starter()
        }
        Err(err) => {
            tracing::warn!(id, error = %err, "failed to load project, using starter");
            ProjectSnapshot::starter()
        }
    }
}

/// In-memory store keyed by project id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Store a raw payload as-is.
    pub fn insert_raw(&mut self, id: &str, raw: impl Into<String>) {
        self.projects.insert(id.to_string(), raw.into());
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self, id: &str) -> Result<ProjectSnapshot, StoreError> {
        let raw = self
            .projects
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        snapshot_from_json(id, raw)
    }

    fn save(&mut self, id: &str, snapshot: &ProjectSnapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot).map_err(|source| StoreError::Format {
            id: id.to_string(),
            source,
        })?;
        self.projects.insert(id.to_string(), raw);
        Ok(())
    }
}

/// One JSON document per project under `root`: `<root>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.trim().is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

impl ProjectStore for DirectoryStore {
    fn load(&self, id: &str) -> Result<ProjectSnapshot, StoreError> {
        let path = self.document_path(id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        snapshot_from_json(id, &raw)
    }

    fn save(&mut self, id: &str, snapshot: &ProjectSnapshot) -> Result<(), StoreError> {
        let path = self.document_path(id)?;
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let raw = serde_json::to_string_pretty(snapshot).map_err(|source| StoreError::Format {
            id: id.to_string(),
            source,
        })?;
        fs::write(&path, raw).map_err(|source| StoreError::Io { path, source })
    }
}

/// `/`-joined key of `path` relative to `root`, `None` if not valid UTF-8.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a directory tree into a snapshot. Entries are name-sorted; empty
/// directories become folder markers; files that are not UTF-8 are skipped.
pub fn import_directory(root: &Path) -> Result<ProjectSnapshot, StoreError> {
    let mut snapshot = ProjectSnapshot::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            StoreError::Io {
                path,
                source: io::Error::from(err),
            }
        })?;

        let Some(key) = relative_key(root, entry.path()) else {
            tracing::warn!(path = ?entry.path(), "skipping non UTF-8 path");
            continue;
        };

        if entry.file_type().is_dir() {
            let mut children = fs::read_dir(entry.path()).map_err(|e| io_error(entry.path(), e))?;
            if children.next().is_none() {
                let marker = format!("{}/{}", key, FOLDER_MARKER);
                snapshot
                    .files
                    .insert(marker.clone(), FileEntry::new(marker, ""));
            }
        } else if entry.file_type().is_file() {
            match fs::read(entry.path()) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(content) => {
                        snapshot
                            .files
                            .insert(key.clone(), FileEntry::new(key, content));
                    }
                    Err(_) => tracing::warn!(path = %key, "skipping non UTF-8 file"),
                },
                Err(err) => tracing::warn!(path = %key, error = %err, "skipping unreadable file"),
            }
        }
    }

    snapshot.active_path = snapshot.first_file_path().unwrap_or_default();
    tracing::debug!(root = ?root, files = snapshot.len(), "imported directory");
    Ok(snapshot)
}

fn is_contained(key: &str) -> bool {
    Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// Write every entry below `root`. Markers become (possibly empty)
/// directories. Keys that would escape `root` are skipped.
pub fn export_directory(snapshot: &ProjectSnapshot, root: &Path) -> Result<(), StoreError> {
    for entry in snapshot.entries() {
        if !is_contained(&entry.path) {
            tracing::warn!(path = %entry.path, "skipping path outside export root");
            continue;
        }
        if let Some(dir) = marker_directory(&entry.path) {
            let target = root.join(dir);
            fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
            continue;
        }
        let target = root.join(&entry.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&target, &entry.content).map_err(|e| io_error(&target, e))?;
    }
    Ok(())
}
