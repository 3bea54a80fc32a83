//! Virtual filesystem: a flat, insertion-ordered store of path-keyed text files.
//!
//! There are no directory entries. A directory exists implicitly as a proper
//! prefix of some file path, or explicitly through a marker entry
//! `"<dir>/.folder"` with empty content, which is how empty folders survive.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Last path segment of a folder marker entry.
pub const FOLDER_MARKER: &str = ".folder";

pub const DEFAULT_ENTRY_DOCUMENT: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// True if the last segment of `path` is the folder marker.
pub fn is_folder_marker(path: &str) -> bool {
    path.rsplit('/').next() == Some(FOLDER_MARKER)
}

/// Directory represented by a marker entry, e.g. `"src/ui/.folder"` -> `"src/ui"`.
pub fn marker_directory(path: &str) -> Option<&str> {
    if !is_folder_marker(path) {
        return None;
    }
    let dir = path[..path.len() - FOLDER_MARKER.len()].trim_end_matches('/');
    if dir.is_empty() {
        None
    } else {
        Some(dir)
    }
}

fn default_entry_document_path() -> String {
    DEFAULT_ENTRY_DOCUMENT.to_string()
}

/// The full project at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub files: IndexMap<String, FileEntry>,
    #[serde(default)]
    pub active_path: String,
    #[serde(default = "default_entry_document_path")]
    pub entry_document_path: String,
}

impl ProjectSnapshot {
    pub fn new() -> Self {
        Self {
            files: IndexMap::new(),
            active_path: String::new(),
            entry_document_path: default_entry_document_path(),
        }
    }

    /// Build a snapshot from `(path, content)` pairs, keeping their order.
    pub fn from_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut snapshot = Self::new();
        for (path, content) in files {
            let path = path.into();
            snapshot
                .files
                .insert(path.clone(), FileEntry::new(path, content));
        }
        snapshot.active_path = snapshot.first_file_path().unwrap_or_default();
        snapshot
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Markup of the entry document, or `fallback` when it is absent or empty.
    pub fn entry_markup<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.files.get(&self.entry_document_path) {
            Some(entry) if !entry.content.is_empty() => &entry.content,
            _ => fallback,
        }
    }

    /// First non-marker key in store order.
    pub fn first_file_path(&self) -> Option<String> {
        self.paths()
            .find(|p| !is_folder_marker(p))
            .map(str::to_string)
    }

    /// Force every entry's `path` to agree with its key. Loaded payloads are
    /// keyed by path and the inner copy is not trusted.
    pub fn normalize(&mut self) {
        for (key, entry) in self.files.iter_mut() {
            if entry.path != *key {
                entry.path = key.clone();
            }
        }
        if self.entry_document_path.is_empty() {
            self.entry_document_path = default_entry_document_path();
        }
    }
}

/// Mutable owner of a [`ProjectSnapshot`].
///
/// Every operation is total: touching a missing key is a no-op. The return
/// values report whether the store changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileSystem {
    snapshot: ProjectSnapshot,
}

impl From<ProjectSnapshot> for VirtualFileSystem {
    fn from(snapshot: ProjectSnapshot) -> Self {
        Self { snapshot }
    }
}

impl VirtualFileSystem {
    pub fn new() -> Self {
        Self::from(ProjectSnapshot::new())
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> ProjectSnapshot {
        self.snapshot
    }

    pub fn active_path(&self) -> &str {
        &self.snapshot.active_path
    }

    pub fn set_active_path(&mut self, path: impl Into<String>) {
        self.snapshot.active_path = path.into();
    }

    pub fn set_entry_document_path(&mut self, path: impl Into<String>) {
        self.snapshot.entry_document_path = path.into();
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.snapshot.get(path)
    }

    /// Insert or overwrite. With `content == None` an existing entry keeps its
    /// content and a new one starts empty. Overwrites keep the key's position.
    pub fn upsert(&mut self, path: &str, content: Option<&str>) {
        let content = match content {
            Some(c) => c.to_string(),
            None => self
                .snapshot
                .files
                .get(path)
                .map(|e| e.content.clone())
                .unwrap_or_default(),
        };
        self.snapshot
            .files
            .insert(path.to_string(), FileEntry::new(path, content));
    }

    /// Create an empty file unless the path is blank or already taken.
    pub fn create_file(&mut self, path: &str) -> bool {
        if path.trim().is_empty() || self.snapshot.contains(path) {
            return false;
        }
        self.upsert(path, Some(""));
        true
    }

    /// Create an explicit (possibly empty) folder through its marker entry.
    pub fn create_folder(&mut self, path: &str) -> bool {
        let dir = path.trim().trim_end_matches('/');
        if dir.is_empty() {
            return false;
        }
        let marker = format!("{}/{}", dir, FOLDER_MARKER);
        if self.snapshot.contains(&marker) {
            return false;
        }
        self.upsert(&marker, Some(""));
        true
    }

    pub fn delete(&mut self, path: &str) -> bool {
        if self.snapshot.files.shift_remove(path).is_none() {
            return false;
        }
        if self.snapshot.active_path == path {
            self.reset_active_path();
        }
        true
    }

    /// Remove every entry under `path/`, its marker included. Returns the
    /// number of removed entries.
    pub fn delete_folder(&mut self, path: &str) -> usize {
        let prefix = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        let before = self.snapshot.files.len();
        self.snapshot.files.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - self.snapshot.files.len();
        if removed > 0 && self.snapshot.active_path.starts_with(&prefix) {
            self.reset_active_path();
        }
        removed
    }

    /// Move `old_path` to `new_path`. Returns false if `old_path` is absent.
    /// An existing `new_path` is overwritten; last write wins.
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> bool {
        if old_path == new_path {
            return self.snapshot.contains(old_path);
        }
        let Some(entry) = self.snapshot.files.shift_remove(old_path) else {
            return false;
        };
        self.snapshot.files.insert(
            new_path.to_string(),
            FileEntry::new(new_path, entry.content),
        );
        if self.snapshot.active_path == old_path {
            self.snapshot.active_path = new_path.to_string();
        }
        true
    }

    fn reset_active_path(&mut self) {
        self.snapshot.active_path = self.snapshot.first_file_path().unwrap_or_default();
    }
}
