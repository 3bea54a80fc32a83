use crate::analyzer::{analyze_module, ModuleRecord};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub struct CacheEntry {
    pub hash: String,
    pub record: ModuleRecord,
}

/// Per-file analysis results keyed by path and content hash.
///
/// Purely an optimization: a hit returns exactly what `analyze_module` would
/// have produced for the same (path, content).
#[derive(Default)]
pub struct ModuleCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, path: &str, source: &str) -> Option<&ModuleRecord> {
        let entry = self.entries.get(path)?;
        if entry.hash == Self::compute_hash(source) {
            Some(&entry.record)
        } else {
            None
        }
    }

    pub fn set(&mut self, path: &str, source: &str, record: ModuleRecord) {
        let hash = Self::compute_hash(source);
        self.entries
            .insert(path.to_string(), CacheEntry { hash, record });
    }

    pub fn analyze(&mut self, path: &str, source: &str) -> ModuleRecord {
        if let Some(record) = self.get(path, source) {
            let record = record.clone();
            self.hits += 1;
            return record;
        }
        self.misses += 1;
        let record = analyze_module(path, source);
        self.set(path, source, record.clone());
        record
    }

    /// Drop entries whose path is no longer in the project.
    pub fn retain_paths<'a, I>(&mut self, live: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.entries.retain(|path, _| live.contains(path.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
