//! Runs generated documents on an isolated preview surface.
//!
//! The surface itself (an iframe, a webview) belongs to the host. The runner
//! owns the lifecycle of the resource handles it loads: one live handle at a
//! time, the previous one released right after the next is installed, the
//! last one released on teardown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cache::ModuleCache;

/// An ephemeral, host-issued reference to one generated document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub url: String,
}

/// Host boundary: mint a handle for a document, point the isolated surface
/// at it, release it.
pub trait PreviewHost {
    fn create_resource(&mut self, document: &str) -> ResourceHandle;
    fn load(&mut self, handle: &ResourceHandle);
    fn release(&mut self, handle: &ResourceHandle);
}

/// In-process host. Handles are `<scheme>/<sequence>-<digest>`, so naming is
/// deterministic for a given sequence of documents.
#[derive(Debug, Default)]
pub struct MemoryHost {
    scheme: String,
    sequence: u64,
    resources: HashMap<String, String>,
    loaded: Option<String>,
    released: Vec<String>,
}

impl MemoryHost {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..Self::default()
        }
    }

    /// Document currently shown on the surface.
    pub fn loaded_document(&self) -> Option<&str> {
        let url = self.loaded.as_ref()?;
        self.resources.get(url).map(String::as_str)
    }

    pub fn loaded_url(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    /// Handles created and not yet released.
    pub fn live_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn released(&self) -> &[String] {
        &self.released
    }
}

impl PreviewHost for MemoryHost {
    fn create_resource(&mut self, document: &str) -> ResourceHandle {
        self.sequence += 1;
        let digest = ModuleCache::compute_hash(document);
        let url = format!("{}/{}-{}", self.scheme, self.sequence, &digest[..12]);
        self.resources.insert(url.clone(), document.to_string());
        ResourceHandle { url }
    }

    fn load(&mut self, handle: &ResourceHandle) {
        self.loaded = Some(handle.url.clone());
    }

    fn release(&mut self, handle: &ResourceHandle) {
        if self.resources.remove(&handle.url).is_some() {
            self.released.push(handle.url.clone());
        }
    }
}

pub struct SandboxRunner<H: PreviewHost> {
    host: H,
    current: Option<ResourceHandle>,
    latest_generation: Option<u64>,
}

impl<H: PreviewHost> SandboxRunner<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            current: None,
            latest_generation: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn current(&self) -> Option<&ResourceHandle> {
        self.current.as_ref()
    }

    /// Install the document produced by build `generation`. Results older than
    /// the newest presented build are dropped. Returns the installed handle.
    pub fn present(&mut self, generation: u64, document: &str) -> Option<&ResourceHandle> {
        if let Some(latest) = self.latest_generation {
            if generation < latest {
                tracing::debug!(generation, latest, "dropping stale preview");
                return None;
            }
        }
        self.latest_generation = Some(generation);

        let handle = self.host.create_resource(document);
        self.host.load(&handle);
        tracing::debug!(url = %handle.url, generation, "preview installed");

        if let Some(previous) = self.current.replace(handle) {
            self.host.release(&previous);
            tracing::debug!(url = %previous.url, "preview released");
        }
        self.current.as_ref()
    }

    /// Release the live handle, if any.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.current.take() {
            self.host.release(&handle);
            tracing::debug!(url = %handle.url, "preview released on teardown");
        }
    }
}

impl<H: PreviewHost> Drop for SandboxRunner<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
