//! A project session: the owned store plus its live preview.
//!
//! Every change to the files (or to the entry document selection) triggers a
//! full, synchronous rebuild. There is no debouncing and no state carried from
//! one build to the next apart from the optional analysis cache, which never
//! changes results.

use crate::cache::ModuleCache;
use crate::document::{build_preview, build_preview_with, PreviewBuild};
use crate::error::{BuildError, StoreError};
use crate::options::PreviewOptions;
use crate::persist::ProjectStore;
use crate::sandbox::{MemoryHost, PreviewHost, ResourceHandle, SandboxRunner};
use crate::tree::{build_tree, TreeNode};
use crate::vfs::{ProjectSnapshot, VirtualFileSystem};

pub struct PreviewSession<H: PreviewHost> {
    fs: VirtualFileSystem,
    options: PreviewOptions,
    cache: Option<ModuleCache>,
    runner: SandboxRunner<H>,
    generation: u64,
    last_build: Option<PreviewBuild>,
    diagnostic: Option<String>,
}

impl PreviewSession<MemoryHost> {
    pub fn in_memory(snapshot: ProjectSnapshot, options: PreviewOptions) -> Self {
        let host = MemoryHost::new(options.handle_scheme.clone());
        Self::new(snapshot, options, host)
    }
}

impl<H: PreviewHost> PreviewSession<H> {
    /// Open a session and run the first build.
    pub fn new(snapshot: ProjectSnapshot, options: PreviewOptions, host: H) -> Self {
        let mut session = Self {
            fs: VirtualFileSystem::from(snapshot),
            options,
            cache: None,
            runner: SandboxRunner::new(host),
            generation: 0,
            last_build: None,
            diagnostic: None,
        };
        session.refresh();
        session
    }

    /// Reuse per-file analysis across rebuilds while content is unchanged.
    pub fn enable_cache(&mut self) {
        if self.cache.is_none() {
            self.cache = Some(ModuleCache::new());
        }
    }

    pub fn cache(&self) -> Option<&ModuleCache> {
        self.cache.as_ref()
    }

    pub fn fs(&self) -> &VirtualFileSystem {
        &self.fs
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        self.fs.snapshot()
    }

    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    pub fn runner(&self) -> &SandboxRunner<H> {
        &self.runner
    }

    pub fn tree(&self) -> Vec<TreeNode> {
        build_tree(self.fs.snapshot().paths())
    }

    /// Diagnostic of the most recent build, `None` when it succeeded.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn last_build(&self) -> Option<&PreviewBuild> {
        self.last_build.as_ref()
    }

    pub fn current_handle(&self) -> Option<&ResourceHandle> {
        self.runner.current()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_active_path(&mut self, path: &str) {
        self.fs.set_active_path(path);
    }

    pub fn upsert(&mut self, path: &str, content: Option<&str>) {
        self.fs.upsert(path, content);
        self.refresh();
    }

    pub fn create_file(&mut self, path: &str) -> bool {
        let created = self.fs.create_file(path);
        if created {
            self.refresh();
        }
        created
    }

    pub fn create_folder(&mut self, path: &str) -> bool {
        let created = self.fs.create_folder(path);
        if created {
            self.refresh();
        }
        created
    }

    pub fn delete(&mut self, path: &str) -> bool {
        let removed = self.fs.delete(path);
        if removed {
            self.refresh();
        }
        removed
    }

    pub fn delete_folder(&mut self, path: &str) -> usize {
        let removed = self.fs.delete_folder(path);
        if removed > 0 {
            self.refresh();
        }
        removed
    }

    pub fn rename(&mut self, old_path: &str, new_path: &str) -> bool {
        let renamed = self.fs.rename(old_path, new_path);
        if renamed {
            self.refresh();
        }
        renamed
    }

    pub fn set_entry_document_path(&mut self, path: &str) {
        self.fs.set_entry_document_path(path);
        self.refresh();
    }

    /// Swap in a whole new snapshot, e.g. one loaded from a store.
    pub fn replace_snapshot(&mut self, snapshot: ProjectSnapshot) {
        self.fs = VirtualFileSystem::from(snapshot);
        self.refresh();
    }

    pub fn save(&self, store: &mut dyn ProjectStore, id: &str) -> Result<(), StoreError> {
        store.save(id, self.fs.snapshot())
    }

    /// Run a full build of the current snapshot and present it. On failure the
    /// diagnostic is recorded and nothing is rendered.
    pub fn rebuild(&mut self) -> Result<u64, BuildError> {
        self.generation += 1;
        let generation = self.generation;

        let result = match self.cache.as_mut() {
            Some(cache) => {
                cache.retain_paths(self.fs.snapshot().paths());
                build_preview_with(self.fs.snapshot(), &self.options, Some(cache))
            }
            None => build_preview(self.fs.snapshot(), &self.options),
        };

        match result {
            Ok(build) => {
                self.diagnostic = None;
                self.runner.present(generation, &build.document.html);
                self.last_build = Some(build);
                Ok(generation)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::info!(generation, %message, "preview build failed");
                self.diagnostic = Some(message);
                self.last_build = None;
                Err(err)
            }
        }
    }

    /// Release the preview resources. The session stays usable; the next
    /// change presents a fresh document.
    pub fn teardown(&mut self) {
        self.runner.teardown();
    }

    fn refresh(&mut self) {
        // Failures are kept in `diagnostic`.
        let _ = self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EntryPoint;

    #[test]
    fn test_starter_project_renders_app() {
        let session = PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        assert_eq!(session.diagnostic(), None);
        let build = session.last_build().unwrap();
        assert_eq!(build.document.entry, EntryPoint::Named("App".into()));
        assert!(session.current_handle().is_some());
        assert_eq!(session.snapshot().active_path, "App.js");
    }

    #[test]
    fn test_every_edit_rebuilds_and_releases_previous() {
        let mut session =
            PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        let first = session.current_handle().cloned().unwrap();
        session.upsert("Extra.js", Some("export const x = 1;"));
        session.upsert("Extra.js", Some("export const x = 2;"));
        assert_eq!(session.generation(), 3);
        let host = session.runner().host();
        assert_eq!(host.live_resources(), 1);
        assert!(host.released().contains(&first.url));
        assert!(host.loaded_document().unwrap().contains("const x = 2;"));
    }

    #[test]
    fn test_failed_build_keeps_diagnostic_and_skips_render() {
        let mut session =
            PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        session.delete("App.js");
        let shown = session.current_handle().cloned();
        assert!(shown.is_some());
        session.delete("Product.js");
        assert_eq!(session.diagnostic(), Some("No JavaScript/TypeScript files found"));
        assert!(session.last_build().is_none());
        assert_eq!(session.current_handle().cloned(), shown);
        assert_eq!(session.snapshot().active_path, "index.html");

        session.upsert("Main.js", Some("function Main() {}"));
        assert_eq!(session.diagnostic(), None);
    }

    #[test]
    fn test_noop_operations_do_not_rebuild() {
        let mut session =
            PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        let generation = session.generation();
        assert!(!session.delete("missing.js"));
        assert!(!session.rename("missing.js", "other.js"));
        assert_eq!(session.delete_folder("nowhere"), 0);
        assert!(!session.create_file("App.js"));
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_cache_does_not_change_output() {
        let mut cached =
            PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        cached.enable_cache();
        cached.rebuild().unwrap();
        cached.rebuild().unwrap();
        let plain = PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        assert_eq!(
            cached.last_build().unwrap().document,
            plain.last_build().unwrap().document
        );
        let (hits, _) = cached.cache().unwrap().stats();
        assert!(hits >= 2);
    }

    #[test]
    fn test_teardown_releases_live_handle() {
        let mut session =
            PreviewSession::in_memory(ProjectSnapshot::starter(), PreviewOptions::default());
        session.teardown();
        assert!(session.current_handle().is_none());
        assert_eq!(session.runner().host().live_resources(), 0);
    }
}
