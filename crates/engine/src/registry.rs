//! Manifest registry: runtime type-name → renderable dispatch.
//!
//! Each block type registers a manifest plus an explicit factory closure.
//! No reflection: a renderable declares its accepted input names itself,
//! and the factory produces a fresh renderable per mount.

use indexmap::IndexMap;
use tracing::warn;

use crate::render::Renderable;
use crate::schema::BlockManifest;

/// Factory producing a fresh renderable for one block type.
pub type RenderableFactory = Box<dyn Fn() -> Box<dyn Renderable>>;

/// One registered block type: its manifest and renderable factory.
pub struct RegistryEntry {
    manifest: BlockManifest,
    factory: RenderableFactory,
}

impl RegistryEntry {
    /// The static manifest for this type.
    pub fn manifest(&self) -> &BlockManifest {
        &self.manifest
    }

    /// Instantiate a fresh renderable.
    pub fn instantiate(&self) -> Box<dyn Renderable> {
        (self.factory)()
    }
}

/// Registry of block types, keyed by machine name.
///
/// Listing order is registration order, which is what "add block" pickers
/// display; registration order must therefore be deterministic in a real
/// deployment.
#[derive(Default)]
pub struct ManifestRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl ManifestRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type.
    ///
    /// Re-registering an existing type overwrites the previous entry with a
    /// non-fatal warning. Last registration wins; this permits hot-reload
    /// workflows.
    pub fn register(&mut self, manifest: BlockManifest, factory: RenderableFactory) {
        let type_name = manifest.type_name.clone();
        if self.entries.contains_key(&type_name) {
            warn!(
                type_name = %type_name,
                "block type re-registered, previous definition replaced"
            );
        }
        self.entries
            .insert(type_name, RegistryEntry { manifest, factory });
    }

    /// Look up a block type.
    ///
    /// Not-found is not an error; callers render an absence state instead.
    pub fn resolve(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(type_name)
    }

    /// All manifests in registration order, for picker population.
    pub fn manifests(&self) -> impl Iterator<Item = &BlockManifest> {
        self.entries.values().map(|entry| &entry.manifest)
    }

    /// Check whether a block type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// All registered type names, in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered block types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
