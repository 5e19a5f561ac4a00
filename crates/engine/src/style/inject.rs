//! Scoped style artifact lifecycle.
//!
//! One style artifact exists per instance id. The injector owns the
//! installed-text bookkeeping and skips the write when a recompute
//! produces byte-identical CSS; the actual document write sits behind
//! [`StyleTarget`] so it can be a no-op under server rendering and tests.

use std::collections::HashMap;

/// The side-effecting seam that writes scoped CSS into a live document.
pub trait StyleTarget {
    /// Install (or replace) the style artifact for one instance.
    fn install(&mut self, instance_id: &str, css: &str);
    /// Remove the style artifact for one instance, if present.
    fn remove(&mut self, instance_id: &str);
}

/// No-op target for non-browser contexts (tests, server rendering).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTarget;

impl StyleTarget for NullTarget {
    fn install(&mut self, _instance_id: &str, _css: &str) {}
    fn remove(&mut self, _instance_id: &str) {}
}

/// Owner of the per-instance style artifact set.
pub struct StyleInjector {
    target: Box<dyn StyleTarget>,
    installed: HashMap<String, String>,
}

impl StyleInjector {
    /// Create an injector writing through the given target.
    pub fn new(target: Box<dyn StyleTarget>) -> Self {
        Self {
            target,
            installed: HashMap::new(),
        }
    }

    /// Install the CSS for one instance.
    ///
    /// Idempotent: if `css` is byte-identical to what is already installed
    /// for this id, no write occurs. Empty CSS removes the artifact.
    pub fn apply(&mut self, instance_id: &str, css: &str) {
        if css.trim().is_empty() {
            self.discard(instance_id);
            return;
        }
        if self
            .installed
            .get(instance_id)
            .is_some_and(|current| current == css)
        {
            return;
        }
        self.target.install(instance_id, css);
        self.installed
            .insert(instance_id.to_string(), css.to_string());
    }

    /// Remove the artifact for one instance, on teardown.
    pub fn discard(&mut self, instance_id: &str) {
        if self.installed.remove(instance_id).is_some() {
            self.target.remove(instance_id);
        }
    }

    /// Currently installed CSS text for one instance.
    pub fn installed_css(&self, instance_id: &str) -> Option<&str> {
        self.installed.get(instance_id).map(String::as_str)
    }

    /// Number of live artifacts.
    pub fn len(&self) -> usize {
        self.installed.len()
    }

    /// Check if no artifacts are installed.
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}
