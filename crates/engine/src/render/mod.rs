//! Dynamic block reconciliation.
//!
//! Resolves each `BlockInstance` to its renderable through the manifest
//! registry, performs first-mount vs. incremental-update reconciliation,
//! and drives the style pipeline. Everything runs synchronously on the
//! caller's thread; updates for one instance apply in the order they are
//! observed, and a type change always remounts before any incremental
//! update is considered.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::content::{BlockInstance, LabelSource};
use crate::registry::ManifestRegistry;
use crate::style::composer::{Breakpoint, compose, resolve_effective};
use crate::style::inject::{StyleInjector, StyleTarget};

/// An opaque renderable unit: consumes a data bag, produces visual output.
///
/// Each renderable explicitly declares the data keys it accepts; the
/// declared set is captured once at mount time and cached for the life of
/// the mount, so no reflection is needed to route updates.
pub trait Renderable {
    /// The data keys this renderable consumes.
    fn accepted_inputs(&self) -> &[&'static str];

    /// Apply one data field. Only called for accepted keys.
    fn set_input(&mut self, key: &str, value: &Value);

    /// Whether this renderable consumes the resolved style object.
    fn accepts_style(&self) -> bool {
        false
    }

    /// Apply the viewport-resolved style object.
    fn set_style(&mut self, style: &Map<String, Value>) {
        let _ = style;
    }

    /// Produce this block's visual output.
    fn render(&self) -> String;
}

/// A mounted block: the live renderable plus mount-time caches.
pub struct MountedBlock {
    type_name: String,
    renderable: Box<dyn Renderable>,
    /// Accepted-input set captured at mount time.
    accepted: HashSet<&'static str>,
    /// Sanitized custom classes for the wrapper element.
    classes: String,
}

impl MountedBlock {
    /// The block type this slot is mounted as.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Sanitized wrapper classes from the instance's styles.
    pub fn classes(&self) -> &str {
        &self.classes
    }
}

/// Per-instance slot state. Unknown block types are a typed absence, not
/// an error: the page keeps rendering every other instance.
pub enum SlotState {
    Mounted(MountedBlock),
    NotFound { type_name: String },
}

impl SlotState {
    /// The mounted block, if this slot resolved.
    pub fn as_mounted(&self) -> Option<&MountedBlock> {
        match self {
            SlotState::Mounted(mounted) => Some(mounted),
            SlotState::NotFound { .. } => None,
        }
    }
}

/// Reconciles an ordered page of block instances against live renderables.
pub struct DynamicBlockRenderer {
    registry: Arc<ManifestRegistry>,
    labels: Arc<dyn LabelSource>,
    injector: StyleInjector,
    slots: HashMap<String, SlotState>,
    order: Vec<String>,
    viewport: Breakpoint,
}

impl DynamicBlockRenderer {
    /// Create a renderer writing styles through the given target.
    pub fn new(
        registry: Arc<ManifestRegistry>,
        labels: Arc<dyn LabelSource>,
        target: Box<dyn StyleTarget>,
    ) -> Self {
        Self {
            registry,
            labels,
            injector: StyleInjector::new(target),
            slots: HashMap::new(),
            order: Vec::new(),
            viewport: Breakpoint::Desktop,
        }
    }

    /// Reconcile the page content against the current slot set.
    ///
    /// New ids and type changes remount; same-type instances receive an
    /// incremental update touching only accepted keys; ids missing from
    /// `instances` are torn down along with their style artifacts.
    pub fn sync(&mut self, instances: &[BlockInstance], viewport: Breakpoint) {
        self.viewport = viewport;
        let mut order = Vec::with_capacity(instances.len());

        for instance in instances {
            order.push(instance.id.clone());

            let same_type = matches!(
                self.slots.get(&instance.id),
                Some(SlotState::Mounted(mounted)) if mounted.type_name == instance.type_name
            );

            if same_type {
                if let Some(SlotState::Mounted(mounted)) = self.slots.get_mut(&instance.id) {
                    update_block(mounted, &mut self.injector, instance, viewport);
                }
            } else {
                let slot = mount_block(
                    &self.registry,
                    &mut self.injector,
                    instance,
                    viewport,
                );
                self.slots.insert(instance.id.clone(), slot);
            }
        }

        let live: HashSet<&String> = order.iter().collect();
        let removed: Vec<String> = self
            .slots
            .keys()
            .filter(|id| !live.contains(id))
            .cloned()
            .collect();
        for id in removed {
            self.slots.remove(&id);
            self.injector.discard(&id);
        }

        self.order = order;
    }

    /// The viewport of the most recent sync.
    pub fn viewport(&self) -> Breakpoint {
        self.viewport
    }

    /// The slot state for one instance id.
    pub fn slot(&self, instance_id: &str) -> Option<&SlotState> {
        self.slots.get(instance_id)
    }

    /// Currently installed CSS text for one instance.
    pub fn installed_css(&self, instance_id: &str) -> Option<&str> {
        self.injector.installed_css(instance_id)
    }

    /// Render the whole page: blocks in content order, each wrapped in its
    /// scope attribute, with a non-fatal placeholder for unknown types.
    pub fn render_page(&self) -> String {
        let mut html = String::new();
        for id in &self.order {
            let Some(slot) = self.slots.get(id) else {
                continue;
            };
            match slot {
                SlotState::Mounted(mounted) => {
                    let class_attr = if mounted.classes.is_empty() {
                        String::new()
                    } else {
                        format!(" class=\"{}\"", escape_attr(&mounted.classes))
                    };
                    html.push_str(&format!(
                        "<div data-block-id=\"{}\"{}>{}</div>",
                        escape_attr(id),
                        class_attr,
                        mounted.renderable.render()
                    ));
                }
                SlotState::NotFound { type_name } => {
                    html.push_str(&format!(
                        "<div data-block-id=\"{}\" class=\"block-not-found\">{} ({})</div>",
                        escape_attr(id),
                        escape_attr(&self.labels.label("block.not_found")),
                        escape_attr(type_name)
                    ));
                }
            }
        }
        html
    }
}

/// Full mount: resolve the type, instantiate, capture the accepted-input
/// set, feed all accepted data keys, then apply styles.
fn mount_block(
    registry: &ManifestRegistry,
    injector: &mut StyleInjector,
    instance: &BlockInstance,
    viewport: Breakpoint,
) -> SlotState {
    let Some(entry) = registry.resolve(&instance.type_name) else {
        // Nothing mounted; any style artifact from a previous mount of this
        // slot must not linger.
        injector.discard(&instance.id);
        return SlotState::NotFound {
            type_name: instance.type_name.clone(),
        };
    };

    let renderable = entry.instantiate();
    let accepted: HashSet<&'static str> = renderable.accepted_inputs().iter().copied().collect();
    let mut mounted = MountedBlock {
        type_name: instance.type_name.clone(),
        renderable,
        accepted,
        classes: String::new(),
    };
    update_block(&mut mounted, injector, instance, viewport);
    SlotState::Mounted(mounted)
}

/// Incremental update: set only accepted keys, silently ignore the rest
/// (legacy/partial data is expected), then recompute styles.
fn update_block(
    mounted: &mut MountedBlock,
    injector: &mut StyleInjector,
    instance: &BlockInstance,
    viewport: Breakpoint,
) {
    for (key, value) in &instance.data {
        if mounted.accepted.contains(key.as_str()) {
            mounted.renderable.set_input(key, value);
        }
    }

    match &instance.styles {
        Some(styles) if !styles.is_empty() => {
            let composed = compose(&instance.id, styles);
            injector.apply(&instance.id, &composed.css_text);
            mounted.classes = composed.classes;
            if mounted.renderable.accepts_style() {
                let effective = resolve_effective(styles, viewport);
                mounted.renderable.set_style(&effective);
            }
        }
        _ => {
            injector.discard(&instance.id);
            mounted.classes.clear();
        }
    }
}

fn escape_attr(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
