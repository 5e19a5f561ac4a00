//! Tessera test utilities.
//!
//! Helpers for integration testing the block engine: manifest fixtures,
//! a probe renderable that records everything the renderer does to it,
//! a counting style target for injection-idempotence assertions, and
//! in-memory collaborator implementations.

// Test helpers are test code; they may unwrap freely.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use tessera_engine::content::{BlockInstance, ContentStore, LabelSource};
use tessera_engine::registry::RenderableFactory;
use tessera_engine::render::Renderable;
use tessera_engine::schema::{BlockManifest, BlockProperty, BlockSchema, PropertyType};
use tessera_engine::style::StyleTarget;

/// Everything probe renderables record, shared across factory invocations.
#[derive(Debug, Default)]
pub struct ProbeLog {
    /// Number of renderables constructed (i.e. mounts).
    pub constructed: usize,
    /// Every `set_input` call, in order.
    pub inputs: Vec<(String, Value)>,
    /// Every `set_style` call, in order.
    pub styles: Vec<Map<String, Value>>,
}

/// A renderable that records inputs and renders its latest `title`.
pub struct ProbeBlock {
    log: Arc<Mutex<ProbeLog>>,
    inputs: &'static [&'static str],
    with_style: bool,
    title: String,
}

impl Renderable for ProbeBlock {
    fn accepted_inputs(&self) -> &[&'static str] {
        self.inputs
    }

    fn set_input(&mut self, key: &str, value: &Value) {
        if key == "title"
            && let Some(text) = value.as_str()
        {
            self.title = text.to_string();
        }
        self.log
            .lock()
            .unwrap()
            .inputs
            .push((key.to_string(), value.clone()));
    }

    fn accepts_style(&self) -> bool {
        self.with_style
    }

    fn set_style(&mut self, style: &Map<String, Value>) {
        self.log.lock().unwrap().styles.push(style.clone());
    }

    fn render(&self) -> String {
        format!("<h1>{}</h1>", self.title)
    }
}

/// Factory producing [`ProbeBlock`]s that share one log.
pub fn probe_factory(
    log: Arc<Mutex<ProbeLog>>,
    inputs: &'static [&'static str],
    with_style: bool,
) -> RenderableFactory {
    Box::new(move || {
        log.lock().unwrap().constructed += 1;
        Box::new(ProbeBlock {
            log: Arc::clone(&log),
            inputs,
            with_style,
            title: String::new(),
        })
    })
}

/// A manifest fixture with a `title` string (defaulting to "Untitled") and
/// a numeric `level`.
pub fn heading_manifest(type_name: &str) -> BlockManifest {
    BlockManifest {
        type_name: type_name.to_string(),
        display_name: "Heading".to_string(),
        category: "content".to_string(),
        schema: BlockSchema::new([
            (
                "title".to_string(),
                BlockProperty::scalar(PropertyType::String)
                    .default_value(Value::String("Untitled".to_string())),
            ),
            (
                "level".to_string(),
                BlockProperty::scalar(PropertyType::Number).default_value(Value::from(2)),
            ),
        ]),
        style_schema: None,
    }
}

/// One recorded style-target write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleWrite {
    pub instance_id: String,
    pub css: String,
}

/// A style target counting installs and removals.
#[derive(Debug, Default, Clone)]
pub struct CountingTarget {
    writes: Arc<Mutex<Vec<StyleWrite>>>,
    removals: Arc<Mutex<Vec<String>>>,
}

impl CountingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// All installs so far, in order.
    pub fn writes(&self) -> Vec<StyleWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of installs so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// All removals so far, in order.
    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().unwrap().clone()
    }
}

impl StyleTarget for CountingTarget {
    fn install(&mut self, instance_id: &str, css: &str) {
        self.writes.lock().unwrap().push(StyleWrite {
            instance_id: instance_id.to_string(),
            css: css.to_string(),
        });
    }

    fn remove(&mut self, instance_id: &str) {
        self.removals.lock().unwrap().push(instance_id.to_string());
    }
}

/// In-memory page-content store speaking the persisted wire shape.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pages: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a page with a raw JSON document (for legacy-shape fixtures).
    pub fn seed(&self, page_id: &str, document: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(page_id.to_string(), document.to_string());
    }
}

impl ContentStore for MemoryStore {
    fn load(&self, page_id: &str) -> Result<Vec<BlockInstance>> {
        let pages = self.pages.lock().unwrap();
        let document = pages
            .get(page_id)
            .with_context(|| format!("no page '{page_id}'"))?;
        tessera_engine::content::load_content(document)
            .with_context(|| format!("failed to parse page '{page_id}'"))
    }

    fn save(&self, page_id: &str, content: &[BlockInstance]) -> Result<()> {
        let document =
            tessera_engine::content::save_content(content).context("failed to serialize page")?;
        self.pages
            .lock()
            .unwrap()
            .insert(page_id.to_string(), document);
        Ok(())
    }
}

/// Label source backed by a fixed map, falling back to the key.
#[derive(Debug, Default, Clone)]
pub struct StaticLabels {
    labels: HashMap<String, String>,
}

impl StaticLabels {
    pub fn new(labels: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }
}

impl LabelSource for StaticLabels {
    fn label(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
