#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end block composition tests: store → renderer → styles, plus the
//! editor round trip through the form model.

use std::sync::{Arc, Mutex};

use serde_json::json;

use tessera_engine::content::{BlockInstance, ContentStore};
use tessera_engine::form::{build_form_model, collect_data};
use tessera_engine::registry::ManifestRegistry;
use tessera_engine::render::{DynamicBlockRenderer, SlotState};
use tessera_engine::style::Breakpoint;
use tessera_test_utils::{
    CountingTarget, MemoryStore, ProbeLog, StaticLabels, heading_manifest, probe_factory,
};

fn renderer_with(
    registry: ManifestRegistry,
    target: &CountingTarget,
) -> DynamicBlockRenderer {
    let labels = StaticLabels::new([(
        "block.not_found".to_string(),
        "Block unavailable".to_string(),
    )]);
    DynamicBlockRenderer::new(Arc::new(registry), Arc::new(labels), Box::new(target.clone()))
}

#[test]
fn page_with_unknown_type_renders_the_rest() {
    let log = Arc::new(Mutex::new(ProbeLog::default()));
    let mut registry = ManifestRegistry::new();
    registry.register(
        heading_manifest("known"),
        probe_factory(Arc::clone(&log), &["title"], false),
    );
    let target = CountingTarget::new();
    let mut renderer = renderer_with(registry, &target);

    let content = tessera_engine::content::load_content(
        r#"[
            {"id": "g1", "type": "ghost", "data": {}},
            {"id": "b1", "type": "known", "data": {"title": "Hi"}}
        ]"#,
    )
    .unwrap();

    renderer.sync(&content, Breakpoint::Desktop);

    let html = renderer.render_page();
    assert!(html.contains("<h1>Hi</h1>"), "known block renders: {html}");
    assert!(html.contains("Block unavailable"), "placeholder uses label: {html}");
    assert!(matches!(
        renderer.slot("g1"),
        Some(SlotState::NotFound { type_name }) if type_name == "ghost"
    ));

    // Removing the unknown instance must not disturb the mounted one.
    renderer.sync(&content[1..], Breakpoint::Desktop);
    assert!(renderer.slot("g1").is_none());
    assert_eq!(
        log.lock().unwrap().constructed,
        1,
        "known block must not remount when its neighbor is removed"
    );
    assert!(renderer.render_page().contains("<h1>Hi</h1>"));
}

#[test]
fn style_injection_is_idempotent_across_syncs() {
    let log = Arc::new(Mutex::new(ProbeLog::default()));
    let mut registry = ManifestRegistry::new();
    registry.register(
        heading_manifest("hero"),
        probe_factory(Arc::clone(&log), &["title"], false),
    );
    let target = CountingTarget::new();
    let mut renderer = renderer_with(registry, &target);

    let mut instance = BlockInstance {
        id: "b1".to_string(),
        type_name: "hero".to_string(),
        data: serde_json::Map::new(),
        styles: serde_json::from_value(json!({
            "desktop": { "typography": { "color": "red" } }
        }))
        .unwrap(),
    };

    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Desktop);
    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Desktop);
    assert_eq!(target.write_count(), 1, "unchanged styles must not rewrite");

    instance.styles = serde_json::from_value(json!({
        "desktop": { "typography": { "color": "blue" } }
    }))
    .unwrap();
    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Desktop);
    assert_eq!(target.write_count(), 2);

    renderer.sync(&[], Breakpoint::Desktop);
    assert_eq!(target.removals(), ["b1"]);
}

#[test]
fn legacy_document_loads_and_round_trips_through_the_editor() {
    let store = MemoryStore::new();
    // Legacy shape: data fields sitting on the instance root.
    store.seed(
        "front",
        r#"[{"id": "b1", "type": "heading", "title": "From the root", "level": 3}]"#,
    );

    let content = store.load("front").unwrap();
    assert_eq!(content[0].data.get("title"), Some(&json!("From the root")));
    assert_eq!(content[0].data.get("level"), Some(&json!(3)));

    // Edit through the schema-derived form model.
    let manifest = heading_manifest("heading");
    let (mut model, issues) = build_form_model(&manifest.schema, &content[0].data);
    assert!(issues.is_empty());
    if let Some(tessera_engine::form::FormNode::Scalar(field)) = model.field_mut("title") {
        field.value = json!("Edited");
    }

    let mut edited = content;
    edited[0].data = collect_data(&model);
    store.save("front", &edited).unwrap();

    let reloaded = store.load("front").unwrap();
    assert_eq!(reloaded[0].data.get("title"), Some(&json!("Edited")));
    assert_eq!(reloaded[0].data.get("level"), Some(&json!(3)));
}

#[test]
fn viewport_change_pushes_remerged_style() {
    let log = Arc::new(Mutex::new(ProbeLog::default()));
    let mut registry = ManifestRegistry::new();
    registry.register(
        heading_manifest("hero"),
        probe_factory(Arc::clone(&log), &["title"], true),
    );
    let target = CountingTarget::new();
    let mut renderer = renderer_with(registry, &target);

    let instance = BlockInstance {
        id: "b1".to_string(),
        type_name: "hero".to_string(),
        data: serde_json::Map::new(),
        styles: serde_json::from_value(json!({
            "desktop": { "typography": { "color": "black", "size": "16px" } },
            "mobile": { "typography": { "color": "red" } }
        }))
        .unwrap(),
    };

    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Desktop);
    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Mobile);

    let log = log.lock().unwrap();
    let desktop = &log.styles[0];
    let mobile = &log.styles[1];
    assert_eq!(desktop["typography"]["color"], json!("black"));
    assert_eq!(mobile["typography"]["color"], json!("red"));
    assert_eq!(mobile["typography"]["size"], json!("16px"));

    // The generated CSS itself did not change, so no extra DOM write.
    assert_eq!(target.write_count(), 1);
}

#[test]
fn new_instance_defaults_flow_to_render() {
    let log = Arc::new(Mutex::new(ProbeLog::default()));
    let mut registry = ManifestRegistry::new();
    let manifest = heading_manifest("heading");
    registry.register(manifest.clone(), probe_factory(Arc::clone(&log), &["title", "level"], false));
    let target = CountingTarget::new();
    let mut renderer = renderer_with(registry, &target);

    let instance = BlockInstance::new("heading", &manifest.schema);
    assert_eq!(instance.data.get("title"), Some(&json!("Untitled")));

    renderer.sync(std::slice::from_ref(&instance), Breakpoint::Desktop);
    assert!(renderer.render_page().contains("<h1>Untitled</h1>"));
}
