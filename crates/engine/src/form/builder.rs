//! Recursive form-model derivation and save-time read-back.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{BlockProperty, BlockSchema, PropertyKind, SchemaIssue, Widget};

use super::types::{ArrayField, FormModel, FormNode, ScalarField};

/// Deterministically derive a form model from a schema and instance data.
///
/// Per property, the effective initial value is `data[key]` if present,
/// else the schema default, else a type-appropriate empty value. Authoring
/// problems (an array without an `items` schema) skip the field and are
/// returned as non-blocking issues for the editing UI.
pub fn build_form_model(
    schema: &BlockSchema,
    data: &Map<String, Value>,
) -> (FormModel, Vec<SchemaIssue>) {
    let mut issues = Vec::new();
    let mut fields = IndexMap::new();
    for (key, property) in &schema.properties {
        if let Some(node) = build_node(key, property, data.get(key), &mut issues) {
            fields.insert(key.clone(), node);
        }
    }
    (FormModel { fields }, issues)
}

/// Build one node of the tree. Returns `None` only for fields that cannot
/// be edited at all (array without `items`).
fn build_node(
    path: &str,
    property: &BlockProperty,
    data: Option<&Value>,
    issues: &mut Vec<SchemaIssue>,
) -> Option<FormNode> {
    // Null in stored data is treated like an absent key: it carries no
    // editable value and falls through to the schema default.
    let present = data.filter(|v| !v.is_null());
    let effective = present.cloned().or_else(|| property.default.clone());

    // Legacy escape-hatch: a textarea widget pointed at structured data
    // edits it as formatted JSON text instead of a structured sub-tree.
    if property.widget_hint() == Some(Widget::Textarea)
        && let Some(value) = &effective
        && (value.is_object() || value.is_array())
    {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        return Some(FormNode::Scalar(ScalarField {
            value: Value::String(text),
            widget: Some(Widget::Textarea),
            options: property.allowed_values.clone(),
        }));
    }

    match property.kind() {
        PropertyKind::Array(None) => {
            issues.push(SchemaIssue {
                path: path.to_string(),
                message: "array property declares no 'items' schema; field not editable"
                    .to_string(),
            });
            None
        }
        PropertyKind::Array(Some(item_schema)) => {
            let mut items = Vec::new();
            if let Some(Value::Array(elements)) = &effective {
                for (index, element) in elements.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    if let Some(node) = build_node(&item_path, item_schema, Some(element), issues) {
                        items.push(node);
                    }
                }
            }
            Some(FormNode::Array(ArrayField {
                item_schema: item_schema.clone(),
                items,
            }))
        }
        PropertyKind::Object(Some(nested)) => {
            let empty = Map::new();
            let child_data = match &effective {
                Some(Value::Object(map)) => map,
                _ => &empty,
            };
            let mut children = IndexMap::new();
            for (key, child) in nested {
                let child_path = format!("{path}.{key}");
                if let Some(node) = build_node(&child_path, child, child_data.get(key), issues) {
                    children.insert(key.clone(), node);
                }
            }
            Some(FormNode::Object(children))
        }
        PropertyKind::Object(None) => {
            // Nothing is editable under an object with no declared fields;
            // stored nested data would be silently dropped on save, so the
            // author gets told.
            if matches!(&effective, Some(Value::Object(map)) if !map.is_empty()) {
                issues.push(SchemaIssue {
                    path: path.to_string(),
                    message: "object property declares no nested field schemas; \
                              stored nested data is not editable and will be dropped on save"
                        .to_string(),
                });
            }
            Some(FormNode::Object(IndexMap::new()))
        }
        PropertyKind::Scalar(scalar_type) => Some(FormNode::Scalar(ScalarField {
            value: effective.unwrap_or_else(|| scalar_type.empty_value()),
            widget: property.widget_hint(),
            options: property.allowed_values.clone(),
        })),
    }
}

impl ArrayField {
    /// Append a fresh element built from the element schema alone, with
    /// absent data (default derivation applies).
    pub fn push_default(&mut self) {
        let mut issues = Vec::new();
        if let Some(node) = build_node("item", &self.item_schema, None, &mut issues) {
            self.items.push(node);
        }
    }
}

/// Reconcile an edited form model back into a plain data map.
///
/// Textarea leaves holding JSON-looking text are best-effort parsed back
/// into structured data, reversing the build-time widening. Parse failure
/// keeps the literal string; it is logged, never raised.
pub fn collect_data(model: &FormModel) -> Map<String, Value> {
    let mut data = Map::new();
    for (key, node) in &model.fields {
        data.insert(key.clone(), node_value(node));
    }
    data
}

fn node_value(node: &FormNode) -> Value {
    match node {
        FormNode::Scalar(field) => {
            if field.widget == Some(Widget::Textarea)
                && let Value::String(text) = &field.value
                && looks_like_json(text)
            {
                return match serde_json::from_str(text) {
                    Ok(parsed) => parsed,
                    Err(error) => {
                        warn!(%error, "textarea JSON did not parse back; keeping literal text");
                        field.value.clone()
                    }
                };
            }
            field.value.clone()
        }
        FormNode::Object(children) => {
            let mut map = Map::new();
            for (key, child) in children {
                map.insert(key.clone(), node_value(child));
            }
            Value::Object(map)
        }
        FormNode::Array(field) => Value::Array(field.items.iter().map(node_value).collect()),
    }
}

/// A string is JSON-looking when it begins with `{`/`[` and ends with the
/// matching `}`/`]`.
fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}
