//! Block manifests and editable schemas.
//!
//! Provides:
//! - `BlockManifest`: static declaration of a block type's schema and metadata
//! - `BlockSchema` / `BlockProperty`: the recursive description of a block's
//!   editable fields, consumed by the generic editor UI
//! - `SchemaIssue`: non-fatal authoring diagnostics (a malformed property
//!   renders no editor; it never crashes the page)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static declaration of a block type: its machine name, editor metadata,
/// and the schemas driving the data and style editors.
///
/// Registered once per type and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockManifest {
    /// Machine name of the block type (e.g. "hero", "gallery").
    #[serde(rename = "type")]
    pub type_name: String,
    /// Human-readable label shown in the "add block" picker.
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Picker category (e.g. "content", "media", "layout").
    pub category: String,
    /// Schema describing the block's editable data fields.
    pub schema: BlockSchema,
    /// Optional schema describing block-specific style fields.
    #[serde(
        rename = "styleSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub style_schema: Option<BlockSchema>,
}

/// Root of a block's editable field tree.
///
/// Property iteration order is declaration order, and that order is also
/// the order fields are presented for editing — an observable contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSchema {
    #[serde(default)]
    pub properties: IndexMap<String, BlockProperty>,
}

/// Value type of a single schema property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl PropertyType {
    /// Type-appropriate empty value, used when neither instance data nor a
    /// schema default is available.
    pub fn empty_value(self) -> Value {
        match self {
            PropertyType::String => Value::String(String::new()),
            PropertyType::Number => Value::from(0),
            PropertyType::Boolean => Value::Bool(false),
            PropertyType::Object => Value::Object(serde_json::Map::new()),
            PropertyType::Array => Value::Array(Vec::new()),
        }
    }
}

/// Editor widget hint for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    Textarea,
    Image,
    Color,
    Select,
    Toggle,
    Range,
    RichText,
}

/// Presentation hints for the generic editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<Widget>,
    /// Optional label override; when absent the editor falls back to the
    /// property key (via the label lookup collaborator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One node of the recursive schema tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockProperty {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Default value applied when instance data has no entry for the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values for select-style widgets.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    /// Element schema; required when `type` is `array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<BlockProperty>>,
    /// Nested field schemas; required when an `object` has nested fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, BlockProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiHints>,
}

/// Structural classification of a property, the single dispatch point for
/// the recursive form-model builder.
#[derive(Debug)]
pub enum PropertyKind<'a> {
    /// string / number / boolean leaf.
    Scalar(PropertyType),
    /// Array node; `None` when the schema forgot to declare `items`
    /// (a recoverable authoring error).
    Array(Option<&'a BlockProperty>),
    /// Object node; `None` means an empty sub-tree.
    Object(Option<&'a IndexMap<String, BlockProperty>>),
}

impl BlockProperty {
    /// Shorthand constructor for a scalar property.
    pub fn scalar(property_type: PropertyType) -> Self {
        Self {
            property_type,
            default: None,
            allowed_values: None,
            items: None,
            properties: None,
            ui: None,
        }
    }

    /// Set the default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the widget hint.
    pub fn widget(mut self, widget: Widget) -> Self {
        let mut ui = self.ui.unwrap_or_default();
        ui.widget = Some(widget);
        self.ui = Some(ui);
        self
    }

    /// The widget hint, if any.
    pub fn widget_hint(&self) -> Option<Widget> {
        self.ui.as_ref().and_then(|ui| ui.widget)
    }

    /// Classify this property for recursive dispatch.
    pub fn kind(&self) -> PropertyKind<'_> {
        match self.property_type {
            PropertyType::Array => PropertyKind::Array(self.items.as_deref()),
            PropertyType::Object => PropertyKind::Object(self.properties.as_ref()),
            scalar => PropertyKind::Scalar(scalar),
        }
    }
}

/// A non-fatal schema authoring problem.
///
/// Surfaced as a visible warning in the editing UI; the affected field
/// simply renders no editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Dotted path of the offending property (e.g. "slides.caption").
    pub path: String,
    pub message: String,
}

impl BlockSchema {
    /// Create a schema from an ordered list of properties.
    pub fn new(properties: impl IntoIterator<Item = (String, BlockProperty)>) -> Self {
        Self {
            properties: properties.into_iter().collect(),
        }
    }

    /// Authoring diagnostics for the whole tree.
    ///
    /// Currently flags array properties without an `items` schema; such
    /// fields cannot be edited and are skipped by the form builder.
    pub fn lint(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        for (key, property) in &self.properties {
            lint_property(key, property, &mut issues);
        }
        issues
    }

    /// Derive a default `data` map for a freshly created instance.
    ///
    /// Scalars contribute their declared default; objects recurse and
    /// contribute whatever their nested fields default to; arrays only
    /// contribute an explicitly declared default.
    pub fn default_data(&self) -> serde_json::Map<String, Value> {
        let mut data = serde_json::Map::new();
        for (key, property) in &self.properties {
            if let Some(value) = property_default(property) {
                data.insert(key.clone(), value);
            }
        }
        data
    }
}

fn property_default(property: &BlockProperty) -> Option<Value> {
    if let Some(default) = &property.default {
        return Some(default.clone());
    }
    if let PropertyKind::Object(Some(nested)) = property.kind() {
        let mut map = serde_json::Map::new();
        for (key, child) in nested {
            if let Some(value) = property_default(child) {
                map.insert(key.clone(), value);
            }
        }
        if !map.is_empty() {
            return Some(Value::Object(map));
        }
    }
    None
}

fn lint_property(path: &str, property: &BlockProperty, issues: &mut Vec<SchemaIssue>) {
    match property.kind() {
        PropertyKind::Array(None) => {
            issues.push(SchemaIssue {
                path: path.to_string(),
                message: "array property declares no 'items' schema".to_string(),
            });
        }
        PropertyKind::Array(Some(items)) => {
            lint_property(path, items, issues);
        }
        PropertyKind::Object(Some(nested)) => {
            for (key, child) in nested {
                lint_property(&format!("{path}.{key}"), child, issues);
            }
        }
        PropertyKind::Object(None) | PropertyKind::Scalar(_) => {}
    }
}
