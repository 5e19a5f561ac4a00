//! Block instances and the persisted page-content wire shape.
//!
//! A page's content is an ordered JSON array of `BlockInstance` objects.
//! The CRUD layer that loads and saves pages is outside this engine; it is
//! consumed through the [`ContentStore`] trait and only agreed on the
//! array shape defined here.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::schema::BlockSchema;

/// One placed, data-bound occurrence of a block type within a page.
///
/// `id` is assigned at creation and never changes; `type` is likewise
/// immutable (changing a block's type is modeled as delete + recreate).
/// `data` is the sole payload consumed to render output; `styles` is
/// orthogonal presentation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<BlockStyles>,
}

/// Per-instance presentation metadata.
///
/// `desktop` is the base style layer; `tablet` and `mobile` are deep-merged
/// on top by the style composer. The free-form fields pass through the
/// style validator before use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<Map<String, Value>>,
    /// Whitespace-separated class list added to the block wrapper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_classes: Option<String>,
    /// Free-form CSS declarations merged into the base scoped rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_styles: Option<String>,
    /// Free-form CSS appended under the instance scope selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl BlockStyles {
    /// True when nothing here would produce CSS or classes.
    pub fn is_empty(&self) -> bool {
        self.desktop.is_none()
            && self.tablet.is_none()
            && self.mobile.is_none()
            && self.custom_classes.is_none()
            && self.inline_styles.is_none()
            && self.custom_css.is_none()
    }
}

impl BlockInstance {
    /// Create a new instance of a block type with schema-derived default data.
    pub fn new(type_name: impl Into<String>, schema: &BlockSchema) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            type_name: type_name.into(),
            data: schema.default_data(),
            styles: None,
        }
    }

    /// Parse one raw instance object, applying the legacy root-key migration.
    ///
    /// Historical documents sometimes placed `data` fields directly on the
    /// instance object's root. Recovery rule, preserved exactly: collect all
    /// root keys other than `{id, type, data, styles}`, and if `data` is
    /// empty while such keys exist, merge them into `data` (root keys win).
    /// This is a recovery path for a known historical bug, not a general
    /// merge policy.
    pub fn from_value(raw: Value) -> EngineResult<Self> {
        let Value::Object(mut object) = raw else {
            return Err(EngineError::MalformedInstance);
        };

        let stray: Vec<String> = object
            .keys()
            .filter(|k| !matches!(k.as_str(), "id" | "type" | "data" | "styles"))
            .cloned()
            .collect();

        let data_is_empty = match object.get("data") {
            None | Some(Value::Null) => true,
            Some(Value::Object(map)) => map.is_empty(),
            Some(_) => false,
        };

        if data_is_empty && !stray.is_empty() {
            warn!(
                keys = ?stray,
                "migrating legacy root-level fields into block data"
            );
            let mut data = Map::new();
            for key in stray {
                if let Some(value) = object.remove(&key) {
                    data.insert(key, value);
                }
            }
            object.insert("data".to_string(), Value::Object(data));
        }

        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

/// Parse a persisted page-content document into its ordered instance list.
pub fn load_content(json: &str) -> EngineResult<Vec<BlockInstance>> {
    let raw: Value = serde_json::from_str(json)?;
    let Value::Array(items) = raw else {
        return Err(EngineError::NotAnArray);
    };
    items.into_iter().map(BlockInstance::from_value).collect()
}

/// Serialize an ordered instance list back to the persisted wire shape.
pub fn save_content(content: &[BlockInstance]) -> EngineResult<String> {
    Ok(serde_json::to_string(content)?)
}

/// Page-content persistence collaborator.
///
/// Load returns the ordered array of instances; save accepts the same
/// shape. Everything else about storage is outside this engine's contract.
pub trait ContentStore {
    fn load(&self, page_id: &str) -> Result<Vec<BlockInstance>>;
    fn save(&self, page_id: &str, content: &[BlockInstance]) -> Result<()>;
}

/// Translation/label lookup collaborator.
///
/// Maps a symbolic key to display text. Implementations fall back to the
/// key itself when no translation exists.
pub trait LabelSource {
    fn label(&self, key: &str) -> String;
}

/// Trivial label source: every key is its own label.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyLabels;

impl LabelSource for KeyLabels {
    fn label(&self, key: &str) -> String {
        key.to_string()
    }
}
