//! Form model tree types.

use indexmap::IndexMap;
use serde_json::Value;

use crate::schema::{BlockProperty, Widget};

/// Transient editing-time tree mirroring a block schema.
///
/// Field iteration order is the schema's declaration order, which is also
/// the order fields are presented for editing.
#[derive(Debug)]
pub struct FormModel {
    pub fields: IndexMap<String, FormNode>,
}

/// One node of the form model tree.
#[derive(Debug)]
pub enum FormNode {
    /// A leaf holding a current editable value.
    Scalar(ScalarField),
    /// An object sub-tree with one child per declared property.
    Object(IndexMap<String, FormNode>),
    /// A live collection of element sub-models.
    Array(ArrayField),
}

/// A scalar leaf: the live value plus the hints the editor widget needs.
#[derive(Debug)]
pub struct ScalarField {
    pub value: Value,
    pub widget: Option<Widget>,
    /// Allowed values for select-style widgets.
    pub options: Option<Vec<Value>>,
}

/// An array node: existing element models plus the element schema, kept so
/// the editor can append a fresh default-valued element on demand.
#[derive(Debug)]
pub struct ArrayField {
    pub item_schema: BlockProperty,
    pub items: Vec<FormNode>,
}

impl FormModel {
    /// Look up a top-level field.
    pub fn field(&self, key: &str) -> Option<&FormNode> {
        self.fields.get(key)
    }

    /// Mutable top-level field access, for editor write-backs.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut FormNode> {
        self.fields.get_mut(key)
    }
}

impl FormNode {
    /// The scalar leaf, if this node is one.
    pub fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            FormNode::Scalar(field) => Some(field),
            _ => None,
        }
    }

    /// The array node, if this node is one.
    pub fn as_array(&self) -> Option<&ArrayField> {
        match self {
            FormNode::Array(field) => Some(field),
            _ => None,
        }
    }
}
