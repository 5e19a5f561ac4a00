//! Schema-driven form models.
//!
//! Derives an editable, recursively-typed form model from a block schema
//! plus existing instance data, and reconciles the edited model back into
//! a plain `data` map on save. Form models are transient editing artifacts;
//! they are never persisted.

mod builder;
mod types;

pub use builder::{build_form_model, collect_data};
pub use types::{ArrayField, FormModel, FormNode, ScalarField};
