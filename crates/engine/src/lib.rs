//! Tessera block composition engine.
//!
//! The dynamic core of the Tessera CMS: independently-authored block
//! components are described by a declarative schema, edited through a
//! generically-derived form model, instantiated at runtime by type name,
//! kept in sync with mutating data without full remounts, and styled
//! through a per-instance, per-viewport, sanitized CSS pipeline.
//!
//! The CRUD layer around this engine (pages, languages, menus,
//! translations) lives elsewhere; it only consumes and produces the
//! `BlockInstance` array shape defined in [`content`].

pub mod content;
pub mod error;
pub mod form;
pub mod registry;
pub mod render;
pub mod schema;
pub mod style;
