//! Per-instance, per-viewport, sanitized style pipeline.
//!
//! Provides:
//! - `validator`: sanitization of untrusted CSS declarations, class lists,
//!   and free-form CSS blocks against known injection patterns
//! - `composer`: viewport breakpoint classification, deep merge of style
//!   layers, and pure scoped-CSS text generation
//! - `inject`: the small side-effecting seam that writes generated CSS to a
//!   live document, a no-op outside the browser

pub mod composer;
pub mod inject;
pub mod validator;

pub use composer::{Breakpoint, ComposedStyle, compose, resolve_effective, scope_selector};
pub use inject::{NullTarget, StyleInjector, StyleTarget};
pub use validator::{
    CssFinding, CssValidationResult, Severity, validate_classes, validate_custom_css,
    validate_inline_styles,
};
