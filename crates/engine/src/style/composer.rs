//! Viewport style resolution and scoped CSS generation.
//!
//! All computation here is pure: merging layers, mapping style-category
//! fields to CSS declarations, and rendering one scoped CSS text per
//! instance. The side-effecting write to a live document lives behind
//! [`crate::style::inject::StyleTarget`].

use serde_json::{Map, Value};

use crate::content::BlockStyles;

use super::validator::{CssFinding, validate_classes, validate_custom_css, validate_inline_styles};

/// Widest width (inclusive) at which tablet overrides apply.
pub const TABLET_MAX_WIDTH: u32 = 767;
/// Widest width (inclusive) at which mobile overrides apply.
pub const MOBILE_MAX_WIDTH: u32 = 479;

/// Viewport breakpoint, classified by fixed width thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    /// Classify a viewport width: `< 480` mobile, `< 768` tablet, else
    /// desktop.
    pub fn classify(width: u32) -> Self {
        if width <= MOBILE_MAX_WIDTH {
            Breakpoint::Mobile
        } else if width <= TABLET_MAX_WIDTH {
            Breakpoint::Tablet
        } else {
            Breakpoint::Desktop
        }
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Where both sides hold plain key-value objects the merge recurses
/// key-by-key; any other pairing replaces the base value wholesale. A
/// shallow scalar override therefore always wins outright, while nested
/// style-category objects merge field-by-field.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Resolve the effective style object for one viewport.
///
/// Desktop is the base layer. Tablet layers on top for tablet and mobile
/// viewports, and mobile layers on top of that for mobile — the same
/// cascade the generated max-width media queries produce in a browser.
pub fn resolve_effective(styles: &BlockStyles, breakpoint: Breakpoint) -> Map<String, Value> {
    let mut effective = styles.desktop.clone().unwrap_or_default();
    if matches!(breakpoint, Breakpoint::Tablet | Breakpoint::Mobile)
        && let Some(tablet) = &styles.tablet
    {
        deep_merge(&mut effective, tablet);
    }
    if breakpoint == Breakpoint::Mobile
        && let Some(mobile) = &styles.mobile
    {
        deep_merge(&mut effective, mobile);
    }
    effective
}

/// The stable attribute selector scoping one instance's CSS.
///
/// Instance ids are normally uuids, but the wire format does not enforce
/// that, so `\` and `"` are escaped to keep a hostile id inside the
/// attribute string.
pub fn scope_selector(instance_id: &str) -> String {
    let escaped = instance_id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[data-block-id=\"{escaped}\"]")
}

// Style-category fields and the CSS properties they map to. Only fields
// present in the resolved style emit declarations; there are no forced
// defaults at this layer.
const CATEGORY_FIELDS: &[(&str, &[(&str, &str)])] = &[
    (
        "background",
        &[
            ("color", "background-color"),
            ("image", "background-image"),
            ("size", "background-size"),
            ("position", "background-position"),
            ("repeat", "background-repeat"),
        ],
    ),
    (
        "typography",
        &[
            ("color", "color"),
            ("size", "font-size"),
            ("weight", "font-weight"),
            ("family", "font-family"),
            ("style", "font-style"),
            ("lineHeight", "line-height"),
            ("letterSpacing", "letter-spacing"),
            ("align", "text-align"),
            ("transform", "text-transform"),
            ("decoration", "text-decoration"),
        ],
    ),
    (
        "spacing",
        &[
            ("margin", "margin"),
            ("marginTop", "margin-top"),
            ("marginRight", "margin-right"),
            ("marginBottom", "margin-bottom"),
            ("marginLeft", "margin-left"),
            ("padding", "padding"),
            ("paddingTop", "padding-top"),
            ("paddingRight", "padding-right"),
            ("paddingBottom", "padding-bottom"),
            ("paddingLeft", "padding-left"),
        ],
    ),
    (
        "border",
        &[
            ("width", "border-width"),
            ("style", "border-style"),
            ("color", "border-color"),
            ("radius", "border-radius"),
        ],
    ),
    (
        "layout",
        &[
            ("display", "display"),
            ("direction", "flex-direction"),
            ("wrap", "flex-wrap"),
            ("justify", "justify-content"),
            ("align", "align-items"),
            ("gap", "gap"),
            ("overflow", "overflow"),
            ("zIndex", "z-index"),
        ],
    ),
    (
        "size",
        &[
            ("width", "width"),
            ("height", "height"),
            ("minWidth", "min-width"),
            ("maxWidth", "max-width"),
            ("minHeight", "min-height"),
            ("maxHeight", "max-height"),
        ],
    ),
];

fn css_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Render one resolved style object to a semicolon-joined declaration list.
pub fn declarations(style: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for (category, fields) in CATEGORY_FIELDS {
        let Some(Value::Object(values)) = style.get(*category) else {
            continue;
        };
        for (field, css_property) in *fields {
            if let Some(value) = values.get(*field).and_then(css_value) {
                parts.push(format!("{css_property}: {value}"));
            }
        }
    }
    parts.join("; ")
}

/// Everything the renderer needs to apply one instance's styles.
#[derive(Debug, Clone, Default)]
pub struct ComposedStyle {
    /// Scoped CSS text to install for this instance. Empty when the
    /// instance produces no CSS.
    pub css_text: String,
    /// Sanitized class list for the block wrapper.
    pub classes: String,
    /// Validation findings from the free-form style fields.
    pub findings: Vec<CssFinding>,
}

/// Compose the full scoped CSS text for one instance.
///
/// The base rule carries the desktop declarations plus sanitized inline
/// styles; tablet and mobile overrides are wrapped in max-width media
/// queries; sanitized custom CSS is appended under the same scope selector
/// as a weak form of scoping (nested selectors inside it are the author's
/// responsibility).
pub fn compose(instance_id: &str, styles: &BlockStyles) -> ComposedStyle {
    let scope = scope_selector(instance_id);
    let mut findings = Vec::new();
    let mut sections = Vec::new();

    let mut base = styles.desktop.as_ref().map(declarations).unwrap_or_default();
    if let Some(inline) = &styles.inline_styles {
        let result = validate_inline_styles(inline);
        findings.extend(result.findings);
        let sanitized = result.sanitized_value.trim().trim_end_matches(';').trim();
        if !sanitized.is_empty() {
            if base.is_empty() {
                base = sanitized.to_string();
            } else {
                base = format!("{base}; {sanitized}");
            }
        }
    }
    if !base.is_empty() {
        sections.push(format!("{scope} {{ {base} }}"));
    }

    for (layer, max_width) in [
        (&styles.tablet, TABLET_MAX_WIDTH),
        (&styles.mobile, MOBILE_MAX_WIDTH),
    ] {
        if let Some(layer) = layer {
            let decls = declarations(layer);
            if !decls.is_empty() {
                sections.push(format!(
                    "@media (max-width: {max_width}px) {{ {scope} {{ {decls} }} }}"
                ));
            }
        }
    }

    if let Some(custom) = &styles.custom_css {
        let result = validate_custom_css(custom);
        findings.extend(result.findings);
        let sanitized = result.sanitized_value.trim();
        if !sanitized.is_empty() {
            sections.push(format!("{scope} {{ {sanitized} }}"));
        }
    }

    let classes = match &styles.custom_classes {
        Some(raw) => {
            let result = validate_classes(raw);
            findings.extend(result.findings);
            result.sanitized_value
        }
        None => String::new(),
    };

    ComposedStyle {
        css_text: sections.join("\n"),
        classes,
        findings,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn styles(value: Value) -> BlockStyles {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn classify_fixed_thresholds() {
        assert_eq!(Breakpoint::classify(0), Breakpoint::Mobile);
        assert_eq!(Breakpoint::classify(479), Breakpoint::Mobile);
        assert_eq!(Breakpoint::classify(480), Breakpoint::Tablet);
        assert_eq!(Breakpoint::classify(767), Breakpoint::Tablet);
        assert_eq!(Breakpoint::classify(768), Breakpoint::Desktop);
        assert_eq!(Breakpoint::classify(1920), Breakpoint::Desktop);
    }

    #[test]
    fn deep_merge_is_field_level_for_objects() {
        let mut base = map(json!({ "typography": { "color": "black", "size": "16px" } }));
        let overlay = map(json!({ "typography": { "color": "red" } }));
        deep_merge(&mut base, &overlay);
        assert_eq!(base["typography"]["color"], json!("red"));
        assert_eq!(base["typography"]["size"], json!("16px"));
    }

    #[test]
    fn deep_merge_replaces_scalars_and_arrays_wholesale() {
        let mut base = map(json!({ "gap": "8px", "stops": [1, 2] }));
        let overlay = map(json!({ "gap": "4px", "stops": [3] }));
        deep_merge(&mut base, &overlay);
        assert_eq!(base["gap"], json!("4px"));
        assert_eq!(base["stops"], json!([3]));
    }

    #[test]
    fn mobile_resolution_merges_through_layers() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "black", "size": "16px" } },
            "mobile": { "typography": { "color": "red" } }
        }));
        let effective = resolve_effective(&styles, Breakpoint::Mobile);
        assert_eq!(effective["typography"]["color"], json!("red"));
        assert_eq!(effective["typography"]["size"], json!("16px"));
    }

    #[test]
    fn tablet_layer_not_applied_on_desktop() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "black" } },
            "tablet": { "typography": { "color": "blue" } }
        }));
        let effective = resolve_effective(&styles, Breakpoint::Desktop);
        assert_eq!(effective["typography"]["color"], json!("black"));
    }

    #[test]
    fn mobile_inherits_tablet_overrides() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "black", "size": "16px" } },
            "tablet": { "typography": { "size": "14px" } },
            "mobile": { "typography": { "color": "red" } }
        }));
        let effective = resolve_effective(&styles, Breakpoint::Mobile);
        assert_eq!(effective["typography"]["size"], json!("14px"));
        assert_eq!(effective["typography"]["color"], json!("red"));
    }

    #[test]
    fn declarations_only_for_present_fields() {
        let style = map(json!({
            "typography": { "color": "red" },
            "spacing": { "paddingTop": "8px" },
            "size": {}
        }));
        let decls = declarations(&style);
        assert_eq!(decls, "color: red; padding-top: 8px");
    }

    #[test]
    fn unknown_category_fields_contribute_nothing() {
        let style = map(json!({
            "typography": { "color": "red", "blink": "fast" },
            "mystery": { "x": "y" }
        }));
        assert_eq!(declarations(&style), "color: red");
    }

    #[test]
    fn compose_scopes_by_instance_attribute() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "red" } }
        }));
        let composed = compose("b1", &styles);
        assert_eq!(composed.css_text, "[data-block-id=\"b1\"] { color: red }");
        assert!(composed.findings.is_empty());
    }

    #[test]
    fn scope_selector_escapes_hostile_ids() {
        assert_eq!(
            scope_selector("b\"] * { } [x=\""),
            "[data-block-id=\"b\\\"] * { } [x=\\\"\"]"
        );
        assert_eq!(scope_selector("a\\b"), "[data-block-id=\"a\\\\b\"]");

        // A quote-bearing id stays inside the attribute string end to end.
        let styles = styles(json!({
            "desktop": { "typography": { "color": "red" } }
        }));
        let composed = compose("b\"1", &styles);
        assert_eq!(
            composed.css_text,
            "[data-block-id=\"b\\\"1\"] { color: red }"
        );
    }

    #[test]
    fn compose_wraps_overrides_in_media_queries() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "black" } },
            "tablet": { "typography": { "size": "14px" } },
            "mobile": { "typography": { "color": "red" } }
        }));
        let composed = compose("b1", &styles);
        assert!(composed.css_text.contains("@media (max-width: 767px)"));
        assert!(composed.css_text.contains("@media (max-width: 479px)"));
        assert!(composed.css_text.contains("font-size: 14px"));
    }

    #[test]
    fn compose_appends_sanitized_inline_styles_to_base_rule() {
        let styles = styles(json!({
            "desktop": { "typography": { "color": "black" } },
            "inlineStyles": "letter-spacing: 1px; background:url(javascript:alert(1))"
        }));
        let composed = compose("b1", &styles);
        assert!(composed.css_text.contains("color: black; letter-spacing: 1px"));
        assert!(!composed.css_text.to_lowercase().contains("javascript:"));
        assert!(composed.findings.iter().any(|f| f.message.contains("javascript")));
    }

    #[test]
    fn compose_appends_custom_css_under_scope() {
        let styles = styles(json!({
            "customCss": "opacity: 0.5"
        }));
        let composed = compose("b1", &styles);
        assert_eq!(composed.css_text, "[data-block-id=\"b1\"] { opacity: 0.5 }");
    }

    #[test]
    fn compose_sanitizes_classes() {
        let styles = styles(json!({
            "customClasses": "hero -1bad wide"
        }));
        let composed = compose("b1", &styles);
        assert_eq!(composed.classes, "hero wide");
        assert!(composed.css_text.is_empty());
        assert_eq!(composed.findings.len(), 1);
    }

    #[test]
    fn compose_empty_styles_produce_nothing() {
        let composed = compose("b1", &BlockStyles::default());
        assert!(composed.css_text.is_empty());
        assert!(composed.classes.is_empty());
        assert!(composed.findings.is_empty());
    }
}
