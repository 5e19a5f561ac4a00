//! Sanitization of untrusted style input.
//!
//! Authors can type arbitrary text into the inline-style, class-list, and
//! custom-CSS fields of any block, so everything here is a security
//! boundary. The contract for all three entry points: always return a
//! usable sanitized value, never panic, never block rendering. `is_valid`
//! is a derived summary for UI warning banners, not a gate.

use std::sync::LazyLock;

use regex::Regex;

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding, shown to the author in the editing UI.
#[derive(Debug, Clone)]
pub struct CssFinding {
    pub message: String,
    pub severity: Severity,
}

impl CssFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Result of validating one untrusted input.
#[derive(Debug, Clone)]
pub struct CssValidationResult {
    pub findings: Vec<CssFinding>,
    /// Input with every denylisted match stripped. Empty only if the input
    /// was empty or entirely invalid.
    pub sanitized_value: String,
}

impl CssValidationResult {
    /// True iff no finding has error severity.
    pub fn is_valid(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }

    /// Only the error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &CssFinding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }
}

// Known CSS injection vectors. Each match is stripped from the sanitized
// output and recorded as an error finding. The raw unicode escape pattern
// is broad on purpose: `\` + hex digit is a common obfuscation vector and
// legitimate authored CSS rarely needs it.
#[allow(clippy::expect_used)]
static DENYLIST: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let patterns: [(&str, &str); 9] = [
        (r"(?i)expression\s*\(", "CSS expression() is not allowed"),
        (r"(?i)javascript\s*:", "javascript: URLs are not allowed"),
        (r"(?i)behavior\s*:", "behavior: bindings are not allowed"),
        (r"(?i)-moz-binding\s*:", "-moz-binding is not allowed"),
        (
            r#"(?i)url\s*\(\s*["']?\s*data:\s*text/html"#,
            "data:text/html URLs are not allowed",
        ),
        (r"(?i)<\s*/?\s*script", "script tags are not allowed"),
        (r"(?i)<\s*/?\s*style", "style tags are not allowed"),
        (r"(?i)\bon\w+\s*=", "inline event handlers are not allowed"),
        (
            r"\\[0-9a-fA-F]",
            "unicode escape sequences are not allowed",
        ),
    ];
    patterns
        .into_iter()
        .map(|(pattern, message)| {
            (
                Regex::new(pattern).expect("denylist patterns are valid regexes"),
                message,
            )
        })
        .collect()
});

/// Strip every denylist match from `input`, recording one error finding per
/// matched pattern.
fn strip_denylisted(input: &str, findings: &mut Vec<CssFinding>) -> String {
    let mut sanitized = input.to_string();
    for (pattern, message) in DENYLIST.iter() {
        if pattern.is_match(&sanitized) {
            findings.push(CssFinding::error(*message));
            sanitized = pattern.replace_all(&sanitized, "").into_owned();
        }
    }
    sanitized
}

fn check_important(input: &str, findings: &mut Vec<CssFinding>) {
    if input.contains("!important") {
        findings.push(CssFinding::warning(
            "!important makes styles hard to override",
        ));
    }
}

/// Validate a free-form CSS declarations string (the contents of a style
/// attribute).
pub fn validate_inline_styles(raw: &str) -> CssValidationResult {
    let mut findings = Vec::new();
    let sanitized = strip_denylisted(raw, &mut findings);

    let open = sanitized.matches('(').count();
    let close = sanitized.matches(')').count();
    if open != close {
        findings.push(CssFinding::warning("unbalanced parentheses"));
    }
    check_important(&sanitized, &mut findings);

    CssValidationResult {
        findings,
        sanitized_value: sanitized,
    }
}

/// Validate a free-form block of CSS rules (selectors + declarations).
pub fn validate_custom_css(raw: &str) -> CssValidationResult {
    let mut findings = Vec::new();
    let sanitized = strip_denylisted(raw, &mut findings);

    let open = sanitized.matches('{').count();
    let close = sanitized.matches('}').count();
    if open != close {
        findings.push(CssFinding::warning("unbalanced braces"));
    }
    check_important(&sanitized, &mut findings);

    CssValidationResult {
        findings,
        sanitized_value: sanitized,
    }
}

#[allow(clippy::expect_used)]
static CLASS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("class token pattern is valid"));

/// Validate a whitespace-separated class-name list.
///
/// Invalid tokens are dropped; valid tokens are preserved, space-joined, in
/// their original relative order.
pub fn validate_classes(raw: &str) -> CssValidationResult {
    let mut findings = Vec::new();
    let mut kept = Vec::new();

    for token in raw.split_whitespace() {
        // A leading hyphen followed by a digit is reserved CSS identifier
        // syntax.
        let reserved = token.len() >= 2
            && token.starts_with('-')
            && token.as_bytes()[1].is_ascii_digit();
        if !reserved && CLASS_TOKEN.is_match(token) {
            kept.push(token);
        } else {
            findings.push(CssFinding::error(format!(
                "invalid class name '{token}' dropped"
            )));
        }
    }

    CssValidationResult {
        findings,
        sanitized_value: kept.join(" "),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn clean_inline_styles_pass_through() {
        let result = validate_inline_styles("color: red; padding: 4px");
        assert!(result.is_valid());
        assert!(result.findings.is_empty());
        assert_eq!(result.sanitized_value, "color: red; padding: 4px");
    }

    #[test]
    fn javascript_url_stripped_with_error() {
        let result = validate_inline_styles("color:red; background:url(javascript:alert(1))");
        assert!(!result.is_valid());
        assert!(result.errors().count() >= 1);
        assert!(!result.sanitized_value.to_lowercase().contains("javascript:"));
        assert!(result.sanitized_value.contains("color:red"));
    }

    #[test]
    fn expression_stripped() {
        let result = validate_inline_styles("width: expression(alert(1))");
        assert!(!result.is_valid());
        assert!(!result.sanitized_value.to_lowercase().contains("expression("));
    }

    #[test]
    fn behavior_and_moz_binding_stripped() {
        let result = validate_inline_styles("behavior: url(x.htc); -moz-binding: url(y.xml)");
        assert_eq!(result.errors().count(), 2);
        let lower = result.sanitized_value.to_lowercase();
        assert!(!lower.contains("behavior:"));
        assert!(!lower.contains("-moz-binding:"));
    }

    #[test]
    fn data_text_html_url_stripped() {
        let result = validate_custom_css(".x { background: url('data:text/html,<h1>x</h1>') }");
        assert!(!result.is_valid());
        assert!(!result.sanitized_value.contains("data:text/html"));
    }

    #[test]
    fn script_and_style_fragments_stripped() {
        let result = validate_custom_css("</style><script>alert(1)</script>");
        assert!(!result.is_valid());
        let lower = result.sanitized_value.to_lowercase();
        assert!(!lower.contains("<script"));
        assert!(!lower.contains("</style"));
    }

    #[test]
    fn event_handler_token_stripped() {
        let result = validate_inline_styles("color: red\" onmouseover=alert(1)");
        assert!(!result.is_valid());
        assert!(!result.sanitized_value.contains("onmouseover="));
    }

    #[test]
    fn unicode_escape_stripped() {
        let result = validate_inline_styles(r"color: \65 xpression(alert(1))");
        assert!(!result.is_valid());
        assert!(!result.sanitized_value.contains('\\'));
    }

    #[test]
    fn case_variants_still_caught() {
        let result = validate_inline_styles("background:url(JaVaScRiPt:alert(1))");
        assert!(!result.is_valid());
        assert!(!result.sanitized_value.to_lowercase().contains("javascript"));
    }

    #[test]
    fn unbalanced_parens_warn_only() {
        let result = validate_inline_styles("background: url(foo.png");
        assert!(result.is_valid(), "warnings must not flip is_valid");
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
    }

    #[test]
    fn unbalanced_braces_warn_only() {
        let result = validate_custom_css(".x { color: red");
        assert!(result.is_valid());
        assert!(
            result
                .findings
                .iter()
                .any(|f| f.message.contains("unbalanced braces"))
        );
    }

    #[test]
    fn important_is_a_quality_warning() {
        let result = validate_inline_styles("color: red !important");
        assert!(result.is_valid());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
        assert!(result.sanitized_value.contains("!important"));
    }

    #[test]
    fn valid_classes_preserved_in_order() {
        let result = validate_classes("hero  wide_block my-class");
        assert!(result.is_valid());
        assert_eq!(result.sanitized_value, "hero wide_block my-class");
    }

    #[test]
    fn invalid_class_dropped_with_error() {
        let result = validate_classes("ok-class -1bad");
        assert!(!result.is_valid());
        assert_eq!(result.sanitized_value, "ok-class");
        assert_eq!(result.errors().count(), 1);
        assert!(result.findings[0].message.contains("-1bad"));
    }

    #[test]
    fn class_with_disallowed_characters_dropped() {
        let result = validate_classes("fine bad<class> also.bad");
        assert_eq!(result.sanitized_value, "fine");
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn leading_hyphen_followed_by_letter_is_fine() {
        let result = validate_classes("-vendor-ish");
        assert!(result.is_valid());
        assert_eq!(result.sanitized_value, "-vendor-ish");
    }

    #[test]
    fn empty_input_yields_empty_valid_result() {
        for result in [
            validate_inline_styles(""),
            validate_custom_css(""),
            validate_classes(""),
        ] {
            assert!(result.is_valid());
            assert!(result.sanitized_value.is_empty());
            assert!(result.findings.is_empty());
        }
    }
}
