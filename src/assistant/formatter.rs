//! Formatting of text returned by the generative endpoint
//!
//! A response is first classified into a [`ParsedInsightPayload`] by an
//! explicit shape check over the JSON value, then rendered into a display
//! string. Anything that is not JSON goes through a fixed cleanup pipeline.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Separator between rendered insight blocks
pub const DIVIDER: &str = "\n\n───────────────\n\n";

/// Glyphs that mark a bullet line as already decorated
const BULLET_GLYPHS: &[&str] = &["💡", "✨", "⚠", "✅", "ℹ", "💫", "🎯", "🎉", "💪"];

/// One insight in a JSON response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalInsight {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
}

/// Shape of a generated response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInsightPayload {
    /// A bare JSON array of insights
    ListForm(Vec<ExternalInsight>),
    /// `{"insights": [...]}`
    WrappedForm(Vec<ExternalInsight>),
    /// Any other JSON document, flattened to top-level `key: value` pairs
    Fields(Vec<(String, String)>),
    FreeformText(String),
}

/// Parse and render in one step
pub fn format_external_text(raw: &str) -> String {
    render(&parse_payload(raw))
}

/// Classify a raw response
pub fn parse_payload(raw: &str) -> ParsedInsightPayload {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => return ParsedInsightPayload::FreeformText(raw.to_string()),
    };

    match value {
        Value::Array(items) => match insight_list(&items) {
            Some(insights) => ParsedInsightPayload::ListForm(insights),
            None => ParsedInsightPayload::Fields(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), field_text(v)))
                    .collect(),
            ),
        },
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("insights") {
                if let Some(insights) = insight_list(items) {
                    return ParsedInsightPayload::WrappedForm(insights);
                }
            }
            ParsedInsightPayload::Fields(map.iter().map(|(k, v)| (k.clone(), field_text(v))).collect())
        }
        _ => ParsedInsightPayload::FreeformText(raw.to_string()),
    }
}

/// Render a classified payload for display
pub fn render(payload: &ParsedInsightPayload) -> String {
    match payload {
        ParsedInsightPayload::ListForm(insights) => insights
            .iter()
            .map(|insight| render_block("✨", insight))
            .collect::<Vec<_>>()
            .join(DIVIDER),
        ParsedInsightPayload::WrappedForm(insights) => insights
            .iter()
            .map(|insight| render_block(type_prefix(insight.kind.as_deref()), insight))
            .collect::<Vec<_>>()
            .join(DIVIDER),
        ParsedInsightPayload::Fields(fields) => fields
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n"),
        ParsedInsightPayload::FreeformText(text) => clean_free_text(text),
    }
}

fn insight_list(items: &[Value]) -> Option<Vec<ExternalInsight>> {
    items
        .iter()
        .map(|item| {
            if !item.is_object() {
                return None;
            }
            serde_json::from_value::<ExternalInsight>(item.clone()).ok()
        })
        .collect()
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Prefix for the wrapped form; it carries its own trailing space, so the
/// title ends up two spaces after the glyph
fn type_prefix(kind: Option<&str>) -> &'static str {
    match kind {
        Some("warning") => "⚠️ ",
        Some("success") => "✅ ",
        Some("info") => "ℹ️ ",
        _ => "💫 ",
    }
}

fn render_block(glyph: &str, insight: &ExternalInsight) -> String {
    let mut block = format!("{} {}\n\n{}", glyph, insight.title, insight.description);
    if let Some(rec) = &insight.recommendation {
        block.push_str("\n\n💡 Recommendation:\n");
        block.push_str(rec);
    }
    block
}

struct CleanupPatterns {
    markup: Regex,
    link: Regex,
    blank_lines: Regex,
    horizontal_space: Regex,
    indent: Regex,
    bullet: Regex,
    numbered: Regex,
    section: Regex,
    excess_breaks: Regex,
    greeting: Regex,
}

fn cleanup_patterns() -> Option<&'static CleanupPatterns> {
    static PATTERNS: OnceLock<Option<CleanupPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(CleanupPatterns {
                markup: Regex::new(r"[*_~`#]").ok()?,
                link: Regex::new(r"\[(.*?)\]\(.*?\)").ok()?,
                blank_lines: Regex::new(r"\n(?:[^\S\n]*\n){2,}").ok()?,
                horizontal_space: Regex::new(r"[^\S\n]+").ok()?,
                indent: Regex::new(r"\n +").ok()?,
                bullet: Regex::new(r"(?m)^[-•*+][^\S\n]*").ok()?,
                numbered: Regex::new(r"(?m)^\d+\.[^\S\n]+").ok()?,
                section: Regex::new(r"(?m)^(Tips|Steps|Benefits|Note|Remember):[^\S\n]*").ok()?,
                excess_breaks: Regex::new(r"\n{3,}").ok()?,
                greeting: Regex::new(r"(?i)\b(hello|hi)\b").ok()?,
            })
        })
        .as_ref()
}

/// Free-text cleanup pipeline
fn clean_free_text(raw: &str) -> String {
    let Some(p) = cleanup_patterns() else {
        return raw.trim().to_string();
    };

    let text = raw.replace("\r\n", "\n");
    let text = p.markup.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");

    let text = p.blank_lines.replace_all(&text, "\n\n");
    let text = p.horizontal_space.replace_all(&text, " ");
    let text = p.indent.replace_all(&text, "\n");

    let text = p.bullet.replace_all(&text, "• ");
    let text = p.numbered.replace_all(&text, "• ");
    let text = decorate_bullets(&text);

    let text = p.section.replace_all(&text, "\n\n💡 $1:\n\n");

    let text = p.excess_breaks.replace_all(text.trim(), "\n\n").into_owned();

    if p.greeting.is_match(&text) {
        format!("👋 {}", text)
    } else {
        text
    }
}

fn decorate_bullets(text: &str) -> String {
    text.split('\n')
        .map(|line| match line.strip_prefix("• ") {
            Some(rest) if !rest.is_empty() && !BULLET_GLYPHS.iter().any(|g| rest.starts_with(g)) => {
                format!("• 💫 {}", rest)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_form_uses_type_glyph() {
        let out = format_external_text(r#"{"insights":[{"type":"warning","title":"T","description":"D"}]}"#);
        assert!(out.contains("⚠️"));
        assert!(out.contains('T'));
        assert!(out.contains('D'));
        assert_eq!(out, "⚠️  T\n\nD");
    }

    #[test]
    fn test_wrapped_form_unknown_type_falls_back() {
        let out = format_external_text(r#"{"insights":[{"type":"tip","title":"T","description":"D"}]}"#);
        assert!(out.starts_with("💫  T"));
    }

    #[test]
    fn test_list_form_blocks_are_divided() {
        let raw = r#"[
            {"title":"Sleep","description":"More rest","recommendation":"Go to bed at 10"},
            {"title":"Water","description":"Drink up"}
        ]"#;
        let out = format_external_text(raw);
        assert_eq!(
            out,
            "✨ Sleep\n\nMore rest\n\n💡 Recommendation:\nGo to bed at 10\n\n───────────────\n\n✨ Water\n\nDrink up"
        );
    }

    #[test]
    fn test_other_json_renders_fields() {
        let out = format_external_text(r#"{"answer":"yes","score":3}"#);
        assert_eq!(out, "answer: yes\nscore: 3");

        // insights that do not conform fall back to fields
        let payload = parse_payload(r#"{"insights":[{"title":"only a title"}]}"#);
        assert!(matches!(payload, ParsedInsightPayload::Fields(_)));
    }

    #[test]
    fn test_non_conforming_array_is_keyed_by_index() {
        assert_eq!(
            parse_payload(r#"["a", 2]"#),
            ParsedInsightPayload::Fields(vec![
                ("0".to_string(), "a".to_string()),
                ("1".to_string(), "2".to_string())
            ])
        );
    }

    #[test]
    fn test_scalar_json_is_free_text() {
        assert_eq!(parse_payload("42"), ParsedInsightPayload::FreeformText("42".to_string()));
    }

    #[test]
    fn test_plain_bullets_get_glyph() {
        let out = format_external_text("- eat well\n- sleep more");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("• 💫 ")));
    }

    #[test]
    fn test_indented_first_bullet_is_left_alone() {
        // Indentation is only stripped after a line break
        let out = format_external_text("  - first\n  - second");
        assert_eq!(out, "- first\n• 💫 second");
    }

    #[test]
    fn test_numbered_list_and_existing_glyph() {
        let out = format_external_text("1. Walk daily\n2. 💪 Lift weights");
        assert_eq!(out, "• 💫 Walk daily\n• 💪 Lift weights");
    }

    #[test]
    fn test_markdown_and_links_are_stripped() {
        let out = format_external_text("## Plan\n**Stretch** with [this guide](https://example.com)");
        assert_eq!(out, "Plan\nStretch with this guide");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let out = format_external_text("Rest   well.\n\n\n\n   Drink\twater.");
        assert_eq!(out, "Rest well.\n\nDrink water.");
    }

    #[test]
    fn test_section_header_is_spaced() {
        let out = format_external_text("Stay active.\nTips: move every hour");
        assert_eq!(out, "Stay active.\n\n💡 Tips:\n\nmove every hour");
    }

    #[test]
    fn test_greeting_is_whole_word() {
        assert!(format_external_text("Hi there!").starts_with("👋 Hi there!"));
        assert!(format_external_text("Say hello to better sleep").starts_with("👋 "));
        assert!(!format_external_text("This is high intensity").starts_with("👋"));
    }

    #[test]
    fn test_formatter_is_not_idempotent() {
        let once = format_external_text("Hi, drink water");
        let twice = format_external_text(&once);
        assert_eq!(once, "👋 Hi, drink water");
        assert_eq!(twice, "👋 👋 Hi, drink water");
    }
}
