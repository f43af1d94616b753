//! Text helpers for wizard screens.
//!
//! Screens use pipe markup for color (`|r`, `|g`, `|y`, `|c`, `|w`, `|W`,
//! `|n` to reset, `||` for a literal pipe). Front ends convert or strip it.

use protoforge_types::prototype::{AttrSpec, Prototype, TagSpec};

use crate::service::protfunc::{json_type_name, ProtfuncParser};

/// Appended to values cut short by [`crop`].
pub const CROP_SUFFIX: &str = "[...]";

/// Color codes recognized after a `|`.
const MARKUP_CODES: &str = "rgybmcwxnRGYBMCWXhHu";

/// Crop `text` to `width` characters, marking the cut with `[...]`.
pub fn crop(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let suffix_len = CROP_SUFFIX.chars().count();
    if suffix_len >= width {
        text.chars().take(width).collect()
    } else {
        let head: String = text.chars().take(width - suffix_len).collect();
        format!("{head}{CROP_SUFFIX}")
    }
}

/// Remove color markup, turning `||` into `|`.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '|' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('|') => {
                out.push('|');
                chars.next();
            }
            Some(code) if MARKUP_CODES.contains(*code) => {
                chars.next();
            }
            _ => out.push('|'),
        }
    }
    out
}

/// Escape user text so it is shown verbatim.
pub fn escape_markup(text: &str) -> String {
    text.replace('|', "||")
}

/// Last dotted component of a typeclass path.
pub fn path_cropper(path: &str) -> String {
    path.rsplit('.').next().unwrap_or(path).to_string()
}

/// Format a value for an index entry: ` (<value>|n)`.
///
/// Empty required values show a red `required`.
pub fn format_option_value(
    value: &str,
    required: bool,
    width: usize,
    cropper: Option<fn(&str) -> String>,
) -> String {
    let out = if value.is_empty() && required {
        "|rrequired".to_string()
    } else {
        let cropped = match cropper {
            Some(cropper) => crop(&cropper(value), width),
            None => crop(value, width),
        };
        escape_markup(&cropped)
    };
    format!(" ({out}|n)")
}

/// Multi-line rendering of a prototype: meta fields as a header, the rest
/// as sorted JSON.
pub fn prototype_to_str(prototype: &Prototype) -> String {
    let header = format!(
        "|cprototype key:|n {}, |ctags:|n {}, |clocks:|n {} \n|cdesc:|n {} \n|cprototype:|n ",
        escape_markup(prototype.prototype_key.as_deref().unwrap_or("")),
        escape_markup(&prototype.prototype_tags.join(", ")),
        escape_markup(prototype.prototype_locks.as_deref().unwrap_or("")),
        escape_markup(prototype.prototype_desc.as_deref().unwrap_or("")),
    );

    let mut body = serde_json::to_value(prototype)
        .ok()
        .and_then(|v| match v {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();
    body.retain(|key, _| !key.starts_with("prototype_") || key == "prototype_parent");

    let body = serde_json::to_string_pretty(&serde_json::Value::Object(body))
        .unwrap_or_else(|_| "{}".to_string());
    format!("{header}{}", escape_markup(&body))
}

/// Describe an attribute, including what its value parses to.
pub fn display_attribute(attr: &AttrSpec, parser: &dyn ProtfuncParser) -> String {
    let parsed = parser.parse(&attr.value, None, true);
    let value = match &parsed.value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "Attribute key: '{}' (category: {}, locks: {})\nValue (parsed to {}): {}",
        attr.key,
        attr.category.as_deref().unwrap_or("none"),
        attr.locks,
        json_type_name(&parsed.value),
        value
    )
}

/// Describe a tag.
pub fn display_tag(tag: &TagSpec) -> String {
    let data = if tag.data.is_empty() {
        String::new()
    } else {
        format!(", data: {}", tag.data)
    };
    format!(
        "Tag: '{}' (category: {}{})",
        tag.tag,
        tag.category.as_deref().unwrap_or("none"),
        data
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::protfunc::ParseOutcome;

    struct Literal;

    impl ProtfuncParser for Literal {
        fn parse(&self, value: &str, _prototype: Option<&Prototype>, _testing: bool) -> ParseOutcome {
            ParseOutcome {
                value: serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.to_string())),
                warning: None,
            }
        }
    }

    #[test]
    fn test_crop_short_text_untouched() {
        assert_eq!(crop("sword", 15), "sword");
    }

    #[test]
    fn test_crop_long_text_gets_suffix() {
        assert_eq!(crop("a very long sword name", 15), "a very lon[...]");
        assert_eq!(crop("a very long sword name", 15).chars().count(), 15);
    }

    #[test]
    fn test_crop_width_smaller_than_suffix() {
        assert_eq!(crop("abcdefgh", 3), "abc");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("|rred|n and |wwhite|W"), "red and white");
        assert_eq!(strip_markup("a || b"), "a | b");
        assert_eq!(strip_markup("pipe at end |"), "pipe at end |");
        assert_eq!(strip_markup("|zunknown"), "|zunknown");
    }

    #[test]
    fn test_escape_markup_survives_strip() {
        assert_eq!(strip_markup(&escape_markup("a|rb")), "a|rb");
    }

    #[test]
    fn test_path_cropper() {
        assert_eq!(path_cropper("typeclasses.objects.Object"), "Object");
        assert_eq!(path_cropper("Object"), "Object");
    }

    #[test]
    fn test_format_option_value_required() {
        assert_eq!(format_option_value("", true, 15, None), " (|rrequired|n)");
        assert_eq!(format_option_value("", false, 15, None), " (|n)");
    }

    #[test]
    fn test_format_option_value_uses_cropper() {
        let out = format_option_value("typeclasses.objects.Object", false, 15, Some(path_cropper));
        assert_eq!(out, " (Object|n)");
    }

    #[test]
    fn test_prototype_to_str_separates_meta_fields() {
        let proto = Prototype {
            prototype_key: Some("lamp".to_string()),
            prototype_tags: vec!["light".to_string(), "item".to_string()],
            prototype_parent: Some("base".to_string()),
            key: Some("brass lamp".to_string()),
            ..Default::default()
        };
        let text = strip_markup(&prototype_to_str(&proto));
        assert!(text.starts_with("prototype key: lamp, tags: light, item, locks:"));
        assert!(text.contains("\"key\": \"brass lamp\""));
        assert!(text.contains("\"prototype_parent\": \"base\""));
        assert!(!text.contains("\"prototype_key\""));
    }

    #[test]
    fn test_display_attribute_reports_parsed_type() {
        let attr = AttrSpec {
            key: "strength".to_string(),
            value: "12".to_string(),
            category: Some("stats".to_string()),
            locks: String::new(),
        };
        let text = display_attribute(&attr, &Literal);
        assert_eq!(
            text,
            "Attribute key: 'strength' (category: stats, locks: )\nValue (parsed to int): 12"
        );
    }

    #[test]
    fn test_display_tag_with_and_without_data() {
        let mut tag = TagSpec {
            tag: "weapon".to_string(),
            category: None,
            data: String::new(),
        };
        assert_eq!(display_tag(&tag), "Tag: 'weapon' (category: none)");
        tag.data = "sharp".to_string();
        assert_eq!(display_tag(&tag), "Tag: 'weapon' (category: none, data: sharp)");
    }
}
