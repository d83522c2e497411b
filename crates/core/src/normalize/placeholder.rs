//! Placeholder product images.
//!
//! Produces a self-contained SVG data URI from a product name so every cached
//! record has an image without a network fetch. Output is a pure function of
//! the name.

use base64::{Engine as _, engine::general_purpose};

/// Background colours, indexed by the first UTF-16 code unit of the name.
const PALETTE: &[&str] = &["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F"];

/// Substring to glyph table, scanned in order against the lowercased name.
const GLYPHS: &[(&str, &str)] = &[
    ("milk", "🥛"),
    ("cheese", "🧀"),
    ("yogurt", "🥄"),
    ("butter", "🧈"),
    ("egg", "🥚"),
    ("bread", "🍞"),
    ("chicken", "🍗"),
    ("beef", "🥩"),
    ("pork", "🥓"),
    ("fish", "🐟"),
    ("apple", "🍎"),
    ("banana", "🍌"),
    ("orange", "🍊"),
    ("tomato", "🍅"),
    ("carrot", "🥕"),
    ("potato", "🥔"),
    ("rice", "🍚"),
    ("pasta", "🍝"),
    ("cereal", "🥣"),
    ("coffee", "☕"),
    ("tea", "🍵"),
    ("juice", "🧃"),
    ("water", "💧"),
    ("cookie", "🍪"),
    ("chocolate", "🍫"),
];

const FALLBACK_GLYPH: &str = "🛒";

/// Characters of the name kept in the label.
const LABEL_CHARS: usize = 15;

/// Background colour for a name.
///
/// Only the first character participates, so names sharing a first
/// character share a colour.
pub fn background_color(name: &str) -> &'static str {
    let code = name.encode_utf16().next().map(usize::from).unwrap_or(0);
    PALETTE[code % PALETTE.len()]
}

/// Glyph for the first table entry whose key occurs in the lowercased name.
pub fn glyph_for(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    GLYPHS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, glyph)| *glyph)
        .unwrap_or(FALLBACK_GLYPH)
}

/// Build the placeholder image for a product name as a data URI.
pub fn placeholder_image(name: &str) -> String {
    let label: String = name.chars().take(LABEL_CHARS).collect();
    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200">"#,
            r#"<rect width="200" height="200" fill="{color}"/>"#,
            r#"<text x="100" y="95" font-size="64" text-anchor="middle" dominant-baseline="middle">{glyph}</text>"#,
            r##"<text x="100" y="165" font-family="sans-serif" font-size="14" fill="#FFFFFF" text-anchor="middle">{label}</text>"##,
            "</svg>"
        ),
        color = background_color(name),
        glyph = glyph_for(name),
        label = escape_xml(&label),
    );

    format!("data:image/svg+xml;base64,{}", general_purpose::STANDARD.encode(svg))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_svg(uri: &str) -> String {
        let encoded = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        String::from_utf8(general_purpose::STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        assert_eq!(placeholder_image("Whole Milk"), placeholder_image("Whole Milk"));
    }

    #[test]
    fn test_color_depends_on_first_char_only() {
        assert_eq!(background_color("Whole Milk"), background_color("Wheat Bread"));
        // 'W' is 87, 87 % 8 == 7
        assert_eq!(background_color("Whole Milk"), PALETTE[7]);
        // 'A' is 65, 65 % 8 == 1
        assert_eq!(background_color("Almond Milk"), PALETTE[1]);
    }

    #[test]
    fn test_empty_name_uses_first_color() {
        assert_eq!(background_color(""), PALETTE[0]);
        let svg = decode_svg(&placeholder_image(""));
        assert!(svg.contains(FALLBACK_GLYPH));
    }

    #[test]
    fn test_glyph_first_match_wins() {
        assert_eq!(glyph_for("Chicken Breast"), "🍗");
        assert_eq!(glyph_for("Chocolate MILK"), "🥛");
        assert_eq!(glyph_for("Paper Towels"), FALLBACK_GLYPH);
    }

    #[test]
    fn test_label_truncated_and_escaped() {
        let svg = decode_svg(&placeholder_image("Ben & Jerry's Cookie Dough"));
        assert!(svg.contains(">Ben &amp; Jerry&apos;s C</text>"));
        assert!(svg.contains("🍪"));
    }
}
