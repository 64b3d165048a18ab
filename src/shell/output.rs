use colored::{Color, Colorize};

pub const BANNER: &str = "|--------------Welcome to the In-Memory File System--------------|";

/// Applies `color` to `text` when coloring is enabled.
pub fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

/// Renders names as a bracketed, quoted list: `['a', 'b']`.
pub fn format_listing(names: &[String]) -> String {
    let quoted = names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{quoted}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_bracketed_and_quoted() {
        assert_eq!(format_listing(&[]), "[]");
        assert_eq!(
            format_listing(&["a".to_string(), "b c".to_string()]),
            "['a', 'b c']"
        );
    }

    #[test]
    fn paint_is_plain_when_disabled() {
        assert_eq!(paint("text", Color::Red, false), "text");
    }

    #[test]
    fn paint_wraps_text_when_enabled() {
        colored::control::set_override(true);
        let painted = paint("text", Color::Yellow, true);
        assert!(painted.contains("text"));
        assert_ne!(painted, "text");
    }
}
