//! Rendering of venue records into a Telegram HTML message.

use std::fmt::Write;

use teloxide::utils::html::escape;

use super::VenueRecord;

/// Renders a header line followed by one bulleted link per record.
///
/// The output uses Telegram's HTML parse mode. Names keep their
/// whitespace; only markup characters are escaped.
#[must_use]
pub fn render_listings(header: &str, records: &[VenueRecord]) -> String {
    let mut out = format!("{}\n\n", escape(header));

    for record in records {
        let _ = writeln!(
            out,
            "• <a href=\"{}\">{}</a>",
            escape(&record.link),
            escape(&record.name)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lines_in_order() {
        let records = vec![
            VenueRecord::new("Alpha", "https://example.com/a"),
            VenueRecord::new("Beta", "https://example.com/b"),
        ];
        let text = render_listings("Best places:", &records);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Best places:");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "• <a href=\"https://example.com/a\">Alpha</a>");
        assert_eq!(lines[3], "• <a href=\"https://example.com/b\">Beta</a>");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_render_escapes_names() {
        let records = vec![VenueRecord::new("Tom & <Jerry>", "https://example.com/?a=1&b=2")];
        let text = render_listings("Top", &records);
        assert!(text.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(text.contains("href=\"https://example.com/?a=1&amp;b=2\""));
    }

    #[test]
    fn test_render_keeps_name_whitespace() {
        let records = vec![VenueRecord::new(" keep  spaces ", "https://example.com/s")];
        let text = render_listings("Top", &records);
        assert!(text.contains("\"> keep  spaces </a>"));
    }
}
