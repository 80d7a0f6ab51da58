//! Plain-text rendering of an alert summary

use crate::notify::AlertSummary;
use std::fmt::Write;

/// Subject line naming every identifier with new matches
pub fn render_subject(summary: &AlertSummary) -> String {
    format!("VIN NEW MATCH: {}", summary.identifiers().join(", "))
}

/// Human-readable body listing new matches per identifier
///
/// ```text
/// New matches for VIN 1HGCM82633A004352 (found 1):
///
/// - 2003 Honda Accord
///   https://cars.example.com/listing/1
///   [bing] 2026-10-01T00:00:00Z
///   VIN 1HGCM82633A004352, clean title
/// ```
pub fn render_body(summary: &AlertSummary) -> String {
    let mut out = String::new();

    for (i, alert) in summary.alerts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "New matches for VIN {} (found {}):\n",
            alert.identifier,
            alert.matches.len()
        );

        for m in &alert.matches {
            let _ = writeln!(out, "- {}", m.title.as_deref().unwrap_or("(no title)"));
            let _ = writeln!(out, "  {}", m.url);

            let source = m.source.as_deref().unwrap_or("unknown");
            match m.date.as_deref() {
                Some(date) => {
                    let _ = writeln!(out, "  [{}] {}", source, date);
                }
                None => {
                    let _ = writeln!(out, "  [{}]", source);
                }
            }

            if let Some(snippet) = m.snippet.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "  {}", snippet);
            }
        }
    }

    out
}
