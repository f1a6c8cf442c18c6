//! Fixed-width ASCII waterfall of the first requests of a page load

use crate::checks::performance::browser::{NetworkEntry, ResourceType};
use url::Url;

const MAX_ROWS: usize = 30;
const LABEL_WIDTH: usize = 40;
const MAX_LABEL_CHARS: usize = 35;
const CHART_WIDTH: f64 = 50.0;

fn bar_glyph(kind: ResourceType) -> char {
    match kind {
        ResourceType::Script => '▓',
        ResourceType::Stylesheet => '▒',
        ResourceType::Image => '░',
        ResourceType::Font => '▄',
        _ => '█',
    }
}

/// Path of the resource, shortened to fit the label column
fn label(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    let path = if path.is_empty() { "/".to_string() } else { path };

    if path.chars().count() > MAX_LABEL_CHARS {
        let head: String = path.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        path
    }
}

/// Renders the waterfall as a fenced code block
///
/// Requests are ordered by start time. Bars are scaled to the span from the
/// earliest start to the latest end over all requests; only the first 30
/// rows are drawn.
pub fn render_waterfall(entries: &[NetworkEntry]) -> String {
    if entries.is_empty() {
        return "No resources captured.".to_string();
    }

    let mut sorted: Vec<&NetworkEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

    let base = sorted[0].start_ms;
    let max_end = sorted.iter().map(|e| e.end_ms).fold(f64::MIN, f64::max);
    let total = max_end - base;

    let mut chart = String::from("```\n");
    chart.push_str("WATERFALL CHART (first 30 resources)\n");
    chart.push_str(&"═".repeat(80));
    chart.push('\n');
    chart.push_str(&format!("{:<width$} │ Timeline\n", "Resource", width = LABEL_WIDTH));
    chart.push_str(&"─".repeat(LABEL_WIDTH));
    chart.push_str("─┼");
    chart.push_str(&"─".repeat(CHART_WIDTH as usize + 5));
    chart.push('\n');

    for entry in sorted.iter().take(MAX_ROWS) {
        let (offset, length) = if total > 0.0 {
            (
                (entry.start_ms - base) / total * CHART_WIDTH,
                (entry.duration_ms() / total * CHART_WIDTH).max(1.0),
            )
        } else {
            (0.0, 1.0)
        };

        let padding = " ".repeat(offset.round().max(0.0) as usize);
        let bar: String = std::iter::repeat(bar_glyph(entry.resource_type))
            .take((length.round() as usize).max(1))
            .collect();

        chart.push_str(&format!(
            "{:<width$} │ {}{} {}ms\n",
            label(&entry.url),
            padding,
            bar,
            entry.duration_ms() as u64,
            width = LABEL_WIDTH
        ));
    }

    chart.push_str(&"═".repeat(80));
    chart.push('\n');
    chart.push_str("Legend: █ Document  ▓ Script  ▒ Stylesheet  ░ Image  ▄ Font\n");
    chart.push_str("```");
    chart
}
