//! Built-in fenced-code handlers.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

/// Render CSV text as an HTML table: first record becomes the header
/// row, remaining records the body. Fields are trimmed, cell text is
/// escaped, and short rows are padded by the flexible reader.
pub fn csv_table(content: &str) -> Result<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut html = String::from("<table>\n");
    let mut saw_header = false;
    for record in reader.records() {
        let record = record.context("malformed CSV row")?;
        let tag = if saw_header { "td" } else { "th" };
        html.push_str("<tr>");
        for field in &record {
            let _ = write!(html, "<{tag}>{}</{tag}>", super::escape_html(field));
        }
        html.push_str("</tr>\n");
        saw_header = true;
    }
    html.push_str("</table>");
    anyhow::ensure!(saw_header, "empty CSV block");
    Ok(html)
}
