//! Plain-text table rendering

use crate::screener::Record;

/// Renders headers and records as an aligned text table
///
/// Columns are left-aligned, padded to their widest value and separated by ` | `.
/// A dashed line sits under the header row.
pub fn format_table(headers: &[String], records: &[Record]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for record in records {
        for (width, value) in widths.iter_mut().zip(record.values()) {
            *width = (*width).max(value.chars().count());
        }
    }

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    push_line(&mut out, &separator, &widths);
    for record in records {
        push_line(&mut out, record.values(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}
