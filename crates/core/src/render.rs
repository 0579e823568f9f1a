//! Markdown rendering of finished report tables

use crate::tables::ReportTable;
use crate::transform::ScalarCell;
use crate::units::Change;

const PERCENTAGE_FAMILY: &str = "normalizedPercentage";

/// Render a table as a GitHub-flavored markdown table.
///
/// Label columns come first, one per label depth; only the first part of a
/// vertical run prints its label. Each selected statistic then contributes
/// baseline, target, relative delta and absolute delta columns. Rows with
/// fewer cells, such as a blank template's, are padded with `-`.
pub fn render_markdown(table: &ReportTable) -> String {
    let statistics: Vec<_> = table.statistic.selected.iter().collect();
    let label_columns = table.max_label_parts.max(1);
    let columns = label_columns + 4 * statistics.len();

    let mut header: Vec<String> = (0..label_columns)
        .map(|i| if i == 0 { "Label".to_string() } else { String::new() })
        .collect();
    for side in ["baseline", "target"] {
        for statistic in &statistics {
            header.push(format!("{} {}", statistic, side));
        }
    }
    for statistic in &statistics {
        header.push(format!("{} Δ%", statistic));
        header.push(format!("{} Δ", statistic));
    }

    let mut out = String::new();
    if !table.name.is_empty() {
        out.push_str(&format!("### {}\n\n", escape(&table.name)));
    }
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        header.iter().map(|_| "---|").collect::<String>()
    ));

    for row in &table.rows {
        let mut cells: Vec<String> = row
            .label_parts
            .iter()
            .map(|part| {
                if part.is_first {
                    escape(&part.label)
                } else {
                    String::new()
                }
            })
            .collect();
        cells.resize(label_columns, String::new());
        cells.extend(row.scalars.iter().map(|cell| format_cell(cell.as_ref())));
        cells.resize(columns, format_cell(None));
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    out
}

/// Format one cell; `-` when absent, `n/a` when not a finite number
pub fn format_cell(cell: Option<&ScalarCell>) -> String {
    let Some(cell) = cell else {
        return "-".to_string();
    };
    if !cell.value.is_finite() {
        return "n/a".to_string();
    }

    let sign = if cell.unit.is_delta && cell.value > 0.0 {
        "+"
    } else {
        ""
    };

    let text = if cell.unit.base_unit_name == PERCENTAGE_FAMILY {
        format!("{}{}%", sign, format_number(cell.value * 100.0))
    } else if let Some(prefix) = cell.unit_prefix {
        let prefix = prefix.best_fit(cell.value);
        format!(
            "{}{} {}{}",
            sign,
            format_number(cell.value / prefix.factor()),
            prefix.symbol(),
            cell.unit.symbol
        )
    } else if cell.unit.symbol.is_empty() {
        format!("{}{}", sign, format_number(cell.value))
    } else {
        format!("{}{} {}", sign, format_number(cell.value), cell.unit.symbol)
    };

    match cell.change() {
        Change::Improvement => format!("{} ▲", text),
        Change::Regression => format!("{} ▼", text),
        Change::None => text,
    }
}

/// Up to three decimals, trailing zeros dropped
fn format_number(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}
