//! Label alignment across the rows of one table
//!
//! Rows are right-aligned to a common label depth, then equal labels in
//! consecutive rows of the same column are merged into one vertical run.

use crate::transform::{LabelPart, TransformedRow};

/// Align the label parts of a whole table in place and return the common depth.
///
/// Short rows are padded on the left with empty parts. For each column, a part
/// whose label equals the one directly above is marked `is_first = false` and
/// counted into the run of the nearest preceding `is_first` part. The pass
/// starts from fresh run state, so aligning an aligned table changes nothing.
pub fn align_label_parts(rows: &mut [TransformedRow]) -> usize {
    let max_label_parts = rows
        .iter()
        .map(|row| row.label_parts.len())
        .max()
        .unwrap_or(0);

    for row in rows.iter_mut() {
        let missing = max_label_parts - row.label_parts.len();
        if missing > 0 {
            row.label_parts
                .splice(0..0, std::iter::repeat_with(LabelPart::default).take(missing));
        }
        for part in &mut row.label_parts {
            part.is_first = true;
            part.row_count = 1;
        }
    }

    for column in 0..max_label_parts {
        let mut first = 0;
        for row_index in 1..rows.len() {
            if rows[row_index].label_parts[column].label
                != rows[row_index - 1].label_parts[column].label
            {
                first = row_index;
                continue;
            }
            rows[row_index].label_parts[column].is_first = false;
            rows[first].label_parts[column].row_count += 1;
        }
    }

    max_label_parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(label: &str) -> TransformedRow {
        TransformedRow {
            label: label.to_string(),
            label_parts: label.split(':').map(|l| LabelPart::new(l, "")).collect(),
            ..Default::default()
        }
    }

    fn layout(rows: &[TransformedRow]) -> Vec<Vec<(String, bool, usize)>> {
        rows.iter()
            .map(|r| {
                r.label_parts
                    .iter()
                    .map(|p| (p.label.clone(), p.is_first, p.row_count))
                    .collect()
            })
            .collect()
    }

    fn part(label: &str, is_first: bool, row_count: usize) -> (String, bool, usize) {
        (label.to_string(), is_first, row_count)
    }

    #[test]
    fn test_pads_short_rows_on_the_left() {
        let mut rows = vec![row("A:B:C"), row("D")];
        assert_eq!(align_label_parts(&mut rows), 3);
        assert_eq!(rows[1].label_parts.len(), 3);
        assert_eq!(rows[1].label_parts[0].label, "");
        assert_eq!(rows[1].label_parts[0].href, "");
        assert_eq!(rows[1].label_parts[2].label, "D");
    }

    #[test]
    fn test_merges_vertical_runs() {
        let mut rows = vec![row("A:x"), row("A:y"), row("A:y"), row("B:y")];
        align_label_parts(&mut rows);

        assert_eq!(
            layout(&rows),
            vec![
                vec![part("A", true, 3), part("x", true, 1)],
                vec![part("A", false, 1), part("y", true, 3)],
                vec![part("A", false, 1), part("y", false, 1)],
                vec![part("B", true, 1), part("y", false, 1)],
            ]
        );
    }

    #[test]
    fn test_run_counts_partition_rows() {
        let mut rows = vec![row("A:B"), row("A:C"), row("D"), row("D"), row("E:C")];
        let depth = align_label_parts(&mut rows);

        for column in 0..depth {
            let total: usize = rows
                .iter()
                .map(|r| &r.label_parts[column])
                .filter(|p| p.is_first)
                .map(|p| p.row_count)
                .sum();
            assert_eq!(total, rows.len());
        }
    }

    #[test]
    fn test_alignment_is_idempotent() {
        let mut rows = vec![row("A:B"), row("A:B"), row("C"), row("A:B")];
        align_label_parts(&mut rows);
        let once = layout(&rows);
        align_label_parts(&mut rows);
        assert_eq!(layout(&rows), once);
    }

    #[test]
    fn test_empty_table() {
        let mut rows: Vec<TransformedRow> = Vec::new();
        assert_eq!(align_label_parts(&mut rows), 0);
    }
}
