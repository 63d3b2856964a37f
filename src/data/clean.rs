use log::{debug, info};

use super::model::{Matrix, RawTable};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Column typing
// ---------------------------------------------------------------------------

/// Indices of numeric columns: every non-missing cell is an integer or float.
///
/// Typing looks at the whole table, so a column that only turns numeric once
/// some rows are dropped still counts as text.
pub fn numeric_columns(table: &RawTable) -> Vec<usize> {
    (0..table.n_columns())
        .filter(|&col| {
            table
                .rows
                .iter()
                .all(|row| row[col].is_numeric_or_missing())
        })
        .collect()
}

/// Indices of rows without a single missing cell, in any column.
pub fn complete_rows(table: &RawTable) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.iter().any(|c| c.is_missing()))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Turn a raw table into a dense [`Matrix`].
///
/// Rows with any missing value are dropped, then non-numeric columns.
/// Duplicate row or column ids surface as `MalformedInput`.
pub fn clean_table(table: &RawTable, label: &str) -> Result<Matrix> {
    let numeric = numeric_columns(table);
    let keep_rows = complete_rows(table);

    debug!(
        "{label}: {} of {} columns numeric, {} of {} rows complete",
        numeric.len(),
        table.n_columns(),
        keep_rows.len(),
        table.n_rows()
    );

    let feature_ids: Vec<String> = keep_rows
        .iter()
        .map(|&r| table.row_ids[r].clone())
        .collect();
    let sample_ids: Vec<String> = numeric
        .iter()
        .map(|&c| table.column_names[c].clone())
        .collect();

    let mut values = Vec::with_capacity(feature_ids.len() * sample_ids.len());
    for &r in &keep_rows {
        let row = &table.rows[r];
        // Complete rows in numeric columns always have a numeric view.
        values.extend(numeric.iter().filter_map(|&c| row[c].as_f64()));
    }

    let matrix = Matrix::new(label, feature_ids, sample_ids, values)?;
    info!(
        "Cleaned {label} data: {} rows × {} columns",
        matrix.n_features(),
        matrix.n_samples()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::error::OmicsError;

    fn table() -> RawTable {
        use CellValue::*;
        RawTable::new(
            vec!["G1".into(), "G2".into(), "G3".into(), "G4".into()],
            vec!["S1".into(), "note".into(), "S2".into(), "flag".into()],
            vec![
                vec![Float(1.0), Text("a".into()), Integer(2), Bool(true)],
                vec![Missing, Text("b".into()), Float(3.0), Bool(false)],
                vec![Float(4.0), Text("c".into()), Float(5.5), Bool(true)],
                vec![Float(6.0), Missing, Float(7.0), Bool(true)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_columns_exclude_text_and_bool() {
        assert_eq!(numeric_columns(&table()), vec![0, 2]);
    }

    #[test]
    fn test_complete_rows_consider_every_column() {
        // G4 is only missing in a text column but is still dropped.
        assert_eq!(complete_rows(&table()), vec![0, 2]);
    }

    #[test]
    fn test_clean_table() {
        let m = clean_table(&table(), "gene").unwrap();
        assert_eq!(m.feature_ids(), &["G1", "G3"]);
        assert_eq!(m.sample_ids(), &["S1", "S2"]);
        assert_eq!(m.row(0), &[1.0, 2.0]);
        assert_eq!(m.row(1), &[4.0, 5.5]);
        assert_eq!(m.label(), "gene");
    }

    #[test]
    fn test_mixed_column_is_not_numeric() {
        use CellValue::*;
        let t = RawTable::new(
            vec!["G1".into(), "G2".into()],
            vec!["S1".into(), "S2".into()],
            vec![
                vec![Float(1.0), Float(2.0)],
                vec![Text("high".into()), Float(3.0)],
            ],
        )
        .unwrap();
        let m = clean_table(&t, "gene").unwrap();
        assert_eq!(m.sample_ids(), &["S2"]);
        assert_eq!(m.n_features(), 2);
    }

    #[test]
    fn test_all_rows_missing_yields_empty_matrix() {
        let t = RawTable::new(
            vec!["G1".into()],
            vec!["S1".into()],
            vec![vec![CellValue::Missing]],
        )
        .unwrap();
        let m = clean_table(&t, "gene").unwrap();
        assert_eq!(m.shape(), (0, 1));
    }

    #[test]
    fn test_duplicate_row_ids_rejected() {
        let t = RawTable::new(
            vec!["G1".into(), "G1".into()],
            vec!["S1".into()],
            vec![vec![CellValue::Float(1.0)], vec![CellValue::Float(2.0)]],
        )
        .unwrap();
        let err = clean_table(&t, "gene").unwrap_err();
        assert!(matches!(err, OmicsError::MalformedInput(_)));
    }
}
