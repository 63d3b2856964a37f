use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::ArrowWriter;

use super::model::{CellValue, RawTable};
use crate::error::{OmicsError, Result};

/// Column holding row ids in written Parquet files, as pandas names it.
const INDEX_COLUMN: &str = "__index_level_0__";

/// Write a raw table to disk.  Dispatch by extension (`.csv`, `.tsv`, `.parquet`).
pub fn write_table(table: &RawTable, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_delimited(table, path, b','),
        "tsv" => write_delimited(table, path, b'\t'),
        "parquet" | "pq" => write_parquet(table, path),
        other => Err(OmicsError::UnsupportedFormat(format!(".{other}"))),
    }?;
    debug!(
        "Wrote {} × {} table to {}",
        table.n_rows(),
        table.n_columns(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV / TSV
// ---------------------------------------------------------------------------

/// Index column first with an empty header cell; missing cells stay empty.
fn write_delimited(table: &RawTable, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let header = std::iter::once("").chain(table.column_names.iter().map(String::as_str));
    writer.write_record(header)?;

    for (id, row) in table.row_ids.iter().zip(&table.rows) {
        let cells = row.iter().map(|cell| match cell {
            CellValue::Missing => String::new(),
            // `{:?}` keeps the trailing ".0" so floats reload as floats.
            CellValue::Float(v) => format!("{v:?}"),
            other => other.to_string(),
        });
        writer.write_record(std::iter::once(id.clone()).chain(cells))?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// One nullable Float64 column per table column, plus the id column.
fn write_parquet(table: &RawTable, path: &Path) -> Result<()> {
    let mut fields = vec![Field::new(INDEX_COLUMN, DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        table.row_ids.iter().map(String::as_str).collect::<Vec<_>>(),
    ))];

    for (col_idx, name) in table.column_names.iter().enumerate() {
        let mut values = Vec::with_capacity(table.n_rows());
        for (id, row) in table.row_ids.iter().zip(&table.rows) {
            let cell = &row[col_idx];
            if !cell.is_numeric_or_missing() {
                return Err(OmicsError::InvalidCell {
                    row: id.clone(),
                    column: name.clone(),
                    reason: format!("'{cell}' cannot be written as a float"),
                });
            }
            values.push(cell.as_f64());
        }
        fields.push(Field::new(name, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(values)));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_table;
    use tempfile::tempdir;

    fn table() -> RawTable {
        use CellValue::*;
        RawTable::new(
            vec!["G1".into(), "G2".into()],
            vec!["S1".into(), "S2".into()],
            vec![
                vec![Float(1.25), Missing],
                vec![Integer(3), Float(-0.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        write_table(&table(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(",S1,S2\n"));

        let loaded = load_table(&path).unwrap();
        assert_eq!(loaded, table());
    }

    #[test]
    fn test_parquet_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        write_table(&table(), &path).unwrap();

        let loaded = load_table(&path).unwrap();
        assert_eq!(loaded.row_ids, vec!["G1", "G2"]);
        assert_eq!(loaded.column_names, vec!["S1", "S2"]);
        assert_eq!(loaded.rows[0], vec![CellValue::Float(1.25), CellValue::Missing]);
        // Integers are widened to floats in Parquet.
        assert_eq!(loaded.rows[1][0], CellValue::Float(3.0));
    }

    #[test]
    fn test_parquet_rejects_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let t = RawTable::new(
            vec!["G1".into()],
            vec!["S1".into()],
            vec![vec![CellValue::Text("x".into())]],
        )
        .unwrap();
        let err = write_table(&t, &path).unwrap_err();
        assert!(matches!(err, OmicsError::InvalidCell { .. }));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempdir().unwrap();
        let err = write_table(&table(), &dir.path().join("t.xls")).unwrap_err();
        assert!(matches!(err, OmicsError::UnsupportedFormat(_)));
    }
}
