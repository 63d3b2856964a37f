use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value as JsonValue;

use super::clean::clean_table;
use super::model::{CellValue, Matrix, RawTable};
use crate::error::OmicsError;

/// Markers read as missing values, on top of the empty cell.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-nan", "-NaN", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Pandas writes the DataFrame index under this name in Parquet files.
const PANDAS_INDEX_COLUMN: &str = "__index_level_0__";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – first column holds row ids, header holds column names
/// * `.json`         – `{ "<row id>": { "<column>": value, ... }, ... }`
/// * `.parquet`      – row ids in `__index_level_0__` or the first column
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "txt" => load_delimited(path, b'\t')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(OmicsError::UnsupportedFormat(format!(".{other}")).into()),
    };
    Ok(table)
}

/// Load a table and clean it into a dense matrix labelled `label`.
pub fn load_matrix(path: &Path, label: &str) -> Result<Matrix> {
    let table = load_table(path).with_context(|| format!("loading {}", path.display()))?;
    info!(
        "Loaded {label} data with {} rows and {} columns ({} missing cells)",
        table.n_rows(),
        table.n_columns(),
        table.missing_count()
    );
    let matrix = clean_table(&table, label)
        .with_context(|| format!("cleaning {}", path.display()))?;
    Ok(matrix)
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

/// Header row: index name (ignored) followed by column names.
/// Data rows: row id followed by one cell per column.
fn load_delimited(path: &Path, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;

    let headers = reader.headers().context("reading header row")?.clone();
    if headers.is_empty() {
        bail!("header row is empty");
    }
    let column_names: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

    let mut row_ids = Vec::new();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        let mut fields = record.iter();
        let Some(id) = fields.next() else {
            continue;
        };
        row_ids.push(id.to_string());
        rows.push(fields.map(parse_cell).collect());
    }

    Ok(RawTable::new(row_ids, column_names, rows)?)
}

/// Type a text cell the way a dataframe reader would.
pub fn parse_cell(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return CellValue::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return float_cell(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

fn float_cell(f: f64) -> CellValue {
    if f.is_nan() {
        CellValue::Missing
    } else {
        CellValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Index-oriented JSON (`df.to_json(orient="index")`):
///
/// ```json
/// {
///   "Gene_1": { "Sample_1": 7.2, "Sample_2": null },
///   "Gene_2": { "Sample_1": 9.1, "Sample_2": 11.4 }
/// }
/// ```
///
/// Columns appear in order of first use; absent keys are missing.
/// A row id that appears twice is `MalformedInput`.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let JsonRows(records) =
        serde_json::from_str(&text).context("Expected top-level JSON object keyed by row id")?;

    let mut seen = HashSet::with_capacity(records.len());
    for (id, _) in &records {
        if !seen.insert(id.as_str()) {
            return Err(OmicsError::MalformedInput(format!("duplicate row id '{id}'")).into());
        }
    }

    let mut column_names: Vec<String> = Vec::new();
    for (id, rec) in &records {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row '{id}' is not a JSON object"))?;
        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
    }

    let mut row_ids = Vec::with_capacity(records.len());
    let mut rows = Vec::with_capacity(records.len());
    for (id, rec) in &records {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row '{id}' is not a JSON object"))?;
        let row: Vec<CellValue> = column_names
            .iter()
            .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Missing))
            .collect();
        row_ids.push(id.clone());
        rows.push(row);
    }

    Ok(RawTable::new(row_ids, column_names, rows)?)
}

/// Top-level object entries in file order, repeated keys included.
///
/// `serde_json::Map` keeps only the last value for a repeated key, which
/// would hide duplicate row ids.
struct JsonRows(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for JsonRows {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowsVisitor;

        impl<'de> Visitor<'de> for RowsVisitor {
            type Value = JsonRows;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object keyed by row id")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<JsonRows, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, JsonValue>()? {
                    entries.push(entry);
                }
                Ok(JsonRows(entries))
            }
        }

        deserializer.deserialize_map(RowsVisitor)
    }
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                float_cell(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Null => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a wide Parquet table, one row per feature.
///
/// Works with files written by `df.to_parquet()` (index stored as
/// `__index_level_0__`) and by writers that put the ids first.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    if schema.fields().is_empty() {
        bail!("Parquet file has no columns");
    }
    let id_idx = schema.index_of(PANDAS_INDEX_COLUMN).unwrap_or(0);

    let value_cols: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();
    let column_names: Vec<String> = value_cols.iter().map(|(_, name)| name.clone()).collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut row_ids = Vec::new();
    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let id_col = batch.column(id_idx);

        for row in 0..batch.num_rows() {
            let id = match cell_at(id_col, row) {
                CellValue::Missing => bail!("Row {}: null row id", row_ids.len()),
                other => other.to_string(),
            };
            let cells: Vec<CellValue> = value_cols
                .iter()
                .map(|(col_idx, _)| cell_at(batch.column(*col_idx), row))
                .collect();
            row_ids.push(id);
            rows.push(cells);
        }
    }

    Ok(RawTable::new(row_ids, column_names, rows)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn cell_at(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Missing;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| float_cell(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| float_cell(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        // Anything else cannot be numeric; keep it as text so cleaning drops it.
        other => Some(CellValue::Text(format!("{other:?}"))),
    };
    cell.unwrap_or(CellValue::Missing)
}
