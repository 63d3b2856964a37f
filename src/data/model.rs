use std::collections::HashSet;
use std::fmt;

use crate::error::{OmicsError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a raw input table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from disk, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => write!(f, "<missing>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Booleans are deliberately not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Whether the cell may live in a numeric column.
    pub fn is_numeric_or_missing(&self) -> bool {
        matches!(
            self,
            CellValue::Integer(_) | CellValue::Float(_) | CellValue::Missing
        )
    }
}

// ---------------------------------------------------------------------------
// RawTable – one table as loaded, rows = features
// ---------------------------------------------------------------------------

/// An uncleaned table: row ids, column names and typed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Row identifiers (feature ids), taken from the index column.
    pub row_ids: Vec<String>,
    /// Column names (sample ids for numeric columns).
    pub column_names: Vec<String>,
    /// Row-major cells, each row as long as `column_names`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, checking every row against the header width.
    pub fn new(
        row_ids: Vec<String>,
        column_names: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        if row_ids.len() != rows.len() {
            return Err(OmicsError::MalformedInput(format!(
                "{} row ids for {} rows",
                row_ids.len(),
                rows.len()
            )));
        }
        for (id, row) in row_ids.iter().zip(&rows) {
            if row.len() != column_names.len() {
                return Err(OmicsError::MalformedInput(format!(
                    "row '{id}' has {} cells but the header has {} columns",
                    row.len(),
                    column_names.len()
                )));
            }
        }
        Ok(Self {
            row_ids,
            column_names,
            rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Number of cells marked missing.
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| c.is_missing())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Matrix – cleaned, dense features × samples
// ---------------------------------------------------------------------------

/// A dense numeric matrix. Rows are features, columns are samples.
///
/// Feature and sample ids are unique and ordered; the constructor is the
/// only way in, so every `Matrix` upholds that.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Short layer name used in log output ("gene", "metabolite", ...).
    label: String,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
    /// Row-major values, `feature_ids.len() * sample_ids.len()` long.
    values: Vec<f64>,
}

impl Matrix {
    /// Create a matrix from row-major values.
    pub fn new(
        label: impl Into<String>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let label = label.into();
        let expected = feature_ids.len() * sample_ids.len();
        if values.len() != expected {
            return Err(OmicsError::MalformedInput(format!(
                "{label} matrix: expected {} × {} = {expected} values, got {}",
                feature_ids.len(),
                sample_ids.len(),
                values.len()
            )));
        }
        check_unique(&label, "feature", &feature_ids)?;
        check_unique(&label, "sample", &sample_ids)?;
        Ok(Self {
            label,
            feature_ids,
            sample_ids,
            values,
        })
    }

    /// Create a matrix from one `Vec` per feature row.
    pub fn from_rows(
        label: impl Into<String>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let label = label.into();
        if rows.len() != feature_ids.len() {
            return Err(OmicsError::MalformedInput(format!(
                "{label} matrix: {} feature ids for {} rows",
                feature_ids.len(),
                rows.len()
            )));
        }
        let mut values = Vec::with_capacity(rows.len() * sample_ids.len());
        for (id, row) in feature_ids.iter().zip(&rows) {
            if row.len() != sample_ids.len() {
                return Err(OmicsError::MalformedInput(format!(
                    "{label} matrix: row '{id}' has {} values for {} samples",
                    row.len(),
                    sample_ids.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::new(label, feature_ids, sample_ids, values)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// `(features, samples)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_features(), self.n_samples())
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Values of one feature across all samples.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.n_samples();
        &self.values[row * n..(row + 1) * n]
    }

    /// Iterate over `(feature_id, row)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.feature_ids
            .iter()
            .enumerate()
            .map(move |(i, id)| (id.as_str(), self.row(i)))
    }

    /// Index of a sample id, if present.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == sample_id)
    }
}

fn check_unique(label: &str, kind: &str, ids: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(OmicsError::MalformedInput(format!(
                "{label} matrix: duplicate {kind} id '{id}'"
            )));
        }
    }
    Ok(())
}
