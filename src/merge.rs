//! Align two matrices on their shared samples and stack their features.

use std::collections::HashSet;
use std::ops::Range;

use log::{debug, info};

use crate::data::Matrix;
use crate::error::{OmicsError, Result};

/// The rows one input matrix contributed to a [`CombinedMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub label: String,
    pub rows: Range<usize>,
}

/// Features of two matrices stacked over their shared samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMatrix {
    matrix: Matrix,
    layers: Vec<Layer>,
}

impl CombinedMatrix {
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Label of the input layer a row came from.
    pub fn layer_of(&self, row: usize) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.rows.contains(&row))
            .map(|l| l.label.as_str())
    }

    pub fn n_features(&self) -> usize {
        self.matrix.n_features()
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.n_samples()
    }

    pub fn feature_ids(&self) -> &[String] {
        self.matrix.feature_ids()
    }

    pub fn sample_ids(&self) -> &[String] {
        self.matrix.sample_ids()
    }
}

/// Samples present in both matrices, in `left`'s order.
pub fn shared_samples(left: &Matrix, right: &Matrix) -> Vec<String> {
    let in_right: HashSet<&str> = right.sample_ids().iter().map(String::as_str).collect();
    left.sample_ids()
        .iter()
        .filter(|s| in_right.contains(s.as_str()))
        .cloned()
        .collect()
}

/// Stack `left`'s rows, then `right`'s rows, over their shared samples.
///
/// Fails with `EmptySharedSamples` when the sample axes do not overlap and
/// with `MalformedInput` when a feature id occurs in both inputs.
pub fn merge_matrices(left: &Matrix, right: &Matrix) -> Result<CombinedMatrix> {
    let shared = shared_samples(left, right);
    if shared.is_empty() {
        return Err(OmicsError::EmptySharedSamples {
            left: left.n_samples(),
            right: right.n_samples(),
        });
    }

    let left_features: HashSet<&str> = left.feature_ids().iter().map(String::as_str).collect();
    if let Some(dup) = right
        .feature_ids()
        .iter()
        .find(|f| left_features.contains(f.as_str()))
    {
        return Err(OmicsError::MalformedInput(format!(
            "feature id '{dup}' appears in both {} and {} data",
            left.label(),
            right.label()
        )));
    }

    let n_rows = left.n_features() + right.n_features();
    let mut feature_ids = Vec::with_capacity(n_rows);
    let mut values = Vec::with_capacity(n_rows * shared.len());
    let mut layers = Vec::with_capacity(2);

    for m in [left, right] {
        // Column positions of the shared samples within this matrix.
        let columns: Vec<usize> = shared
            .iter()
            .filter_map(|s| m.sample_index(s))
            .collect();
        debug!("{}: shared sample columns {:?}", m.label(), columns);

        let start = feature_ids.len();
        for (id, row) in m.rows() {
            feature_ids.push(id.to_string());
            values.extend(columns.iter().map(|&c| row[c]));
        }
        layers.push(Layer {
            label: m.label().to_string(),
            rows: start..feature_ids.len(),
        });
    }

    let label = format!("{}+{}", left.label(), right.label());
    let matrix = Matrix::new(label, feature_ids, shared, values)?;
    info!(
        "Combined data: {} features ({} {} + {} {}) × {} samples",
        matrix.n_features(),
        left.n_features(),
        left.label(),
        right.n_features(),
        right.label(),
        matrix.n_samples()
    );
    Ok(CombinedMatrix { matrix, layers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(prefix: &str, range: std::ops::RangeInclusive<usize>) -> Vec<String> {
        range.map(|i| format!("{prefix}{i}")).collect()
    }

    fn genes() -> Matrix {
        Matrix::from_rows(
            "gene",
            ids("G", 1..=3),
            ids("S", 1..=3),
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        )
        .unwrap()
    }

    fn metabolites() -> Matrix {
        // Samples deliberately in a different order than the genes.
        Matrix::from_rows(
            "metabolite",
            ids("M", 1..=2),
            vec!["S4".into(), "S3".into(), "S2".into()],
            vec![vec![10.0, 30.0, 20.0], vec![40.0, 60.0, 50.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_merge_shape_and_order() {
        let combined = merge_matrices(&genes(), &metabolites()).unwrap();
        assert_eq!(combined.n_features(), 5);
        assert_eq!(combined.n_samples(), 2);
        assert_eq!(combined.sample_ids(), &["S2", "S3"]);
        assert_eq!(combined.feature_ids(), &["G1", "G2", "G3", "M1", "M2"]);
    }

    #[test]
    fn test_merge_reindexes_right_columns() {
        let combined = merge_matrices(&genes(), &metabolites()).unwrap();
        let m = combined.matrix();
        assert_eq!(m.row(0), &[2.0, 3.0]);
        assert_eq!(m.row(3), &[20.0, 30.0]);
        assert_eq!(m.row(4), &[50.0, 60.0]);
    }

    #[test]
    fn test_layers() {
        let combined = merge_matrices(&genes(), &metabolites()).unwrap();
        assert_eq!(combined.layers()[0].rows, 0..3);
        assert_eq!(combined.layers()[1].rows, 3..5);
        assert_eq!(combined.layer_of(2), Some("gene"));
        assert_eq!(combined.layer_of(3), Some("metabolite"));
        assert_eq!(combined.layer_of(5), None);
    }

    #[test]
    fn test_no_shared_samples() {
        let other = Matrix::from_rows("metabolite", ids("M", 1..=1), ids("T", 1..=2), vec![vec![1.0, 2.0]])
            .unwrap();
        let err = merge_matrices(&genes(), &other).unwrap_err();
        assert!(matches!(
            err,
            OmicsError::EmptySharedSamples { left: 3, right: 2 }
        ));
    }

    #[test]
    fn test_overlapping_features_rejected() {
        let other = Matrix::from_rows("metabolite", vec!["G2".into()], ids("S", 1..=1), vec![vec![1.0]])
            .unwrap();
        let err = merge_matrices(&genes(), &other).unwrap_err();
        match err {
            OmicsError::MalformedInput(msg) => assert!(msg.contains("'G2'")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_is_deterministic() {
        let a = merge_matrices(&genes(), &metabolites()).unwrap();
        let b = merge_matrices(&genes(), &metabolites()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_samples_follow_left_order() {
        let shared = shared_samples(&metabolites(), &genes());
        assert_eq!(shared, vec!["S3", "S2"]);
    }
}
