//! Variance ranking and top-feature selection.
//!
//! Variance is the sample variance (denominator `n - 1`), computed in two
//! passes. A matrix with a single sample column has variance 0 on every row.

use log::{debug, info};
use serde::Serialize;

use crate::data::Matrix;
use crate::error::{OmicsError, Result};
use crate::merge::CombinedMatrix;

/// How many features the selector returns.
pub const SELECTED_FEATURES: usize = 2;

/// One chosen feature with its values over the shared samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedFeature {
    pub id: String,
    /// Row in the combined matrix.
    pub row: usize,
    /// Input layer the feature came from ("gene", "metabolite", ...).
    pub layer: Option<String>,
    pub variance: f64,
    pub values: Vec<f64>,
}

/// The two most variable features, highest variance first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSelection {
    first: SelectedFeature,
    second: SelectedFeature,
    sample_ids: Vec<String>,
}

impl FeatureSelection {
    pub fn first(&self) -> &SelectedFeature {
        &self.first
    }

    pub fn second(&self) -> &SelectedFeature {
        &self.second
    }

    /// Samples both value vectors are indexed by.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn ids(&self) -> [&str; 2] {
        [self.first.id.as_str(), self.second.id.as_str()]
    }
}

/// Sample variance of `values`; 0 for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    ss / (n - 1) as f64
}

/// `(row, variance)` for every row, most variable first.
///
/// The sort is stable, so equal variances keep their row order. NaN
/// variances (rows holding infinities) rank last.
pub fn rank_by_variance(matrix: &Matrix) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = (0..matrix.n_features())
        .map(|row| (row, sample_variance(matrix.row(row))))
        .collect();
    ranked.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
    ranked
}

fn rank_key(variance: f64) -> f64 {
    if variance.is_nan() {
        f64::NEG_INFINITY
    } else {
        variance
    }
}

/// Pick the two highest-variance features of a combined matrix.
pub fn select_top_features(combined: &CombinedMatrix) -> Result<FeatureSelection> {
    let matrix = combined.matrix();
    if matrix.n_features() < SELECTED_FEATURES {
        return Err(OmicsError::InsufficientFeatures {
            found: matrix.n_features(),
        });
    }

    let ranked = rank_by_variance(matrix);
    debug!(
        "Variance ranking head: {:?}",
        &ranked[..ranked.len().min(5)]
    );

    let pick = |(row, variance): (usize, f64)| SelectedFeature {
        id: matrix.feature_ids()[row].clone(),
        row,
        layer: combined.layer_of(row).map(str::to_string),
        variance,
        values: matrix.row(row).to_vec(),
    };
    let first = pick(ranked[0]);
    let second = pick(ranked[1]);

    info!(
        "Top features: {} (variance {:.4}), {} (variance {:.4})",
        first.id, first.variance, second.id, second.variance
    );
    Ok(FeatureSelection {
        first,
        second,
        sample_ids: matrix.sample_ids().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge_matrices;
    use approx::assert_relative_eq;

    fn combined(rows: Vec<Vec<f64>>, n_left: usize) -> CombinedMatrix {
        let n_samples = rows[0].len();
        let samples: Vec<String> = (1..=n_samples).map(|i| format!("S{i}")).collect();
        let (left_rows, right_rows) = rows.split_at(n_left);
        let left = Matrix::from_rows(
            "gene",
            (1..=left_rows.len()).map(|i| format!("G{i}")).collect(),
            samples.clone(),
            left_rows.to_vec(),
        )
        .unwrap();
        let right = Matrix::from_rows(
            "metabolite",
            (1..=right_rows.len()).map(|i| format!("M{i}")).collect(),
            samples,
            right_rows.to_vec(),
        )
        .unwrap();
        merge_matrices(&left, &right).unwrap()
    }

    #[test]
    fn test_sample_variance() {
        assert_relative_eq!(sample_variance(&[1.0, 2.0, 3.0, 4.0]), 5.0 / 3.0);
        assert_relative_eq!(sample_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 32.0 / 7.0);
        assert_eq!(sample_variance(&[7.5]), 0.0);
        assert_eq!(sample_variance(&[]), 0.0);
    }

    #[test]
    fn test_selects_highest_variance_first() {
        let c = combined(
            vec![
                vec![1.0, 1.1, 0.9],
                vec![0.0, 10.0, 20.0],
                vec![5.0, 5.0, 5.0],
                vec![1.0, 3.0, 5.0],
            ],
            2,
        );
        let sel = select_top_features(&c).unwrap();
        assert_eq!(sel.ids(), ["G2", "M2"]);
        assert_relative_eq!(sel.first().variance, 100.0);
        assert_relative_eq!(sel.second().variance, 4.0);
        assert_eq!(sel.first().values, vec![0.0, 10.0, 20.0]);
        assert_eq!(sel.first().layer.as_deref(), Some("gene"));
        assert_eq!(sel.second().layer.as_deref(), Some("metabolite"));
        assert_eq!(sel.sample_ids(), &["S1", "S2", "S3"]);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let c = combined(
            vec![
                vec![0.0, 1.0],
                vec![5.0, 6.0],
                vec![9.0, 10.0],
            ],
            1,
        );
        let sel = select_top_features(&c).unwrap();
        assert_eq!(sel.ids(), ["G1", "M1"]);
    }

    #[test]
    fn test_single_sample_falls_back_to_row_order() {
        let c = combined(vec![vec![3.0], vec![100.0], vec![-4.0]], 2);
        let sel = select_top_features(&c).unwrap();
        assert_eq!(sel.ids(), ["G1", "G2"]);
        assert_eq!(sel.first().variance, 0.0);
        assert_eq!(sel.second().variance, 0.0);
    }

    #[test]
    fn test_insufficient_features() {
        let left = Matrix::from_rows("gene", vec!["G1".into()], vec!["S1".into()], vec![vec![1.0]])
            .unwrap();
        let right = Matrix::new("metabolite", vec![], vec!["S1".into()], vec![]).unwrap();
        let c = merge_matrices(&left, &right).unwrap();
        let err = select_top_features(&c).unwrap_err();
        assert!(matches!(err, OmicsError::InsufficientFeatures { found: 1 }));
    }

    #[test]
    fn test_nan_variance_ranks_last() {
        let m = Matrix::from_rows(
            "gene",
            vec!["G1".into(), "G2".into(), "G3".into()],
            vec!["S1".into(), "S2".into()],
            vec![
                vec![f64::INFINITY, 1.0],
                vec![0.0, 1.0],
                vec![0.0, 0.0],
            ],
        )
        .unwrap();
        let ranked = rank_by_variance(&m);
        let order: Vec<usize> = ranked.iter().map(|(row, _)| *row).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let rows = vec![vec![1.0, 2.0, 4.0], vec![3.0, 1.0, 2.0], vec![8.0, 0.5, 3.0]];
        let a = select_top_features(&combined(rows.clone(), 1)).unwrap();
        let b = select_top_features(&combined(rows, 1)).unwrap();
        assert_eq!(a, b);
    }
}
