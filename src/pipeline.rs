//! The fixed five-step workflow: load, clean, merge, select, group, plot.

use std::path::PathBuf;

use anyhow::Context;
use log::info;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::data::loader::load_matrix;
use crate::data::Matrix;
use crate::error::Result;
use crate::group::{assign_groups, Group, GroupAssignment};
use crate::merge::{merge_matrices, CombinedMatrix};
use crate::plot::render_scatter;
use crate::select::{select_top_features, FeatureSelection};

/// In-memory result of merge → select → group.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub combined: CombinedMatrix,
    pub selection: FeatureSelection,
    pub groups: GroupAssignment,
}

/// Run the core stages on two clean matrices. No I/O.
///
/// The first failing stage ends the run; later stages never see its output.
pub fn analyze(genes: &Matrix, metabolites: &Matrix) -> Result<Analysis> {
    let combined = merge_matrices(genes, metabolites)?;
    let selection = select_top_features(&combined)?;
    let groups = assign_groups(&selection)?;
    Ok(Analysis {
        combined,
        selection,
        groups,
    })
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub plot_path: PathBuf,
    /// `(features, samples)` of the combined matrix.
    pub combined_shape: (usize, usize),
    pub features: [String; 2],
    pub median: f64,
    pub high: Vec<String>,
    pub low: Vec<String>,
}

impl RunReport {
    fn new(analysis: &Analysis, plot_path: PathBuf) -> Self {
        let members = |g: Group| -> Vec<String> {
            analysis
                .groups
                .members(g)
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        Self {
            plot_path,
            combined_shape: analysis.combined.matrix().shape(),
            features: analysis.selection.ids().map(str::to_string),
            median: analysis.groups.median(),
            high: members(Group::High),
            low: members(Group::Low),
        }
    }
}

/// Load both tables, run the analysis and write the plot.
pub fn run(config: &AnalysisConfig) -> anyhow::Result<RunReport> {
    info!("Starting analysis");

    let genes = load_matrix(&config.genes_path, "gene")?;
    let metabolites = load_matrix(&config.metabolites_path, "metabolite")?;

    let analysis = analyze(&genes, &metabolites).context("analysis failed")?;
    let plot_path = render_scatter(&analysis.selection, &analysis.groups, &config.plot)
        .with_context(|| format!("writing {}", config.plot.output_path().display()))?;

    info!("Analysis completed");
    Ok(RunReport::new(&analysis, plot_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OmicsError;

    fn matrix(label: &str, features: &[&str], samples: &[&str], rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(
            label,
            features.iter().map(|s| s.to_string()).collect(),
            samples.iter().map(|s| s.to_string()).collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_analyze_end_to_end() {
        let genes = matrix(
            "gene",
            &["G1", "G2", "G3"],
            &["S1", "S2", "S3", "S4", "S5"],
            vec![
                vec![1.0, 1.0, 1.0, 1.0, 1.0],
                vec![0.0, 10.0, 2.0, 8.0, 99.0],
                vec![1.0, 2.0, 1.0, 2.0, 0.0],
            ],
        );
        let metabolites = matrix(
            "metabolite",
            &["M1", "M2"],
            &["S2", "S3", "S4", "S6"],
            vec![vec![5.0, 1.0, 3.0, 0.0], vec![1.0, 1.5, 2.0, 0.0]],
        );

        let a = analyze(&genes, &metabolites).unwrap();
        assert_eq!(a.combined.matrix().shape(), (5, 3));
        assert_eq!(a.combined.sample_ids(), &["S2", "S3", "S4"]);
        // G2 over S2..S4 is [10, 2, 8] and dominates; M1 is [5, 1, 3].
        assert_eq!(a.selection.ids(), ["G2", "M1"]);
        assert_eq!(a.groups.median(), 8.0);
        assert_eq!(a.groups.members(Group::High), vec!["S2"]);
        assert_eq!(a.groups.members(Group::Low), vec!["S3", "S4"]);
    }

    #[test]
    fn test_analyze_stops_at_merge() {
        let genes = matrix("gene", &["G1", "G2"], &["S1"], vec![vec![1.0], vec![2.0]]);
        let metabolites = matrix("metabolite", &["M1"], &["S2"], vec![vec![1.0]]);
        let err = analyze(&genes, &metabolites).unwrap_err();
        assert!(matches!(err, OmicsError::EmptySharedSamples { .. }));
    }

    #[test]
    fn test_analyze_stops_at_selection() {
        let genes = matrix("gene", &["G1"], &["S1", "S2"], vec![vec![1.0, 2.0]]);
        let metabolites = Matrix::new("metabolite", vec![], vec!["S2".into()], vec![]).unwrap();
        let err = analyze(&genes, &metabolites).unwrap_err();
        assert!(matches!(err, OmicsError::InsufficientFeatures { found: 1 }));
    }
}
