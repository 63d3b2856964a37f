//! Multi-omics median-split workflow.
//!
//! Two feature × sample tables (gene expression, metabolite abundance) are
//! cleaned, merged over their shared samples, reduced to the two most
//! variable features, and the samples split High / Low around the median of
//! the first one. The result is drawn as a scatter plot.
//!
//! - **data**: raw tables, cleaning into dense [`Matrix`](data::Matrix) values, file I/O
//! - **merge**: order-preserving sample intersection and row stacking
//! - **select**: sample-variance ranking, top-two selection
//! - **group**: median split
//! - **plot** / **color**: PNG or SVG scatter plot
//! - **synth**: seeded synthetic inputs
//! - **pipeline**: the stages wired together
//!
//! # Example
//!
//! ```no_run
//! use omics_split::prelude::*;
//!
//! let report = run(&AnalysisConfig::default()).unwrap();
//! println!("{:?} split on {}", report.plot_path, report.features[0]);
//! ```

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod group;
pub mod merge;
pub mod pipeline;
pub mod plot;
pub mod select;
pub mod synth;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::{AnalysisConfig, PlotConfig};
    pub use crate::data::clean::clean_table;
    pub use crate::data::export::write_table;
    pub use crate::data::loader::{load_matrix, load_table};
    pub use crate::data::{CellValue, Matrix, RawTable};
    pub use crate::error::{OmicsError, Result};
    pub use crate::group::{assign_groups, median, split_by_median, Group, GroupAssignment};
    pub use crate::merge::{merge_matrices, shared_samples, CombinedMatrix};
    pub use crate::pipeline::{analyze, run, Analysis, RunReport};
    pub use crate::plot::render_scatter;
    pub use crate::select::{
        rank_by_variance, sample_variance, select_top_features, FeatureSelection,
        SelectedFeature,
    };
    pub use crate::synth::{generate_table, SyntheticSpec};
}
