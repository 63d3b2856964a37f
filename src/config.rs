//! Run configuration, loadable from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where to read inputs from and how to draw the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Transcriptomics table (features = genes).
    pub genes_path: PathBuf,
    /// Metabolomics table (features = metabolites).
    pub metabolites_path: PathBuf,
    pub plot: PlotConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            genes_path: PathBuf::from("data/transcriptomics_data.csv"),
            metabolites_path: PathBuf::from("data/metabolomics_data.csv"),
            plot: PlotConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from a YAML string. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Scatter plot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Created if absent.
    pub results_dir: PathBuf,
    /// `.png` or `.svg`.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Marker radius in pixels.
    pub point_size: u32,
    /// TrueType font for raster text. Common system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            file_name: "sample_groups.png".to_string(),
            width: 600,
            height: 400,
            point_size: 5,
            font_path: None,
        }
    }
}

impl PlotConfig {
    /// Full path of the image file.
    pub fn output_path(&self) -> PathBuf {
        self.results_dir.join(&self.file_name)
    }
}
