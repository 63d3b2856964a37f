use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use omics_split::config::AnalysisConfig;
use omics_split::pipeline;

/// Merge gene and metabolite tables, split samples on the most variable
/// feature and plot the two top features.
#[derive(Parser)]
#[command(name = "omics-split")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transcriptomics table (.csv, .tsv, .json, .parquet)
    #[arg(short, long)]
    genes: Option<PathBuf>,

    /// Metabolomics table (.csv, .tsv, .json, .parquet)
    #[arg(short, long)]
    metabolites: Option<PathBuf>,

    /// Directory the plot is written to (created if absent)
    #[arg(short, long)]
    results_dir: Option<PathBuf>,

    /// Plot file name; the extension picks PNG or SVG
    #[arg(short, long)]
    plot_file: Option<String>,

    /// TrueType font used for PNG text
    #[arg(long)]
    font: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_yaml_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(p) = self.genes {
            config.genes_path = p;
        }
        if let Some(p) = self.metabolites {
            config.metabolites_path = p;
        }
        if let Some(d) = self.results_dir {
            config.plot.results_dir = d;
        }
        if let Some(f) = self.plot_file {
            config.plot.file_name = f;
        }
        if let Some(f) = self.font {
            config.plot.font_path = Some(f);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    let report = pipeline::run(&config)?;

    info!(
        "{} High / {} Low samples, split on {} at {:.4}",
        report.high.len(),
        report.low.len(),
        report.features[0],
        report.median
    );
    Ok(())
}
