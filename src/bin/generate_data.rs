use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use omics_split::data::export::write_table;
use omics_split::synth::{generate_table, SyntheticSpec};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
        }
    }
}

/// Write synthetic transcriptomics and metabolomics tables.
#[derive(Parser)]
#[command(name = "generate_data")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output directory (created if absent)
    #[arg(short, long, default_value = "data")]
    out_dir: PathBuf,

    /// File format of both tables
    #[arg(short, long, value_enum, default_value = "csv")]
    format: Format,

    /// Probability that a cell is left empty
    #[arg(long, default_value = "0.05")]
    missing_rate: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let outputs = [
        ("transcriptomics_data", SyntheticSpec::genes()),
        ("metabolomics_data", SyntheticSpec::metabolites()),
    ];
    for (stem, spec) in outputs {
        let spec = SyntheticSpec {
            missing_rate: cli.missing_rate,
            ..spec
        };
        let mut rng = spec.rng();
        let table = generate_table(&spec, &mut rng)?;

        let path = cli.out_dir.join(format!("{stem}.{}", cli.format.extension()));
        write_table(&table, &path).with_context(|| format!("writing {}", path.display()))?;
        info!(
            "Wrote {}: {} {} × {} samples ({} missing)",
            path.display(),
            table.n_rows(),
            spec.feature_prefix.to_lowercase(),
            table.n_columns(),
            table.missing_count()
        );
    }
    Ok(())
}
