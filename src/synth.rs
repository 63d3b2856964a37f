//! Synthetic omics tables for demos and tests.
//!
//! Every generator takes its RNG as an argument; seeding is the caller's job.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::{CellValue, RawTable};
use crate::error::{OmicsError, Result};

/// Shape and value distribution of one synthetic table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Row id prefix, e.g. `Gene` gives `Gene_1`, `Gene_2`, ...
    pub feature_prefix: String,
    pub n_features: usize,
    pub n_samples: usize,
    /// Values are uniform in `[low, high)`.
    pub low: f64,
    pub high: f64,
    /// Probability that any one cell is blanked out.
    pub missing_rate: f64,
    pub seed: u64,
}

impl SyntheticSpec {
    /// 100 genes × 10 samples, log-normalised-looking values in 5–15.
    pub fn genes() -> Self {
        Self {
            feature_prefix: "Gene".to_string(),
            n_features: 100,
            n_samples: 10,
            low: 5.0,
            high: 15.0,
            missing_rate: 0.05,
            seed: 123,
        }
    }

    /// 20 metabolites × 10 samples, abundances in 2–8.
    pub fn metabolites() -> Self {
        Self {
            feature_prefix: "Metabolite".to_string(),
            n_features: 20,
            n_samples: 10,
            low: 2.0,
            high: 8.0,
            missing_rate: 0.05,
            seed: 456,
        }
    }

    /// A fresh generator seeded from `self.seed`.
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    fn validate(&self) -> Result<()> {
        if !(self.low < self.high) || !self.low.is_finite() || !self.high.is_finite() {
            return Err(OmicsError::MalformedInput(format!(
                "value range [{}, {}) is empty",
                self.low, self.high
            )));
        }
        if !(0.0..=1.0).contains(&self.missing_rate) {
            return Err(OmicsError::MalformedInput(format!(
                "missing rate {} is outside [0, 1]",
                self.missing_rate
            )));
        }
        Ok(())
    }
}

/// Sample ids shared by all synthetic tables: `Sample_1` ... `Sample_n`.
pub fn sample_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Sample_{i}")).collect()
}

/// Draw a table of uniform values, then blank cells at `missing_rate`.
///
/// All values are drawn before any cell is blanked, so the missing mask does
/// not shift the values.
pub fn generate_table<R: Rng>(spec: &SyntheticSpec, rng: &mut R) -> Result<RawTable> {
    spec.validate()?;

    let row_ids: Vec<String> = (1..=spec.n_features)
        .map(|i| format!("{}_{i}", spec.feature_prefix))
        .collect();

    let mut rows: Vec<Vec<CellValue>> = (0..spec.n_features)
        .map(|_| {
            (0..spec.n_samples)
                .map(|_| CellValue::Float(rng.random_range(spec.low..spec.high)))
                .collect()
        })
        .collect();

    for cell in rows.iter_mut().flatten() {
        if rng.random::<f64>() < spec.missing_rate {
            *cell = CellValue::Missing;
        }
    }

    RawTable::new(row_ids, sample_names(spec.n_samples), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SyntheticSpec {
        SyntheticSpec {
            n_features: 30,
            n_samples: 8,
            ..SyntheticSpec::genes()
        }
    }

    #[test]
    fn test_shape_and_ids() {
        let spec = small();
        let table = generate_table(&spec, &mut spec.rng()).unwrap();
        assert_eq!(table.n_rows(), 30);
        assert_eq!(table.n_columns(), 8);
        assert_eq!(table.row_ids[0], "Gene_1");
        assert_eq!(table.row_ids[29], "Gene_30");
        assert_eq!(table.column_names[7], "Sample_8");
    }

    #[test]
    fn test_values_in_range() {
        let spec = SyntheticSpec {
            missing_rate: 0.0,
            ..small()
        };
        let table = generate_table(&spec, &mut spec.rng()).unwrap();
        assert_eq!(table.missing_count(), 0);
        for cell in table.rows.iter().flatten() {
            let v = cell.as_f64().unwrap();
            assert!((spec.low..spec.high).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn test_same_seed_same_table() {
        let spec = small();
        let a = generate_table(&spec, &mut spec.rng()).unwrap();
        let b = generate_table(&spec, &mut spec.rng()).unwrap();
        assert_eq!(a, b);

        let other = SyntheticSpec { seed: 7, ..small() };
        let c = generate_table(&other, &mut other.rng()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_rate_extremes() {
        let spec = SyntheticSpec {
            missing_rate: 1.0,
            ..small()
        };
        let table = generate_table(&spec, &mut spec.rng()).unwrap();
        assert_eq!(table.missing_count(), 30 * 8);
    }

    #[test]
    fn test_invalid_specs() {
        let bad_range = SyntheticSpec { low: 3.0, high: 3.0, ..small() };
        assert!(generate_table(&bad_range, &mut bad_range.rng()).is_err());
        let bad_rate = SyntheticSpec { missing_rate: 1.5, ..small() };
        assert!(generate_table(&bad_rate, &mut bad_rate.rng()).is_err());
    }
}
