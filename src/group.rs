//! Median split of samples into High / Low groups.

use std::fmt;

use log::info;
use serde::Serialize;

use crate::error::{OmicsError, Result};
use crate::select::FeatureSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
    High,
    Low,
}

impl Group {
    /// Plot and legend order.
    pub const ALL: [Group; 2] = [Group::High, Group::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::High => "High",
            Group::Low => "Low",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every sample labelled exactly once, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAssignment {
    /// Threshold the labels were derived from.
    median: f64,
    labels: Vec<(String, Group)>,
}

impl GroupAssignment {
    pub fn median(&self) -> f64 {
        self.median
    }

    /// `(sample_id, group)` pairs in sample order.
    pub fn labels(&self) -> &[(String, Group)] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn group_of(&self, sample_id: &str) -> Option<Group> {
        self.labels
            .iter()
            .find(|(s, _)| s == sample_id)
            .map(|(_, g)| *g)
    }

    /// Sample ids in `group`, in sample order.
    pub fn members(&self, group: Group) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, g)| *g == group)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    pub fn count(&self, group: Group) -> usize {
        self.labels.iter().filter(|(_, g)| *g == group).count()
    }
}

/// Median with the even-count rule (mean of the two central values).
///
/// Sorts a private copy; returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        // Halve before adding so two large finite values cannot overflow.
        Some(sorted[mid - 1] / 2.0 + sorted[mid] / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Label each sample High when its value is strictly above the median.
pub fn split_by_median(sample_ids: &[String], values: &[f64]) -> Result<GroupAssignment> {
    if sample_ids.len() != values.len() {
        return Err(OmicsError::MalformedInput(format!(
            "{} sample ids for {} values",
            sample_ids.len(),
            values.len()
        )));
    }
    let median = median(values)
        .ok_or_else(|| OmicsError::MalformedInput("cannot split an empty feature".to_string()))?;

    let labels = sample_ids
        .iter()
        .zip(values)
        .map(|(id, &v)| {
            let group = if v > median { Group::High } else { Group::Low };
            (id.clone(), group)
        })
        .collect();
    Ok(GroupAssignment { median, labels })
}

/// Split the samples on the first (most variable) selected feature.
pub fn assign_groups(selection: &FeatureSelection) -> Result<GroupAssignment> {
    let feature = selection.first();
    let groups = split_by_median(selection.sample_ids(), &feature.values)?;
    info!(
        "Grouped samples on {} (median {:.4}): {} High, {} Low",
        feature.id,
        groups.median(),
        groups.count(Group::High),
        groups.count(Group::Low)
    );
    Ok(groups)
}
