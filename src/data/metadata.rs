//! Sample metadata: condition labels for the two-group design

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Per-sample condition labels, in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMetadata {
    sample_ids: Vec<String>,
    conditions: Vec<String>,
}

/// The two-group partition resolved from sample metadata.
///
/// Group 1 is the first condition label seen in file order; group 2 is the
/// other. This ordering is the fold-change sign convention: log2FC is
/// mean(group 2) - mean(group 1).
#[derive(Debug, Clone)]
pub struct TwoGroupDesign {
    pub group1_label: String,
    pub group2_label: String,
    pub group1_samples: Vec<String>,
    pub group2_samples: Vec<String>,
}

impl SampleMetadata {
    /// Create sample metadata from parallel id/condition vectors.
    pub fn new(sample_ids: Vec<String>, conditions: Vec<String>) -> Result<Self> {
        if conditions.len() != sample_ids.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} condition labels", sample_ids.len()),
                got: format!("{} condition labels", conditions.len()),
            });
        }
        if sample_ids.is_empty() {
            return Err(PipelineError::EmptyInput {
                reason: "No samples in metadata".to_string(),
            });
        }
        if sample_ids.iter().any(|id| id.is_empty()) {
            return Err(PipelineError::Schema {
                reason: "Sample identifiers must be non-empty".to_string(),
            });
        }
        if conditions.iter().any(|c| c.is_empty()) {
            return Err(PipelineError::Schema {
                reason: "Every sample must have a non-empty condition label".to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(sample_ids.len());
        for id in &sample_ids {
            if !seen.insert(id.as_str()) {
                return Err(PipelineError::Schema {
                    reason: format!("Duplicate sample identifier '{}'", id),
                });
            }
        }

        Ok(Self {
            sample_ids,
            conditions,
        })
    }

    /// Get sample IDs in file order
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get condition labels, parallel to `sample_ids`
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Get number of samples
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Condition label for a sample, if present
    pub fn condition_of(&self, sample_id: &str) -> Option<&str> {
        self.sample_ids
            .iter()
            .position(|id| id == sample_id)
            .map(|i| self.conditions[i].as_str())
    }

    /// Distinct condition labels in first-seen order
    pub fn condition_levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for c in &self.conditions {
            if !levels.contains(&c.as_str()) {
                levels.push(c.as_str());
            }
        }
        levels
    }

    /// Resolve the two-group design.
    ///
    /// Fails unless exactly two distinct condition labels are present.
    pub fn two_group_design(&self) -> Result<TwoGroupDesign> {
        let levels = self.condition_levels();
        if levels.len() != 2 {
            return Err(PipelineError::Schema {
                reason: format!(
                    "Metadata must describe exactly two conditions, found {}: [{}]",
                    levels.len(),
                    levels.join(", ")
                ),
            });
        }

        let (group1_label, group2_label) = (levels[0].to_string(), levels[1].to_string());
        let partition = |label: &str| -> Vec<String> {
            self.sample_ids
                .iter()
                .zip(self.conditions.iter())
                .filter(|(_, c)| c.as_str() == label)
                .map(|(id, _)| id.clone())
                .collect()
        };

        Ok(TwoGroupDesign {
            group1_samples: partition(&group1_label),
            group2_samples: partition(&group2_label),
            group1_label,
            group2_label,
        })
    }

    /// Cross-validate against the sample columns of a count matrix.
    ///
    /// Every matrix column must have a metadata entry and every metadata
    /// sample must be a matrix column.
    pub fn validate_against_samples(&self, matrix_samples: &[String]) -> Result<()> {
        let missing_in_meta: Vec<&str> = matrix_samples
            .iter()
            .filter(|id| !self.sample_ids.contains(id))
            .map(|s| s.as_str())
            .collect();
        let missing_in_matrix: Vec<&str> = self
            .sample_ids
            .iter()
            .filter(|id| !matrix_samples.contains(id))
            .map(|s| s.as_str())
            .collect();

        if !missing_in_meta.is_empty() || !missing_in_matrix.is_empty() {
            let mut msg = String::from("Sample IDs do not match between counts and metadata.");
            if !missing_in_meta.is_empty() {
                msg.push_str(&format!(" In counts but not metadata: {:?}.", missing_in_meta));
            }
            if !missing_in_matrix.is_empty() {
                msg.push_str(&format!(" In metadata but not counts: {:?}.", missing_in_matrix));
            }
            return Err(PipelineError::Schema { reason: msg });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_group_design_first_seen_order() {
        let meta = SampleMetadata::new(
            ids(&["s1", "s2", "s3", "s4"]),
            ids(&["Tumor", "Tumor", "Normal", "Normal"]),
        )
        .unwrap();

        let design = meta.two_group_design().unwrap();
        assert_eq!(design.group1_label, "Tumor");
        assert_eq!(design.group2_label, "Normal");
        assert_eq!(design.group1_samples, ids(&["s1", "s2"]));
        assert_eq!(design.group2_samples, ids(&["s3", "s4"]));
    }

    #[test]
    fn test_three_conditions_rejected() {
        let meta = SampleMetadata::new(
            ids(&["s1", "s2", "s3"]),
            ids(&["a", "b", "c"]),
        )
        .unwrap();
        assert!(matches!(
            meta.two_group_design(),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn test_empty_condition_rejected() {
        let result = SampleMetadata::new(ids(&["s1", "s2"]), ids(&["Tumor", ""]));
        assert!(matches!(result, Err(PipelineError::Schema { .. })));
    }

    #[test]
    fn test_validate_against_samples() {
        let meta = SampleMetadata::new(ids(&["s1", "s2"]), ids(&["a", "b"])).unwrap();
        assert!(meta.validate_against_samples(&ids(&["s1", "s2"])).is_ok());
        assert!(meta.validate_against_samples(&ids(&["s1", "s3"])).is_err());
        assert!(meta.validate_against_samples(&ids(&["s1"])).is_err());
    }
}
