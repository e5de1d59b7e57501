//! Intersection of significant genes with a curated actionable list

use serde::{Deserialize, Serialize};

use crate::data::ActionableList;
use crate::io::DifferentialResults;

/// Significance thresholds applied to the differential results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignificancePolicy {
    /// Maximum raw p-value
    pub p_value_cutoff: f64,
    /// Minimum |log2 fold-change|
    pub log2_fc_cutoff: f64,
}

impl Default for SignificancePolicy {
    fn default() -> Self {
        Self {
            p_value_cutoff: 0.05,
            log2_fc_cutoff: 1.0,
        }
    }
}

/// A significant gene matched against the actionable list, carrying all
/// differential fields plus the list's extra columns.
#[derive(Debug, Clone)]
pub struct ActionableHit {
    pub gene_id: String,
    pub group1_mean: f64,
    pub group2_mean: f64,
    pub log2_fold_change: f64,
    pub p_value: f64,
    pub p_adj: f64,
    /// Extra columns from the actionable list, in list column order
    pub annotations: Vec<String>,
}

/// Scalar aggregate of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_genes: usize,
    pub significant_genes: usize,
    pub actionable_significant_genes: usize,
    pub p_value_cutoff: f64,
    pub log2_fc_cutoff: f64,
}

impl std::fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Differential expression summary")?;
        writeln!(f, "===============================")?;
        writeln!(f, "Genes tested: {}", self.total_genes)?;
        writeln!(
            f,
            "Significant (p <= {}, |log2FC| >= {}): {}",
            self.p_value_cutoff, self.log2_fc_cutoff, self.significant_genes
        )?;
        writeln!(f, "Actionable and significant: {}", self.actionable_significant_genes)?;
        Ok(())
    }
}

/// Filter differential results by the significance policy and join the
/// surviving genes against the actionable list.
///
/// The join uses normalized identifiers (trimmed, case-insensitive) on both
/// sides. Zero hits is a valid outcome.
pub fn actionable_report(
    results: &DifferentialResults,
    actionable: &ActionableList,
    policy: &SignificancePolicy,
) -> (Vec<ActionableHit>, SummaryStats) {
    let significant = results.significant_indices(policy.p_value_cutoff, policy.log2_fc_cutoff);

    let hits: Vec<ActionableHit> = significant
        .iter()
        .filter_map(|&i| {
            actionable
                .lookup(&results.gene_ids[i])
                .map(|entry| ActionableHit {
                    gene_id: results.gene_ids[i].clone(),
                    group1_mean: results.group1_means[i],
                    group2_mean: results.group2_means[i],
                    log2_fold_change: results.log2_fold_changes[i],
                    p_value: results.pvalues[i],
                    p_adj: results.padj[i],
                    annotations: entry.extra.clone(),
                })
        })
        .collect();

    let summary = SummaryStats {
        total_genes: results.n_genes(),
        significant_genes: significant.len(),
        actionable_significant_genes: hits.len(),
        p_value_cutoff: policy.p_value_cutoff,
        log2_fc_cutoff: policy.log2_fc_cutoff,
    };

    log::info!(
        "{} of {} genes significant, {} actionable",
        summary.significant_genes,
        summary.total_genes,
        summary.actionable_significant_genes
    );

    (hits, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ActionableEntry;

    fn sample_results() -> DifferentialResults {
        DifferentialResults {
            gene_ids: vec!["TP53".into(), "BRCA1".into(), "GAPDH".into()],
            group1_label: "Tumor".into(),
            group2_label: "Normal".into(),
            group1_means: vec![8.0, 3.0, 10.0],
            group2_means: vec![4.0, 6.0, 10.1],
            log2_fold_changes: vec![-4.0, 3.0, 0.1],
            pvalues: vec![0.001, 0.01, 0.8],
            padj: vec![0.003, 0.015, 0.8],
            degenerate: vec![false, false, false],
        }
    }

    fn actionable(genes: &[(&str, &str)]) -> ActionableList {
        ActionableList::new(
            vec!["therapy".to_string()],
            genes
                .iter()
                .map(|(id, therapy)| ActionableEntry {
                    gene_id: id.to_string(),
                    extra: vec![therapy.to_string()],
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_join_carries_annotations() {
        let list = actionable(&[("TP53", "nutlin"), ("GAPDH", "none")]);
        let (hits, summary) = actionable_report(
            &sample_results(),
            &list,
            &SignificancePolicy::default(),
        );

        // GAPDH is actionable but not significant
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gene_id, "TP53");
        assert_eq!(hits[0].annotations, vec!["nutlin".to_string()]);
        assert_eq!(summary.total_genes, 3);
        assert_eq!(summary.significant_genes, 2);
        assert_eq!(summary.actionable_significant_genes, 1);
    }

    #[test]
    fn test_join_is_case_and_whitespace_insensitive() {
        // Adopted policy: identifiers are trimmed and lowercased on both
        // sides before matching.
        let list = actionable(&[(" tp53 ", "nutlin")]);
        let (hits, _) = actionable_report(
            &sample_results(),
            &list,
            &SignificancePolicy::default(),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gene_id, "TP53");
    }

    #[test]
    fn test_empty_actionable_list() {
        let (hits, summary) = actionable_report(
            &sample_results(),
            &ActionableList::empty(),
            &SignificancePolicy::default(),
        );
        assert!(hits.is_empty());
        assert_eq!(summary.actionable_significant_genes, 0);
        assert_eq!(summary.significant_genes, 2);
    }

    #[test]
    fn test_custom_thresholds() {
        let list = actionable(&[("TP53", "nutlin"), ("BRCA1", "olaparib")]);
        let policy = SignificancePolicy {
            p_value_cutoff: 0.005,
            log2_fc_cutoff: 1.0,
        };
        let (hits, summary) = actionable_report(&sample_results(), &list, &policy);
        assert_eq!(summary.significant_genes, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gene_id, "TP53");
    }
}
