//! Differential expression results structure

use serde::{Deserialize, Serialize};

/// Per-gene results of the two-group differential test.
///
/// All vectors are parallel to `gene_ids`, which keeps the row order of the
/// input matrix regardless of the internal sort used by the BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialResults {
    /// Gene identifiers, in input matrix order
    pub gene_ids: Vec<String>,
    /// Condition label of group 1 (first seen in metadata)
    pub group1_label: String,
    /// Condition label of group 2
    pub group2_label: String,
    /// Mean normalized expression within group 1
    pub group1_means: Vec<f64>,
    /// Mean normalized expression within group 2
    pub group2_means: Vec<f64>,
    /// log2 fold-change: group2 mean - group1 mean (values are log2-scale)
    pub log2_fold_changes: Vec<f64>,
    /// Raw Welch t-test p-values
    pub pvalues: Vec<f64>,
    /// BH-adjusted p-values
    pub padj: Vec<f64>,
    /// Rows where the test statistic was undefined and a fallback p-value
    /// was assigned
    pub degenerate: Vec<bool>,
}

impl DifferentialResults {
    /// Get number of genes
    pub fn n_genes(&self) -> usize {
        self.gene_ids.len()
    }

    /// Genes passing raw p-value and |log2FC| cutoffs
    pub fn significant_indices(&self, p_cutoff: f64, lfc_cutoff: f64) -> Vec<usize> {
        (0..self.n_genes())
            .filter(|&i| {
                let p = self.pvalues[i];
                let lfc = self.log2_fold_changes[i];
                p.is_finite() && p <= p_cutoff && lfc.abs() >= lfc_cutoff
            })
            .collect()
    }

    /// Indices of the `n` genes with the smallest raw p-values
    pub fn top_by_pvalue(&self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.n_genes())
            .filter(|&i| self.pvalues[i].is_finite())
            .collect();
        order.sort_by(|&a, &b| {
            self.pvalues[a]
                .partial_cmp(&self.pvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(n);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> DifferentialResults {
        DifferentialResults {
            gene_ids: vec!["g1".into(), "g2".into(), "g3".into()],
            group1_label: "Tumor".into(),
            group2_label: "Normal".into(),
            group1_means: vec![5.0, 2.0, 0.0],
            group2_means: vec![2.0, 4.5, 0.0],
            log2_fold_changes: vec![-3.0, 2.5, 0.0],
            pvalues: vec![0.01, 0.04, 1.0],
            padj: vec![0.03, 0.06, 1.0],
            degenerate: vec![false, false, true],
        }
    }

    #[test]
    fn test_significant_indices() {
        let results = sample_results();
        assert_eq!(results.significant_indices(0.05, 1.0), vec![0, 1]);
        assert_eq!(results.significant_indices(0.02, 1.0), vec![0]);
        assert_eq!(results.significant_indices(0.05, 2.8), vec![0]);
    }

    #[test]
    fn test_top_by_pvalue() {
        let results = sample_results();
        assert_eq!(results.top_by_pvalue(2), vec![0, 1]);
        assert_eq!(results.top_by_pvalue(10), vec![0, 1, 2]);
    }
}
