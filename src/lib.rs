//! rnadiff: two-group RNA-seq differential expression
//!
//! A small linear pipeline over a gene-expression count matrix:
//! log2(CPM+1) normalization, per-gene Welch t-test with Benjamini-Hochberg
//! correction, and an intersection of significant genes against a curated
//! actionable list.
//!
//! # Example
//!
//! ```ignore
//! use rnadiff::prelude::*;
//!
//! let counts = read_count_matrix("counts.csv")?;
//! let metadata = read_metadata("metadata.csv")?;
//! let actionable = read_actionable_list("actionable.csv")?;
//!
//! let normalized = normalize(&counts, &metadata, None)?;
//! let results = differential_test(&normalized, &metadata)?;
//! let (hits, summary) = actionable_report(&results, &actionable, &SignificancePolicy::default());
//! ```

pub mod actionable;
pub mod cli;
pub mod data;
pub mod error;
pub mod io;
pub mod normalize;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actionable::{
        actionable_report, ActionableHit, SignificancePolicy, SummaryStats,
    };
    pub use crate::data::{
        ActionableEntry, ActionableList, AnnotationMap, CountMatrix, SampleMetadata,
    };
    pub use crate::error::{PipelineError, Result};
    pub use crate::io::{
        read_actionable_list, read_annotation_map, read_count_matrix, read_metadata, read_results,
        write_actionable_hits, write_matrix, write_results, write_summary, DifferentialResults,
    };
    pub use crate::normalize::normalize;
    pub use crate::testing::{benjamini_hochberg, differential_test, welch_t_test};
}

use prelude::*;

/// Run the full pipeline in memory: normalize, test, intersect.
pub fn run_pipeline(
    counts: &CountMatrix,
    metadata: &SampleMetadata,
    annotation: Option<&AnnotationMap>,
    actionable: &ActionableList,
    policy: &SignificancePolicy,
) -> Result<(CountMatrix, DifferentialResults, Vec<ActionableHit>, SummaryStats)> {
    let normalized = normalize(counts, metadata, annotation)?;
    let results = differential_test(&normalized, metadata)?;
    let (hits, summary) = actionable_report(&results, actionable, policy);
    Ok((normalized, results, hits, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_pipeline() {
        // 4 genes x 4 samples, 2 Tumor vs 2 Normal
        let counts = CountMatrix::new(
            array![
                [100.0, 120.0, 10.0, 8.0], // Down in Normal
                [5.0, 6.0, 50.0, 55.0],    // Up in Normal
                [0.0, 0.0, 0.0, 0.0],      // All zeros
                [30.0, 32.0, 31.0, 29.0],  // Flat
            ],
            ids(&["gene1", "gene2", "gene3", "gene4"]),
            ids(&["s1", "s2", "s3", "s4"]),
        )
        .unwrap();

        let metadata = SampleMetadata::new(
            ids(&["s1", "s2", "s3", "s4"]),
            ids(&["Tumor", "Tumor", "Normal", "Normal"]),
        )
        .unwrap();

        let actionable = ActionableList::new(
            vec!["therapy".to_string()],
            vec![
                ActionableEntry {
                    gene_id: "gene1".to_string(),
                    extra: vec!["drug_a".to_string()],
                },
                ActionableEntry {
                    gene_id: "gene4".to_string(),
                    extra: vec!["drug_b".to_string()],
                },
            ],
        )
        .unwrap();

        let (normalized, results, hits, summary) = run_pipeline(
            &counts,
            &metadata,
            None,
            &actionable,
            &SignificancePolicy::default(),
        )
        .unwrap();

        assert_eq!(normalized.n_genes(), 4);
        assert!(normalized.values().iter().all(|v| v.is_finite()));

        // Group 1 = Tumor (first seen); log2FC = Normal - Tumor
        assert_eq!(results.group1_label, "Tumor");
        assert_eq!(results.group2_label, "Normal");

        // gene1 high in Tumor -> strongly negative fold-change
        assert!(results.log2_fold_changes[0] < -1.0);
        assert!(results.pvalues[0] <= 0.05);

        // gene2 high in Normal -> strongly positive, opposite direction
        assert!(results.log2_fold_changes[1] > 1.0);
        assert!(results.pvalues[1] <= 0.05);

        // gene3 all zeros -> fc 0, fallback p = 1.0, flagged
        assert_eq!(results.log2_fold_changes[2], 0.0);
        assert_eq!(results.pvalues[2], 1.0);
        assert!(results.degenerate[2]);

        // gene4 flat across groups -> |fc| below the cutoff
        assert!(results.log2_fold_changes[3].abs() < 1.0);

        // BH guarantees
        for i in 0..4 {
            assert!(results.padj[i] >= results.pvalues[i]);
            assert!((0.0..=1.0).contains(&results.padj[i]));
        }

        // gene1 is significant and actionable; gene4 actionable but not
        // significant; gene2 significant but not actionable
        assert_eq!(summary.total_genes, 4);
        assert_eq!(summary.significant_genes, 2);
        assert_eq!(summary.actionable_significant_genes, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gene_id, "gene1");
        assert_eq!(hits[0].annotations, vec!["drug_a".to_string()]);
    }

    #[test]
    fn test_pipeline_with_annotation_remap() {
        let counts = CountMatrix::new(
            array![
                [100.0, 110.0, 5.0, 6.0],
                [200.0, 190.0, 10.0, 12.0],
                [50.0, 55.0, 52.0, 48.0],
            ],
            ids(&["ENSG1", "ENSG2", "ENSG3"]),
            ids(&["s1", "s2", "s3", "s4"]),
        )
        .unwrap();

        let metadata = SampleMetadata::new(
            ids(&["s1", "s2", "s3", "s4"]),
            ids(&["Tumor", "Tumor", "Normal", "Normal"]),
        )
        .unwrap();

        let mut annotation = AnnotationMap::new();
        annotation.insert("ENSG1", "MYC");
        annotation.insert("ENSG2", "MYC");

        let (normalized, results, hits, _) = run_pipeline(
            &counts,
            &metadata,
            Some(&annotation),
            &ActionableList::empty(),
            &SignificancePolicy::default(),
        )
        .unwrap();

        // ENSG1 + ENSG2 merged into MYC before normalization
        assert_eq!(normalized.n_genes(), 2);
        assert_eq!(normalized.gene_ids(), &ids(&["MYC", "ENSG3"])[..]);
        assert!(results.log2_fold_changes[0] < -1.0);

        // Empty actionable list: zero hits, no error
        assert!(hits.is_empty());
    }
}
