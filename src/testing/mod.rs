//! Two-group statistical testing for differential expression

mod fdr;
mod welch;

pub use fdr::benjamini_hochberg;
pub use welch::{welch_t_test, WelchOutcome};

use rayon::prelude::*;

use crate::data::{CountMatrix, SampleMetadata};
use crate::error::{PipelineError, Result};
use crate::io::DifferentialResults;

/// Run the per-gene Welch t-test across the two-group design and apply the
/// BH correction over the full gene set.
///
/// `normalized` is expected to hold log2-scale values, so the fold-change is
/// a direct difference of group means: mean(group 2) - mean(group 1), with
/// group 1 being the condition label seen first in metadata order. Output
/// rows keep the input matrix order.
pub fn differential_test(
    normalized: &CountMatrix,
    metadata: &SampleMetadata,
) -> Result<DifferentialResults> {
    let design = metadata.two_group_design()?;

    let resolve = |samples: &[String]| -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(samples.len());
        let mut missing = Vec::new();
        for id in samples {
            match normalized.sample_index(id) {
                Some(idx) => indices.push(idx),
                None => missing.push(id.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::Schema {
                reason: format!("Samples missing from counts matrix: {}", missing.join(", ")),
            });
        }
        Ok(indices)
    };

    let group1 = resolve(&design.group1_samples)?;
    let group2 = resolve(&design.group2_samples)?;

    if group1.is_empty() || group2.is_empty() {
        return Err(PipelineError::InsufficientData {
            reason: format!(
                "Each condition needs at least one sample (\"{}\": {}, \"{}\": {})",
                design.group1_label,
                group1.len(),
                design.group2_label,
                group2.len()
            ),
        });
    }

    log::info!(
        "Testing {} genes: \"{}\" ({} samples) vs \"{}\" ({} samples)",
        normalized.n_genes(),
        design.group1_label,
        group1.len(),
        design.group2_label,
        group2.len()
    );

    // Per-gene statistics are independent; parallelize over rows and collect
    // back in row order.
    let per_gene: Vec<(f64, f64, WelchOutcome)> = (0..normalized.n_genes())
        .into_par_iter()
        .map(|i| {
            let row = normalized.gene_values(i);
            let values1: Vec<f64> = group1.iter().map(|&j| row[j]).collect();
            let values2: Vec<f64> = group2.iter().map(|&j| row[j]).collect();
            let mean1 = values1.iter().sum::<f64>() / values1.len() as f64;
            let mean2 = values2.iter().sum::<f64>() / values2.len() as f64;
            (mean1, mean2, welch_t_test(&values1, &values2))
        })
        .collect();

    let n = per_gene.len();
    let mut group1_means = Vec::with_capacity(n);
    let mut group2_means = Vec::with_capacity(n);
    let mut log2_fold_changes = Vec::with_capacity(n);
    let mut pvalues = Vec::with_capacity(n);
    let mut degenerate = Vec::with_capacity(n);

    for &(mean1, mean2, outcome) in &per_gene {
        group1_means.push(mean1);
        group2_means.push(mean2);
        log2_fold_changes.push(mean2 - mean1);
        pvalues.push(outcome.p_value);
        degenerate.push(outcome.degenerate);
    }

    let n_degenerate = degenerate.iter().filter(|&&d| d).count();
    if n_degenerate > 0 {
        log::warn!(
            "{} genes had an undefined test statistic; fallback p-values assigned",
            n_degenerate
        );
    }

    let padj = benjamini_hochberg(&pvalues);

    Ok(DifferentialResults {
        gene_ids: normalized.gene_ids().to_vec(),
        group1_label: design.group1_label,
        group2_label: design.group2_label,
        group1_means,
        group2_means,
        log2_fold_changes,
        pvalues,
        padj,
        degenerate,
    })
}
