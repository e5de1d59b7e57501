//! Count matrix representation for RNA-seq data

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::data::AnnotationMap;
use crate::error::{PipelineError, Result};

/// A count matrix of RNA-seq values.
/// Rows are genes, columns are samples. Holds raw counts before normalization
/// and log2(CPM+1) values after.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    /// Cell values (genes x samples)
    values: Array2<f64>,
    /// Gene identifiers (unique, non-empty)
    gene_ids: Vec<String>,
    /// Sample identifiers
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new count matrix from raw data.
    ///
    /// Gene identifiers must be unique and non-empty; raw inputs with
    /// duplicate identifiers are rejected rather than silently renamed.
    pub fn new(
        values: Array2<f64>,
        gene_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (n_genes, n_samples) = values.dim();

        if gene_ids.len() != n_genes {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} gene IDs", n_genes),
                got: format!("{} gene IDs", gene_ids.len()),
            });
        }

        if sample_ids.len() != n_samples {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} sample IDs", n_samples),
                got: format!("{} sample IDs", sample_ids.len()),
            });
        }

        if n_genes == 0 {
            return Err(PipelineError::EmptyInput {
                reason: "Count matrix has zero genes".to_string(),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::EmptyInput {
                reason: "Count matrix has zero samples".to_string(),
            });
        }

        if values.iter().any(|&x| x.is_nan() || x.is_infinite()) {
            return Err(PipelineError::Schema {
                reason: "Matrix values must be finite".to_string(),
            });
        }

        if gene_ids.iter().any(|id| id.is_empty()) {
            return Err(PipelineError::Schema {
                reason: "Gene identifiers must be non-empty".to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(n_genes);
        for id in &gene_ids {
            if !seen.insert(id.as_str()) {
                return Err(PipelineError::Schema {
                    reason: format!("Duplicate gene identifier '{}'", id),
                });
            }
        }

        Ok(Self {
            values,
            gene_ids,
            sample_ids,
        })
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of samples
    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Get the values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Get gene IDs
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Get sample IDs
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get values for a specific gene
    pub fn gene_values(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Column totals (library sizes), computed from the current values
    pub fn library_sizes(&self) -> Vec<f64> {
        self.values.axis_iter(Axis(1)).map(|col| col.sum()).collect()
    }

    /// Validate that all values are non-negative, as required for raw counts
    pub fn validate_non_negative(&self) -> Result<()> {
        if self.values.iter().any(|&x| x < 0.0) {
            return Err(PipelineError::Schema {
                reason: "Raw counts must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Reorder columns to match the given sample list.
    ///
    /// Every requested sample must exist in the matrix. The pipeline calls
    /// this only after cross-validating the matrix and metadata sample sets,
    /// so the list covers every column and the effect is a pure reordering.
    pub fn select_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let mut indices = Vec::with_capacity(sample_ids.len());
        let mut missing = Vec::new();
        for id in sample_ids {
            match self.sample_index(id) {
                Some(idx) => indices.push(idx),
                None => missing.push(id.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::Schema {
                reason: format!("Samples missing from counts matrix: {}", missing.join(", ")),
            });
        }

        let values = self.values.select(Axis(1), &indices);
        Self::new(values, self.gene_ids.clone(), sample_ids.to_vec())
    }

    /// Rewrite gene identifiers through an annotation map, merging rows whose
    /// remapped identifiers collide by summing their raw counts.
    ///
    /// Genes without a mapping keep their original identifier. Row order
    /// follows the first occurrence of each resulting identifier.
    pub fn relabel_genes(&self, annotation: &AnnotationMap) -> Result<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, id) in self.gene_ids.iter().enumerate() {
            let label = annotation.symbol_for(id).unwrap_or(id.as_str());
            match groups.get_mut(label) {
                Some(rows) => rows.push(i),
                None => {
                    order.push(label.to_string());
                    groups.insert(label.to_string(), vec![i]);
                }
            }
        }

        let n_merged = self.n_genes() - order.len();
        if n_merged > 0 {
            log::info!(
                "Merged {} duplicate gene identifiers after annotation remap",
                n_merged
            );
        }

        let mut values = Array2::zeros((order.len(), self.n_samples()));
        for (row, label) in order.iter().enumerate() {
            for &src in &groups[label] {
                for j in 0..self.n_samples() {
                    values[[row, j]] += self.values[[src, j]];
                }
            }
        }

        Self::new(values, order, self.sample_ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_count_matrix_creation() {
        let values = array![[10.0, 20.0, 30.0], [5.0, 15.0, 25.0]];
        let matrix =
            CountMatrix::new(values, ids(&["gene1", "gene2"]), ids(&["s1", "s2", "s3"])).unwrap();
        assert_eq!(matrix.n_genes(), 2);
        assert_eq!(matrix.n_samples(), 3);
    }

    #[test]
    fn test_duplicate_gene_ids_rejected() {
        let values = array![[10.0, 20.0], [5.0, 15.0]];
        let result = CountMatrix::new(values, ids(&["gene1", "gene1"]), ids(&["s1", "s2"]));
        assert!(matches!(result, Err(PipelineError::Schema { .. })));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let values = Array2::<f64>::zeros((0, 2));
        let result = CountMatrix::new(values, vec![], ids(&["s1", "s2"]));
        assert!(matches!(result, Err(PipelineError::EmptyInput { .. })));
    }

    #[test]
    fn test_library_sizes() {
        let values = array![[10.0, 20.0], [5.0, 15.0]];
        let matrix = CountMatrix::new(values, ids(&["gene1", "gene2"]), ids(&["s1", "s2"])).unwrap();
        assert_eq!(matrix.library_sizes(), vec![15.0, 35.0]);
    }

    #[test]
    fn test_select_samples_reorders_and_drops() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let matrix =
            CountMatrix::new(values, ids(&["g1", "g2"]), ids(&["s1", "s2", "s3"])).unwrap();

        let subset = matrix.select_samples(&ids(&["s3", "s1"])).unwrap();
        assert_eq!(subset.sample_ids(), &ids(&["s3", "s1"])[..]);
        assert_eq!(subset.values()[[0, 0]], 3.0);
        assert_eq!(subset.values()[[0, 1]], 1.0);

        let missing = matrix.select_samples(&ids(&["s1", "s9"]));
        assert!(matches!(missing, Err(PipelineError::Schema { .. })));
    }

    #[test]
    fn test_relabel_merges_by_summing() {
        let values = array![[1.0, 2.0], [10.0, 20.0], [100.0, 200.0]];
        let matrix =
            CountMatrix::new(values, ids(&["ENSG1", "ENSG2", "ENSG3"]), ids(&["s1", "s2"]))
                .unwrap();

        let mut annotation = AnnotationMap::new();
        annotation.insert("ENSG1", "TP53");
        annotation.insert("ENSG2", "TP53");

        let relabeled = matrix.relabel_genes(&annotation).unwrap();
        assert_eq!(relabeled.gene_ids(), &ids(&["TP53", "ENSG3"])[..]);
        assert_eq!(relabeled.values()[[0, 0]], 11.0);
        assert_eq!(relabeled.values()[[0, 1]], 22.0);
        assert_eq!(relabeled.values()[[1, 0]], 100.0);
    }
}
