//! Library-size normalization: log2(CPM + 1)

use ndarray::Array2;

use crate::data::{AnnotationMap, CountMatrix, SampleMetadata};
use crate::error::Result;

/// Normalize a raw count matrix to log2(counts-per-million + 1).
///
/// Column totals are taken from the raw counts, per sample. When an
/// annotation map is supplied, gene identifiers are rewritten to symbols
/// first; rows whose remapped identifiers collide are merged by summing raw
/// counts before the transform. Output columns follow metadata sample order.
pub fn normalize(
    counts: &CountMatrix,
    metadata: &SampleMetadata,
    annotation: Option<&AnnotationMap>,
) -> Result<CountMatrix> {
    counts.validate_non_negative()?;
    metadata.validate_against_samples(counts.sample_ids())?;

    let relabeled;
    let counts = match annotation {
        Some(map) if !map.is_empty() => {
            relabeled = counts.relabel_genes(map)?;
            &relabeled
        }
        _ => counts,
    };

    let aligned = counts.select_samples(metadata.sample_ids())?;
    let transformed = log2_cpm(&aligned);

    log::info!(
        "Normalized {} genes x {} samples to log2(CPM+1)",
        aligned.n_genes(),
        aligned.n_samples()
    );

    CountMatrix::new(
        transformed,
        aligned.gene_ids().to_vec(),
        aligned.sample_ids().to_vec(),
    )
}

/// log2(count / column_total * 1e6 + 1), column-wise.
/// An all-zero column has total 0; its cells normalize to log2(0 + 1) = 0.
fn log2_cpm(counts: &CountMatrix) -> Array2<f64> {
    let totals = counts.library_sizes();
    let (n_genes, n_samples) = (counts.n_genes(), counts.n_samples());

    let mut result = counts.values().to_owned();
    for j in 0..n_samples {
        let total = totals[j].max(1.0);
        for i in 0..n_genes {
            result[[i, j]] = (result[[i, j]] / total * 1e6 + 1.0).log2();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnnotationMap;
    use ndarray::array;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn meta(samples: &[&str], conditions: &[&str]) -> SampleMetadata {
        SampleMetadata::new(ids(samples), ids(conditions)).unwrap()
    }

    #[test]
    fn test_log2_cpm_values() {
        let counts = CountMatrix::new(
            array![[90.0, 50.0], [10.0, 50.0]],
            ids(&["g1", "g2"]),
            ids(&["s1", "s2"]),
        )
        .unwrap();
        let metadata = meta(&["s1", "s2"], &["a", "b"]);

        let normalized = normalize(&counts, &metadata, None).unwrap();

        // s1 total = 100: g1 -> log2(90/100*1e6 + 1), g2 -> log2(10/100*1e6 + 1)
        let expected_g1 = (900_000.0_f64 + 1.0).log2();
        let expected_g2 = (100_000.0_f64 + 1.0).log2();
        assert!((normalized.values()[[0, 0]] - expected_g1).abs() < 1e-12);
        assert!((normalized.values()[[1, 0]] - expected_g2).abs() < 1e-12);
    }

    #[test]
    fn test_dimensions_preserved_and_finite() {
        let counts = CountMatrix::new(
            array![[0.0, 5.0, 2.0], [3.0, 0.0, 7.0]],
            ids(&["g1", "g2"]),
            ids(&["s1", "s2", "s3"]),
        )
        .unwrap();
        let metadata = meta(&["s1", "s2", "s3"], &["a", "a", "b"]);

        let normalized = normalize(&counts, &metadata, None).unwrap();
        assert_eq!(normalized.n_genes(), 2);
        assert_eq!(normalized.n_samples(), 3);
        assert!(normalized.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_totals_come_from_raw_counts() {
        // Re-normalizing the output must not be a fixed point: the column
        // totals of log2 values differ from the raw library sizes.
        let counts = CountMatrix::new(
            array![[100.0, 10.0], [50.0, 90.0]],
            ids(&["g1", "g2"]),
            ids(&["s1", "s2"]),
        )
        .unwrap();
        let metadata = meta(&["s1", "s2"], &["a", "b"]);

        let once = normalize(&counts, &metadata, None).unwrap();
        let twice = normalize(&once, &metadata, None).unwrap();
        assert!((once.values()[[0, 0]] - twice.values()[[0, 0]]).abs() > 1e-6);
    }

    #[test]
    fn test_all_zero_column_normalizes_to_zero() {
        let counts = CountMatrix::new(
            array![[0.0, 5.0], [0.0, 5.0]],
            ids(&["g1", "g2"]),
            ids(&["s1", "s2"]),
        )
        .unwrap();
        let metadata = meta(&["s1", "s2"], &["a", "b"]);

        let normalized = normalize(&counts, &metadata, None).unwrap();
        assert_eq!(normalized.values()[[0, 0]], 0.0);
        assert_eq!(normalized.values()[[1, 0]], 0.0);
    }

    #[test]
    fn test_annotation_remap_before_normalization() {
        // Two rows mapping to the same symbol must merge raw counts first:
        // log2((10+90)/100 * 1e6 + 1), not a sum of transformed values.
        let counts = CountMatrix::new(
            array![[10.0], [90.0]],
            ids(&["ENSG1", "ENSG2"]),
            ids(&["s1"]),
        )
        .unwrap();
        let metadata = meta(&["s1"], &["a"]);

        let mut annotation = AnnotationMap::new();
        annotation.insert("ENSG1", "TP53");
        annotation.insert("ENSG2", "TP53");

        let normalized = normalize(&counts, &metadata, Some(&annotation)).unwrap();
        assert_eq!(normalized.n_genes(), 1);
        assert_eq!(normalized.gene_ids()[0], "TP53");
        let expected = (1e6_f64 + 1.0).log2();
        assert!((normalized.values()[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_metadata_mismatch_rejected() {
        let counts = CountMatrix::new(
            array![[1.0, 2.0]],
            ids(&["g1"]),
            ids(&["s1", "s2"]),
        )
        .unwrap();
        let metadata = meta(&["s1", "s3"], &["a", "b"]);
        assert!(normalize(&counts, &metadata, None).is_err());
    }
}
