//! Multiple-testing correction

/// Apply Benjamini-Hochberg FDR correction to p-values.
///
/// Returns adjusted p-values controlling the false discovery rate:
/// sort ascending, adjusted = p * n / rank, then a running minimum from the
/// largest rank down enforces monotonicity, clamped to [0, 1]. NaN inputs
/// are excluded from n and stay NaN in the output. Input order is preserved.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    if n == 0 {
        return vec![];
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| {
        let (pa, pb) = (pvalues[a], pvalues[b]);
        // NaN sorts last
        match (pa.is_nan(), pb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => pa.partial_cmp(&pb).unwrap(),
        }
    });

    let m = pvalues.iter().filter(|p| p.is_finite()).count();
    if m == 0 {
        return vec![f64::NAN; n];
    }

    let mut padj = vec![f64::NAN; n];
    let mut running_min = f64::INFINITY;
    let mut rank = m;

    for &i in indices.iter().rev() {
        let p = pvalues[i];
        if p.is_finite() {
            let adjusted = (p * m as f64 / rank as f64).clamp(0.0, 1.0);
            running_min = running_min.min(adjusted);
            padj[i] = running_min;
            rank -= 1;
        }
    }

    padj
}
