//! Epoch quantization
//!
//! Groups observation epochs into clusters of nearby times, e.g. the
//! sub-bands of a single observing session. Clusters are opened greedily
//! over the sorted times: a time joins the current cluster while it lies
//! within `dt` of the cluster's first member.

use crate::types::{require_positive, InjectError, InjectResult};

/// Clustered epochs
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    /// Mean time of each cluster, in ascending order
    pub centers: Vec<f64>,
    /// Cluster index of each input time, in input order
    pub assignment: Vec<usize>,
}

impl Quantized {
    pub fn num_clusters(&self) -> usize {
        self.centers.len()
    }

    /// N×M indicator matrix with `U[i][j] = 1` when time `i` is in cluster `j`.
    pub fn design_matrix(&self) -> Vec<Vec<f64>> {
        let m = self.centers.len();
        self.assignment
            .iter()
            .map(|&j| {
                let mut row = vec![0.0; m];
                row[j] = 1.0;
                row
            })
            .collect()
    }

    /// Spread one value per cluster back onto the input times.
    pub fn expand(&self, per_cluster: &[f64]) -> InjectResult<Vec<f64>> {
        if per_cluster.len() != self.centers.len() {
            return Err(InjectError::LengthMismatch {
                what: "per-cluster values",
                expected: self.centers.len(),
                actual: per_cluster.len(),
            });
        }
        Ok(self.assignment.iter().map(|&j| per_cluster[j]).collect())
    }
}

/// Cluster `times` with window `dt` (same units as `times`).
pub fn quantize(times: &[f64], dt: f64) -> InjectResult<Quantized> {
    require_positive("dt", dt)?;
    if times.is_empty() {
        return Err(InjectError::LengthMismatch {
            what: "times",
            expected: 1,
            actual: 0,
        });
    }
    if let Some(&bad) = times.iter().find(|t| !t.is_finite()) {
        return Err(InjectError::invalid("time", bad, "must be finite"));
    }

    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));

    let mut assignment = vec![0usize; times.len()];
    let mut sums: Vec<(f64, usize)> = Vec::new();
    let mut reference = f64::NEG_INFINITY;

    for &i in &order {
        let t = times[i];
        if sums.is_empty() || t - reference >= dt {
            reference = t;
            sums.push((0.0, 0));
        }
        let j = sums.len() - 1;
        sums[j].0 += t;
        sums[j].1 += 1;
        assignment[i] = j;
    }

    let centers = sums.iter().map(|&(s, n)| s / n as f64).collect();
    Ok(Quantized {
        centers,
        assignment,
    })
}
