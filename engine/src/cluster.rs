//! FILENAME: engine/src/cluster.rs
//! PURPOSE: K-means clustering of records over a set of numeric fields.
//! CONTEXT: The iteration is generic over a `ClusterStrategy`, so the
//! assignment and update steps can be swapped without touching callers.
//! `LloydStrategy` is the standard nearest-centroid / mean-update pair.
//!
//! Initialisation is deterministic: the first `k` distinct vectors in record
//! order become the initial centroids, so identical inputs always produce
//! identical labels.

use crate::error::{EngineError, EngineResult};
use crate::record::Record;
use crate::value::OrderedFloat;
use rustc_hash::FxHashSet;

pub type Point = Vec<f64>;

/// The three steps of an iterative centroid clustering.
pub trait ClusterStrategy {
    /// Index of the centroid each point belongs to.
    fn assign(&self, points: &[Point], centroids: &[Point]) -> Vec<usize>;

    /// New centroids from the current assignment.
    fn recompute(&self, points: &[Point], assignment: &[usize], centroids: &[Point]) -> Vec<Point>;

    /// Whether iteration stops after `iteration` rounds.
    fn has_converged(&self, previous: &[usize], current: &[usize], iteration: usize) -> bool;
}

/// Lloyd's algorithm with an iteration cap.
#[derive(Debug, Clone, Copy)]
pub struct LloydStrategy {
    pub max_iterations: usize,
}

impl Default for LloydStrategy {
    fn default() -> Self {
        LloydStrategy { max_iterations: 100 }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

impl ClusterStrategy for LloydStrategy {
    fn assign(&self, points: &[Point], centroids: &[Point]) -> Vec<usize> {
        points
            .iter()
            .map(|point| {
                let mut best = 0;
                let mut best_distance = f64::INFINITY;
                for (index, centroid) in centroids.iter().enumerate() {
                    let distance = squared_distance(point, centroid);
                    // strict comparison keeps the lowest index on ties
                    if distance < best_distance {
                        best = index;
                        best_distance = distance;
                    }
                }
                best
            })
            .collect()
    }

    fn recompute(&self, points: &[Point], assignment: &[usize], centroids: &[Point]) -> Vec<Point> {
        let mut sums: Vec<Point> = centroids.iter().map(|c| vec![0.0; c.len()]).collect();
        let mut counts = vec![0usize; centroids.len()];

        for (point, &cluster) in points.iter().zip(assignment) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(point) {
                *sum += value;
            }
        }

        sums.into_iter()
            .zip(counts)
            .zip(centroids)
            .map(|((sum, count), previous)| {
                if count == 0 {
                    previous.clone()
                } else {
                    sum.into_iter().map(|s| s / count as f64).collect()
                }
            })
            .collect()
    }

    fn has_converged(&self, previous: &[usize], current: &[usize], iteration: usize) -> bool {
        previous == current || iteration >= self.max_iterations
    }
}

/// Runs k-means and returns the 0-based cluster of every point.
pub fn kmeans<S: ClusterStrategy>(points: &[Point], k: usize, strategy: &S) -> Vec<usize> {
    let mut seen = FxHashSet::default();
    let mut centroids: Vec<Point> = points
        .iter()
        .filter(|p| seen.insert(p.iter().map(|v| OrderedFloat(*v)).collect::<Vec<_>>()))
        .take(k)
        .cloned()
        .collect();

    if centroids.is_empty() {
        return Vec::new();
    }

    let mut assignment = strategy.assign(points, &centroids);
    let mut iteration = 1;
    loop {
        centroids = strategy.recompute(points, &assignment, &centroids);
        let next = strategy.assign(points, &centroids);
        let done = strategy.has_converged(&assignment, &next, iteration);
        assignment = next;
        if done {
            break;
        }
        iteration += 1;
    }

    log::debug!(
        target: "CLUSTER",
        "k-means: {} points, {} centroids, {} iterations",
        points.len(),
        centroids.len(),
        iteration
    );
    assignment
}

/// Labels every record with a `Cluster` field such as `"Cluster 2"`.
/// Field values are coerced to numbers; non-numeric values count as 0.
pub fn cluster_records(records: &[Record], k: usize, fields: &[String]) -> EngineResult<Vec<Record>> {
    if k == 0 {
        return Err(EngineError::MissingParameter("k".to_string()));
    }
    if fields.is_empty() {
        return Err(EngineError::MissingParameter("fields".to_string()));
    }

    let points: Vec<Point> = records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| record.value(field).as_number().unwrap_or(0.0))
                .collect()
        })
        .collect();

    let assignment = kmeans(&points, k, &LloydStrategy::default());

    Ok(records
        .iter()
        .zip(assignment)
        .map(|(record, cluster)| record.with("Cluster", format!("Cluster {}", cluster + 1)))
        .collect())
}
