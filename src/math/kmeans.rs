//! Seeded k-means used to initialise emission means.
//!
//! Deterministic given the RNG: initial centers are `k` distinct rows drawn
//! with `rand::seq::index::sample`, then Lloyd iterations run until the
//! assignment stops changing (or `max_iter`).

use nalgebra::DMatrix;
use rand::Rng;

/// Cluster the rows of `data` into `k` centers (returned as a `k × D` matrix).
///
/// Returns `None` when there are fewer rows than clusters or `k == 0`.
pub fn kmeans<R: Rng + ?Sized>(
    data: &DMatrix<f64>,
    k: usize,
    rng: &mut R,
    max_iter: usize,
) -> Option<DMatrix<f64>> {
    let n = data.nrows();
    let d = data.ncols();
    if k == 0 || n < k {
        return None;
    }

    let picks = rand::seq::index::sample(rng, n, k);
    let mut centers = DMatrix::<f64>::zeros(k, d);
    for (c, row) in picks.iter().enumerate() {
        centers.set_row(c, &data.row(row));
    }

    let mut assignment = vec![usize::MAX; n];
    for _ in 0..max_iter.max(1) {
        let mut changed = false;
        for (i, slot) in assignment.iter_mut().enumerate() {
            let nearest = nearest_center(data, i, &centers);
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = DMatrix::<f64>::zeros(k, d);
        let mut counts = vec![0usize; k];
        for (i, &c) in assignment.iter().enumerate() {
            counts[c] += 1;
            for j in 0..d {
                sums[(c, j)] += data[(i, j)];
            }
        }
        for c in 0..k {
            // Empty clusters keep their previous center.
            if counts[c] == 0 {
                continue;
            }
            for j in 0..d {
                centers[(c, j)] = sums[(c, j)] / counts[c] as f64;
            }
        }
    }

    Some(centers)
}

fn nearest_center(data: &DMatrix<f64>, row: usize, centers: &DMatrix<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for c in 0..centers.nrows() {
        let mut dist = 0.0;
        for j in 0..data.ncols() {
            let diff = data[(row, j)] - centers[(c, j)];
            dist += diff * diff;
        }
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}
