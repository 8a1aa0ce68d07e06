//! Parallel pairwise DTW over a dataset, producing a condensed distance matrix.

use tracing::{debug, info, instrument};

use crate::dataset::Dataset;
use crate::dtw::Dtw;
use crate::error::{DtwError, EngineError};
use crate::matrix::{DistanceMatrix, condensed_len, pair_at};
use crate::pool::{Parallelism, WorkerPool};

/// Compute DTW distances for every unordered pair of regions.
///
/// The canonical pair order is split into about `4 * parallelism` contiguous
/// chunks. Each chunk owns a disjoint slice of the result vector, so slot `k`
/// always holds the pair of rank `k` and the output does not depend on
/// scheduling.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`EngineError::WorkerFailure`] | A DTW call failed on a worker |
/// | [`EngineError::WorkerPanicked`] | A worker panicked |
#[instrument(skip(dataset, dtw), fields(regions = dataset.len(), workers = parallelism.get()))]
pub fn pairwise_distances(
    dataset: &Dataset,
    dtw: &Dtw,
    parallelism: Parallelism,
) -> Result<DistanceMatrix, EngineError> {
    let n = dataset.len();
    let total = condensed_len(n);
    let mut result = vec![f64::NAN; total];

    if total > 0 {
        let chunk_len = total.div_ceil(4 * parallelism.get());
        debug!(total, chunk_len, "scheduling pair chunks");
        let chunks = result
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(k, slots)| (k * chunk_len, slots));

        let mut done = 0usize;
        WorkerPool::new(parallelism).run(
            chunks,
            |(start, slots): (usize, &mut [f64])| fill_chunk(dataset, dtw, start, slots),
            |count| {
                done += count;
                debug!(done, total, "pair chunk finished");
            },
        )?;
    }

    info!(pairs = total, "pairwise distances computed");
    Ok(DistanceMatrix::from_condensed(n, result)?)
}

/// Compute the pairs of ranks `start..start + slots.len()` into `slots`.
fn fill_chunk(dataset: &Dataset, dtw: &Dtw, start: usize, slots: &mut [f64]) -> Result<usize, DtwError> {
    let n = dataset.len();
    let (mut i, mut j) = pair_at(n, start);
    for slot in slots.iter_mut() {
        *slot = dtw.distance(dataset.sequence(i), dataset.sequence(j))?.value();
        j += 1;
        if j == n {
            i += 1;
            j = i + 1;
        }
    }
    Ok(slots.len())
}
