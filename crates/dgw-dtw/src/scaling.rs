//! Uniform scaling: nearest-neighbour up-scaling and window-mean shrinking.

use crate::error::DtwError;
use crate::sequence::{Sequence, SequenceView};

/// Result of [`uniform_scale_to`]: the scaled sequence and, for each destination
/// row, the source row it was copied from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSequence {
    /// The up-scaled sequence, free of padding.
    pub sequence: Sequence,
    /// `path[i]` is the source row copied into destination row `i`.
    pub path: Vec<usize>,
}

/// Stretch a sequence to `target_len` rows by nearest-neighbour rescaling.
///
/// Destination row `i` copies source row `floor(i * len / target_len)`, where
/// `len` is the semantic length of `sequence`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::EmptySequence`] | `sequence` has no non-padded rows |
/// | [`DtwError::ShrinkNotAllowed`] | `target_len` is below the semantic length |
/// | [`DtwError::InconsistentPadding`] | `sequence` is malformed |
pub fn uniform_scale_to(
    sequence: SequenceView<'_>,
    target_len: usize,
) -> Result<ScaledSequence, DtwError> {
    let body = sequence.strip_padding()?;
    let len = body.n_rows();
    if len == 0 {
        return Err(DtwError::EmptySequence);
    }
    if target_len < len {
        return Err(DtwError::ShrinkNotAllowed {
            target: target_len,
            length: len,
        });
    }

    let path: Vec<usize> = (0..target_len).map(|i| i * len / target_len).collect();
    let mut values = Vec::with_capacity(target_len * body.ndim());
    for &src in &path {
        values.extend_from_slice(body.row(src));
    }

    Ok(ScaledSequence {
        sequence: Sequence::new(values, body.ndim())?,
        path,
    })
}

/// Shrink a sequence to `target_len` rows by averaging contiguous windows.
///
/// Destination row `k` is the weighted mean of the source rows overlapping the
/// fractional window `[k * w, (k + 1) * w)` with `w = len / target_len`. Rows cut
/// by a window edge contribute in proportion to the overlap.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::EmptySequence`] | `sequence` has no non-padded rows, or `target_len` is zero |
/// | [`DtwError::ExpandNotAllowed`] | `target_len` exceeds the semantic length |
/// | [`DtwError::InconsistentPadding`] | `sequence` is malformed |
pub fn uniform_shrink_to(
    sequence: SequenceView<'_>,
    target_len: usize,
) -> Result<Sequence, DtwError> {
    let body = sequence.strip_padding()?;
    let len = body.n_rows();
    if len == 0 || target_len == 0 {
        return Err(DtwError::EmptySequence);
    }
    if target_len > len {
        return Err(DtwError::ExpandNotAllowed {
            target: target_len,
            length: len,
        });
    }

    let ndim = body.ndim();
    let width = len as f64 / target_len as f64;
    let mut values = vec![0.0; target_len * ndim];

    for (k, out) in values.chunks_exact_mut(ndim).enumerate() {
        let start = k as f64 * width;
        let end = ((k + 1) as f64 * width).min(len as f64);
        let first = start.floor() as usize;
        let last = (end.ceil() as usize).min(len);

        let mut total_weight = 0.0;
        for src in first..last {
            let weight = end.min((src + 1) as f64) - start.max(src as f64);
            if weight <= 0.0 {
                continue;
            }
            total_weight += weight;
            for (o, &v) in out.iter_mut().zip(body.row(src)) {
                *o += weight * v;
            }
        }
        debug_assert!((total_weight - width).abs() < 1e-6);
        for o in out.iter_mut() {
            *o /= total_weight;
        }
    }

    Sequence::new(values, ndim)
}
