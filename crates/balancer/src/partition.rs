//! Splitting flat unit lists into per-peer chunks and joining them back.

use thiserror::Error;

/// The requested chunk sizes do not cover the buffer exactly.
///
/// This means the plan and the actual unit count have diverged, which would
/// misroute results if ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("chunk sizes sum to {expected} but the buffer holds {actual} units")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Split `flat` into contiguous chunks of the given sizes, in order.
pub fn partition<T>(flat: Vec<T>, sizes: &[usize]) -> Result<Vec<Vec<T>>, PartitionError> {
    let expected: usize = sizes.iter().sum();
    if expected != flat.len() {
        return Err(PartitionError::SizeMismatch {
            expected,
            actual: flat.len(),
        });
    }

    let mut items = flat.into_iter();
    Ok(sizes
        .iter()
        .map(|&size| items.by_ref().take(size).collect())
        .collect())
}

/// Concatenate chunks back into one list, preserving chunk order.
pub fn merge<T>(chunks: Vec<Vec<T>>) -> Vec<T> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut flat = Vec::with_capacity(total);
    for chunk in chunks {
        flat.extend(chunk);
    }
    flat
}
