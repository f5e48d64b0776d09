//! Workload distribution helpers: chunking for parallel dispatch and key-set
//! scaling for update rounds larger than the inserted population.

use crate::error::{BenchError, Result};

/// Split `items` into exactly `k` contiguous chunks whose sizes differ by at
/// most one element. The first `len % k` chunks carry the larger size, so
/// concatenating the chunks in order reproduces the input exactly.
///
/// `k` larger than the input length yields trailing empty chunks.
pub fn split_chunks<T>(items: &[T], k: usize) -> Result<Vec<&[T]>> {
    if k == 0 {
        return Err(BenchError::InvalidArgument(
            "chunk count must be positive".to_string(),
        ));
    }

    let base = items.len() / k;
    let remainder = items.len() % k;

    let mut chunks = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < remainder);
        chunks.push(&items[start..start + size]);
        start += size;
    }
    Ok(chunks)
}

/// Stretch or truncate `keys` to exactly `target` elements by cyclic
/// repetition: output index `i` is `keys[i % keys.len()]`. An empty input
/// stays empty regardless of `target`.
pub fn cycle_to_len<T: Clone>(keys: &[T], target: usize) -> Vec<T> {
    if keys.is_empty() {
        return Vec::new();
    }
    if keys.len() >= target {
        return keys[..target].to_vec();
    }
    (0..target).map(|i| keys[i % keys.len()].clone()).collect()
}
