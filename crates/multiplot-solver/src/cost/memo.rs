// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::cost::{
    CostEstimator,
    err::{CostEstimateError, EstimateCountMismatchError},
};
use fxhash::FxHashMap;
use parking_lot::RwLock;

/// Caches per-query estimates of an inner estimator.
///
/// The cache is shared between concurrent planning calls. Only queries that
/// are not cached yet are forwarded, in one batch.
#[derive(Debug, Default)]
pub struct MemoizedEstimator<E> {
    inner: E,
    cache: RwLock<FxHashMap<String, f64>>,
}

impl<E: CostEstimator> MemoizedEstimator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<E: CostEstimator> CostEstimator for MemoizedEstimator<E> {
    fn estimate(&self, queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
        let mut out: Vec<Option<f64>> = {
            let cache = self.cache.read();
            queries.iter().map(|q| cache.get(q).copied()).collect()
        };

        let mut misses: Vec<String> = Vec::new();
        for (q, hit) in queries.iter().zip(&out) {
            if hit.is_none() && !misses.contains(q) {
                misses.push(q.clone());
            }
        }

        if !misses.is_empty() {
            let fresh = self.inner.estimate(&misses)?;
            if fresh.len() != misses.len() {
                return Err(EstimateCountMismatchError::new(misses.len(), fresh.len()).into());
            }
            let mut cache = self.cache.write();
            for (q, cost) in misses.into_iter().zip(fresh) {
                cache.insert(q, cost);
            }
            for (slot, q) in out.iter_mut().zip(queries) {
                if slot.is_none() {
                    *slot = cache.get(q).copied();
                }
            }
        }

        Ok(out.into_iter().map(|c| c.unwrap_or(0.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl CostEstimator for Recording {
        fn estimate(&self, queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            self.batches.lock().push(queries.to_vec());
            Ok(queries.iter().map(|q| q.len() as f64).collect())
        }
    }

    fn qs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_only_misses_are_forwarded() {
        let memo = MemoizedEstimator::new(Recording::default());

        let first = memo.estimate(&qs(&["a", "bb", "a"])).unwrap();
        assert_eq!(first, vec![1.0, 2.0, 1.0]);
        assert_eq!(memo.len(), 2);

        let second = memo.estimate(&qs(&["bb", "ccc"])).unwrap();
        assert_eq!(second, vec![2.0, 3.0]);

        let batches = memo.inner().batches.lock().clone();
        assert_eq!(batches, vec![qs(&["a", "bb"]), qs(&["ccc"])]);
    }

    #[test]
    fn test_fully_cached_batch_skips_inner() {
        let memo = MemoizedEstimator::new(Recording::default());
        memo.estimate(&qs(&["x"])).unwrap();
        memo.estimate(&qs(&["x", "x"])).unwrap();
        assert_eq!(memo.inner().batches.lock().len(), 1);

        memo.clear();
        assert!(memo.is_empty());
        memo.estimate(&qs(&["x"])).unwrap();
        assert_eq!(memo.inner().batches.lock().len(), 2);
    }

    #[test]
    fn test_shared_between_threads() {
        let memo = MemoizedEstimator::new(Recording::default());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let costs = memo.estimate(&qs(&["p", "qq"])).unwrap();
                    assert_eq!(costs, vec![1.0, 2.0]);
                });
            }
        });
        assert_eq!(memo.len(), 2);
    }
}
