//! Object pooling
//!
//! Per-frame containers (draw lists, meshes) are expensive to reallocate.
//! An [`ObjectPool`] keeps released values around with their capacity intact
//! and hands them back on the next acquire. Pools are plain values owned by
//! whoever creates and destroys the pooled objects.

/// Values that can be reset for reuse without dropping their allocations
pub trait Recycle {
    /// Clear contents, keep capacity
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

/// Pool statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquires served from the pool
    pub hits: u64,
    /// Acquires that had to allocate
    pub misses: u64,
    /// Releases dropped because the pool was full
    pub dropped: u64,
}

/// Bounded free-list of recyclable values
#[derive(Debug)]
pub struct ObjectPool<T> {
    free: Vec<T>,
    capacity: usize,
    stats: PoolStats,
}

impl<T: Recycle + Default> ObjectPool<T> {
    /// Create a pool that retains at most `capacity` released values
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity.min(64)),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Take a value from the pool, allocating a fresh one when empty
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(value) => {
                self.stats.hits += 1;
                tracing::trace!(remaining = self.free.len(), "pool hit");
                value
            }
            None => {
                self.stats.misses += 1;
                tracing::debug!(misses = self.stats.misses, "pool miss, allocating");
                T::default()
            }
        }
    }

    /// Return a value to the pool; it is recycled before being stored
    pub fn release(&mut self, mut value: T) {
        if self.free.len() >= self.capacity {
            self.stats.dropped += 1;
            return;
        }
        value.recycle();
        self.free.push(value);
    }

    /// Number of values waiting for reuse
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every pooled value
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_then_acquire_reuses_capacity() {
        let mut pool: ObjectPool<Vec<u32>> = ObjectPool::new(2);
        let mut v = pool.acquire();
        v.extend(0..100);
        let cap = v.capacity();
        pool.release(v);

        let v = pool.acquire();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), cap);
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.stats().misses, 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut pool: ObjectPool<Vec<u8>> = ObjectPool::new(1);
        pool.release(Vec::new());
        pool.release(Vec::new());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.stats().dropped, 1);
    }
}
