//! Ring buffer configuration and index arithmetic.
//!
//! All cursors in the fan-out ring are plain slot indices taken modulo the
//! capacity (not free-running sequence numbers), so wrap-around is handled
//! at every step.

/// Configuration for a fan-out ring buffer.
#[derive(Debug, Copy, Clone)]
pub struct RingConfig {
    /// Number of slots in the ring. Must be a power of 2 and at least 4.
    pub capacity: usize,
}

impl RingConfig {
    /// Creates a new ring configuration with the specified capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is not a power of 2, or is below 4. The
    /// lapped-reader correction parks a skipped reader two slots past the
    /// producer cursor, so with fewer than 4 slots the parking position
    /// would collide with the slot being written.
    ///
    /// # Example
    /// ```
    /// use spinel_fanout::RingConfig;
    /// let cfg = RingConfig::new(32); // OK: 32 = 2^5
    /// // RingConfig::new(20);        // Would panic: not a power of 2
    /// ```
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "Capacity must be power of 2");
        assert!(capacity >= 4, "Capacity must be at least 4");
        Self { capacity }
    }
}

/// Advances a slot index by `by` positions, wrapping at `capacity`.
#[inline(always)]
pub fn advance(idx: usize, by: usize, capacity: usize) -> usize {
    (idx + by) % capacity
}
