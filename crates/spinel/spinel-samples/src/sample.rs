#![forbid(unsafe_code)]

/// Width in bytes of one raw sample: three axes, two bytes each,
/// in the register order the sensor burst-reads them.
pub const SAMPLE_LEN: usize = 6;

// One FIFO burst element as it comes off the sensor.
// POD -> Plain old data, fixed-size, no identity beyond its buffer slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    pub raw: [u8; SAMPLE_LEN],
}

/// Which 2-byte projection of a sample a session reads.
///
/// The byte pairs follow the sensor's data-register layout:
/// X at 0..2, Y at 2..4, Z at 4..6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Sample {
    /// Extracts the low/high byte pair for one axis.
    #[inline]
    pub fn word(&self, axis: Axis) -> [u8; 2] {
        let lo = match axis {
            Axis::X => 0,
            Axis::Y => 2,
            Axis::Z => 4,
        };
        [self.raw[lo], self.raw[lo + 1]]
    }
}
