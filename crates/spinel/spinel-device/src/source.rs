//! Hardware collaborator boundary.
//!
//! The driver does not know registers or bus encodings; it only asks a
//! source how many samples the current event carries and burst-reads them
//! one by one. Register addressing and transfer framing live behind this
//! trait, in whatever implements it.

use spinel_samples::Sample;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("bus transfer failed")]
    Bus(#[from] std::io::Error),

    #[error("device reported invalid state: {0}")]
    Protocol(&'static str),
}

/// One burst-capable sample source (in the reference hardware, a sensor
/// FIFO drained over I²C on each watermark interrupt).
pub trait SampleSource {
    /// Number of samples waiting in the device FIFO for this event.
    fn fifo_depth(&mut self) -> Result<usize, SourceError>;

    /// Reads the oldest waiting sample out of the device FIFO.
    fn next_sample(&mut self) -> Result<Sample, SourceError>;
}
