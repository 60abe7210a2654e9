//! Producer driver loop.
//!
//! `on_event` is the interrupt-handler analog: it runs on behalf of the
//! single producer, drains one FIFO burst into the ring without blocking or
//! allocating, and broadcasts one wake per event, not per sample.

use spinel_fanout::FanoutWriter;
use spinel_samples::Sample;
use tracing::{trace, warn};

use crate::source::{SampleSource, SourceError};

/// Upper bound on one burst. The source's status register encodes the FIFO
/// fill level in 6 bits, so anything larger is a misbehaving source.
pub const FIFO_DEPTH_MAX: usize = 63;

pub struct CaptureDriver {
    writer: FanoutWriter<Sample>,
}

impl CaptureDriver {
    pub fn new(writer: FanoutWriter<Sample>) -> Self {
        Self { writer }
    }

    /// Handles one capture event: drains the source FIFO into the ring,
    /// then wakes all blocked readers exactly once.
    ///
    /// Returns the number of samples pushed. A source failure mid-burst
    /// aborts the remainder, but readers are still woken for whatever made
    /// it into the ring first.
    pub fn on_event(&mut self, source: &mut dyn SampleSource) -> Result<usize, SourceError> {
        let depth = match source.fifo_depth() {
            Ok(d) => d.min(FIFO_DEPTH_MAX),
            Err(e) => {
                warn!("capture event dropped, status read failed: {e}");
                return Err(e);
            }
        };

        let mut pushed = 0usize;
        for _ in 0..depth {
            match source.next_sample() {
                Ok(sample) => {
                    self.writer.push(sample);
                    pushed += 1;
                }
                Err(e) => {
                    warn!(pushed, depth, "burst aborted mid-transfer: {e}");
                    self.writer.wake_readers();
                    return Err(e);
                }
            }
        }

        trace!(pushed, "burst committed");
        self.writer.wake_readers();
        Ok(pushed)
    }
}
