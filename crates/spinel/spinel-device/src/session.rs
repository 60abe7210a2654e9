//! Reader sessions.
//!
//! A session binds one claimed reader slot to blocking reads and carries
//! the per-session axis selection. Opening claims a slot, dropping releases
//! it; the claim is the only credential the session ever needs.

use std::sync::Arc;

use spinel_fanout::{Exhausted, FanoutReader, FanoutRing};
use spinel_samples::{Axis, Sample};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no consumer capacity left")]
    NoCapacity(#[from] Exhausted),

    /// The ring reported data and then failed to deliver it. This never
    /// happens through this API on its own; it means the one-popper-per-
    /// slot contract was broken somewhere upstream, so it is surfaced
    /// instead of retried.
    #[error("ring reported data then delivered none")]
    Inconsistent,
}

pub struct Session {
    reader: FanoutReader<Sample>,
    axis: Axis,
}

impl Session {
    /// Opens a session, claiming one of the fixed reader slots.
    pub fn open(ring: &Arc<FanoutRing<Sample>>) -> Result<Self, SessionError> {
        let reader = ring.attach()?;
        debug!(slot = %reader.id(), "session opened");
        Ok(Self {
            reader,
            axis: Axis::default(),
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.axis = axis;
    }

    /// Blocks until a sample is available, then delivers the 2-byte word
    /// for the currently selected axis.
    pub fn read(&mut self) -> Result<[u8; 2], SessionError> {
        Ok(self.read_sample()?.word(self.axis))
    }

    /// Blocks until a sample is available and pops it whole.
    pub fn read_sample(&mut self) -> Result<Sample, SessionError> {
        self.reader.wait_nonempty();
        // Non-empty was just observed for our own slot, so an empty pop
        // here is a precondition violation, not a transient state.
        self.reader.try_pop().ok_or(SessionError::Inconsistent)
    }

    /// Non-blocking variant: the next unread sample, if any.
    pub fn try_read_sample(&mut self) -> Option<Sample> {
        self.reader.try_pop()
    }

    /// Samples dropped for this session because it fell a full ring
    /// revolution behind the producer.
    pub fn overruns(&self) -> u64 {
        self.reader.overruns()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(slot = %self.reader.id(), "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinel_fanout::{MAX_CONSUMERS, RingConfig};
    use std::thread;
    use std::time::Duration;

    fn sample(raw: [u8; 6]) -> Sample {
        Sample { raw }
    }

    #[test]
    fn open_fails_when_all_slots_are_taken() {
        let ring = FanoutRing::<Sample>::new(RingConfig::new(8));
        let sessions: Vec<_> = (0..MAX_CONSUMERS)
            .map(|_| Session::open(&ring).unwrap())
            .collect();

        assert!(matches!(
            Session::open(&ring),
            Err(SessionError::NoCapacity(_))
        ));

        drop(sessions);
        assert!(Session::open(&ring).is_ok());
    }

    #[test]
    fn read_projects_the_selected_axis() {
        let ring = FanoutRing::<Sample>::new(RingConfig::new(8));
        let mut writer = ring.writer();
        let mut session = Session::open(&ring).unwrap();

        writer.push(sample([1, 2, 3, 4, 5, 6]));
        writer.push(sample([1, 2, 3, 4, 5, 6]));
        writer.push(sample([1, 2, 3, 4, 5, 6]));
        writer.wake_readers();

        assert_eq!(session.axis(), Axis::X);
        assert_eq!(session.read().unwrap(), [1, 2]);
        session.set_axis(Axis::Z);
        assert_eq!(session.read().unwrap(), [5, 6]);
        session.set_axis(Axis::Y);
        assert_eq!(session.read().unwrap(), [3, 4]);
    }

    #[test]
    fn blocked_read_completes_after_a_push_and_wake() {
        let ring = FanoutRing::<Sample>::new(RingConfig::new(8));
        let mut writer = ring.writer();
        let mut session = Session::open(&ring).unwrap();

        let handle = thread::spawn(move || session.read_sample());

        // Give the session time to park before publishing.
        thread::sleep(Duration::from_millis(50));
        writer.push(sample([9, 9, 9, 9, 9, 9]));
        writer.wake_readers();

        let got = handle.join().unwrap().unwrap();
        assert_eq!(got, sample([9, 9, 9, 9, 9, 9]));
    }
}
