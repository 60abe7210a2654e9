//! Demo capture pipeline: a simulated sensor drained by the capture driver
//! on one thread, fanned out to a few concurrent reader sessions.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use spinel_config::CaptureConfig;
use spinel_device::{CaptureDriver, SampleSource, Session, SourceError};
use spinel_fanout::{FanoutRing, RingConfig};
use spinel_samples::{Axis, Sample};
use tracing::{info, warn};

/// Simulated sensor: a slow sine sweep on X/Y and a constant 1 g on Z,
/// packed low-byte-first the way the hardware lays out its data registers.
struct SimSensor {
    phase: u64,
    watermark: usize,
}

impl SampleSource for SimSensor {
    fn fifo_depth(&mut self) -> Result<usize, SourceError> {
        Ok(self.watermark)
    }

    fn next_sample(&mut self) -> Result<Sample, SourceError> {
        let t = self.phase as f64 / 100.0;
        self.phase += 1;
        let x = (512.0 * (t).sin()) as i16;
        let y = (512.0 * (t * 0.5).cos()) as i16;
        let z = 256i16;

        let mut raw = [0u8; 6];
        raw[0..2].copy_from_slice(&x.to_le_bytes());
        raw[2..4].copy_from_slice(&y.to_le_bytes());
        raw[4..6].copy_from_slice(&z.to_le_bytes());
        Ok(Sample { raw })
    }
}

fn run_session(mut session: Session, axis: Axis) {
    session.set_axis(axis);
    let mut count: u64 = 0;
    let mut last = Instant::now();

    loop {
        match session.read() {
            Ok(word) => {
                count += 1;
                if last.elapsed() >= Duration::from_secs(1) {
                    let value = i16::from_le_bytes(word);
                    info!(
                        ?axis,
                        value,
                        rate = count,
                        overruns = session.overruns(),
                        "session progress"
                    );
                    count = 0;
                    last = Instant::now();
                }
            }
            Err(e) => {
                warn!("session read failed: {e}");
                return;
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = match CaptureConfig::load("spinel.toml") {
        Ok(c) => c,
        Err(_) => CaptureConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        capacity = config.ring_capacity,
        rate_hz = config.sample_rate_hz,
        watermark = config.watermark,
        "starting capture"
    );

    let ring = FanoutRing::<Sample>::new(RingConfig::new(config.ring_capacity));
    let mut driver = CaptureDriver::new(ring.writer());

    for axis in [Axis::X, Axis::Z] {
        let session = Session::open(&ring).context("failed to open reader session")?;
        thread::spawn(move || run_session(session, axis));
    }

    let mut sensor = SimSensor {
        phase: 0,
        watermark: config.watermark,
    };

    // One capture event per watermark's worth of samples at the configured
    // output data rate, mirroring the hardware's watermark interrupt.
    let event_period =
        Duration::from_secs_f64(config.watermark as f64 / config.sample_rate_hz as f64);

    loop {
        thread::sleep(event_period);
        if let Err(e) = driver.on_event(&mut sensor) {
            warn!("capture event failed: {e}");
        }
    }
}
