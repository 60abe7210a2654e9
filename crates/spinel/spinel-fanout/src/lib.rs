mod ring;
mod slots;
mod spmc;
mod waitq;

pub use ring::RingConfig;
pub use slots::{Exhausted, MAX_CONSUMERS, ReaderId};
pub use spmc::{FanoutReader, FanoutRing, FanoutWriter};
