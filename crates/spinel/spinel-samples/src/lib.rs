pub mod sample;
pub use sample::{Axis, SAMPLE_LEN, Sample};
