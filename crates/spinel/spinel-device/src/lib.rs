mod driver;
mod session;
mod source;

pub use driver::{CaptureDriver, FIFO_DEPTH_MAX};
pub use session::{Session, SessionError};
pub use source::{SampleSource, SourceError};
