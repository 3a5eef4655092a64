pub mod stepped;
pub mod timer;

pub use stepped::SteppedTimer;
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
