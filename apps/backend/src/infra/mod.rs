//! Infrastructure seams: time.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
