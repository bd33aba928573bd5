pub mod slot;
pub mod timer;

pub use slot::{TimerHandle, TimerSlot};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer, ms_to_ns};
