//! World state
//!
//! Game flags, scheduled timers and light sources.

mod flags;
mod light;
pub mod timeout;

pub use flags::Flags;
pub use light::{LightFlags, LightOwner, LightSource};
pub use timeout::{
    Timer, TimerArg, TimerFunc, TimerHandler, TimerId, TimerKind, TimerQueue, UnsortedTimers,
};
