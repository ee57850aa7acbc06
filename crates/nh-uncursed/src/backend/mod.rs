//! Built-in backends

pub mod headless;
pub mod record;
pub mod tty;

pub use headless::{HeadlessBackend, HeadlessProbe};
pub use record::RecordBackend;
pub use tty::TtyBackend;
