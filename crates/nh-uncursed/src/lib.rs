//! nh-uncursed: cell-grid terminal renderer
//!
//! A double-buffered screen of cells, diffed on commit and pushed to any
//! number of backends. One backend owns input; the rest mirror output and
//! receive a copy of every key.

pub mod backend;
pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod hooks;
pub mod input;
pub mod key;
pub mod registry;
pub mod screen;
pub mod session;
pub mod tiles;
pub mod window;

pub use cell::{Attr, Cell, Glyph};
pub use color::{Color, ColorPair, Rgb};
pub use config::{DEFAULT_INTERFACE, TileOptions, UncursedConfig};
pub use error::{UncursedError, UncursedResult};
pub use hooks::UncursedHooks;
pub use input::SignalWaker;
pub use key::{Key, Modifiers, MouseButton, RawInput, SpecialKey};
pub use registry::{HookRegistry, PLUGIN_API_VERSION, PluginTable, Role};
pub use screen::{STDSCR, Screen, UpdateContext, Visible};
pub use session::Uncursed;
pub use tiles::{Rect, RegionId, TileHandle};
pub use window::{Window, WindowId};
