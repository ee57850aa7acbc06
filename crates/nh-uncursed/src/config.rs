//! Renderer configuration
//!
//! Built from the command line: `--interface <name>` (or
//! `--interface=<name>`) picks the input backend, and the program's own name
//! is kept for the invocation-suffix rule (`nethack-tty` selects `tty`).

use std::path::{Path, PathBuf};

/// Name of the backend used when nothing else applies.
pub const DEFAULT_INTERFACE: &str = "tty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOptions {
    pub path: PathBuf,
    pub tile_width: u16,
    pub tile_height: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncursedConfig {
    /// Explicit `--interface` override.
    pub interface: Option<String>,
    /// argv[0], as invoked.
    pub invocation: Option<String>,
    /// Broadcast or recording backends to switch on besides the input one.
    pub extra_interfaces: Vec<String>,
    /// Shared libraries to load backends from.
    pub plugins: Vec<PathBuf>,
    pub tiles: Option<TileOptions>,
}

impl UncursedConfig {
    /// Split renderer options out of a full argument list.
    ///
    /// Returns the config and the arguments it did not consume, with argv[0]
    /// still first.
    pub fn from_args<I>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut rest = Vec::new();
        let mut args = args.into_iter();

        if let Some(argv0) = args.next() {
            config.invocation = Some(argv0.clone());
            rest.push(argv0);
        }
        while let Some(arg) = args.next() {
            if arg == "--interface" {
                match args.next() {
                    Some(name) => config.interface = Some(name),
                    None => tracing::warn!("--interface needs a value"),
                }
            } else if let Some(name) = arg.strip_prefix("--interface=") {
                config.interface = Some(name.to_string());
            } else {
                rest.push(arg);
            }
        }
        (config, rest)
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    /// The part of the program name after its last `-`, if any.
    pub fn invocation_suffix(&self) -> Option<&str> {
        let invoked = self.invocation.as_deref()?;
        let stem = Path::new(invoked).file_stem()?.to_str()?;
        let (_, suffix) = stem.rsplit_once('-')?;
        (!suffix.is_empty()).then_some(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interface_flag_consumed() {
        let (config, rest) =
            UncursedConfig::from_args(args(&["nethack", "--interface", "headless", "show", "x"]));
        assert_eq!(config.interface.as_deref(), Some("headless"));
        assert_eq!(rest, args(&["nethack", "show", "x"]));

        let (config, rest) = UncursedConfig::from_args(args(&["nethack", "--interface=tty"]));
        assert_eq!(config.interface.as_deref(), Some("tty"));
        assert_eq!(rest, args(&["nethack"]));
    }

    #[test]
    fn test_invocation_suffix() {
        let (config, _) = UncursedConfig::from_args(args(&["/usr/games/nethack-tty"]));
        assert_eq!(config.invocation_suffix(), Some("tty"));

        let (config, _) = UncursedConfig::from_args(args(&["nethack"]));
        assert_eq!(config.invocation_suffix(), None);

        let (config, _) = UncursedConfig::from_args(args(&["nethack-"]));
        assert_eq!(config.invocation_suffix(), None);
    }
}
