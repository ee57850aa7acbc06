//! Backend registry and selection
//!
//! Backends register under a role. Any number of broadcast and recording
//! backends may be active at once, but only one input backend: it alone
//! reads keys and controls timing, and every key it produces is copied to
//! the active broadcast and recording backends.

use std::path::Path;

use libloading::{Library, Symbol};
use strum::{Display, EnumString};

use crate::config::{DEFAULT_INTERFACE, UncursedConfig};
use crate::error::{UncursedError, UncursedResult};
use crate::hooks::UncursedHooks;
use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Input,
    Broadcast,
    Recording,
}

/// Bumped whenever [`UncursedHooks`] or [`PluginTable`] changes shape.
pub const PLUGIN_API_VERSION: u32 = 1;

/// What a plugin library hands back from its `uncursed_plugin` symbol.
///
/// A plugin exports:
///
/// ```ignore
/// #[unsafe(no_mangle)]
/// pub extern "C" fn uncursed_plugin_api_version() -> u32 { PLUGIN_API_VERSION }
/// #[unsafe(no_mangle)]
/// pub fn uncursed_plugin() -> PluginTable { ... }
/// ```
///
/// The table crosses the boundary with the Rust ABI, so plugins must be
/// built with the same compiler as the host.
pub struct PluginTable {
    pub name: String,
    pub role: Role,
    pub priority: i32,
    pub hooks: Box<dyn UncursedHooks>,
}

type ApiVersionFn = unsafe extern "C" fn() -> u32;
type PluginEntryFn = unsafe fn() -> PluginTable;

struct HookEntry {
    name: String,
    role: Role,
    priority: i32,
    used: bool,
    hooks: Box<dyn UncursedHooks>,
}

/// Public view of a registered backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInfo {
    pub name: String,
    pub role: Role,
    pub priority: i32,
    pub used: bool,
}

#[derive(Default)]
pub struct HookRegistry {
    entries: Vec<HookEntry>,
    // Declared after `entries` so plugin code outlives the tables it made.
    libraries: Vec<Library>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("entries", &self.infos())
            .field("libraries", &self.libraries.len())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, keeping the existing backend, on a duplicate name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        role: Role,
        priority: i32,
        hooks: Box<dyn UncursedHooks>,
    ) -> bool {
        let name = name.into();
        if self.find(&name).is_some() {
            tracing::warn!(%name, "backend already registered");
            return false;
        }
        tracing::debug!(%name, %role, priority, "registered backend");
        self.entries.push(HookEntry {
            name,
            role,
            priority,
            used: false,
            hooks,
        });
        true
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn infos(&self) -> Vec<HookInfo> {
        self.entries
            .iter()
            .map(|e| HookInfo {
                name: e.name.clone(),
                role: e.role,
                priority: e.priority,
                used: e.used,
            })
            .collect()
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.find(name).map(|i| self.entries[i].role)
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.find(name).is_some_and(|i| self.entries[i].used)
    }

    pub fn active_input(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.used && e.role == Role::Input)
            .map(|e| e.name.as_str())
    }

    /// Mark a backend active. At most one input backend may be active.
    pub fn activate(&mut self, name: &str) -> UncursedResult<()> {
        let i = self
            .find(name)
            .ok_or_else(|| UncursedError::UnknownInterface(name.to_string()))?;
        if self.entries[i].used {
            return Ok(());
        }
        if self.entries[i].role == Role::Input {
            if let Some(active) = self.active_input() {
                return Err(UncursedError::InputAlreadyActive {
                    requested: name.to_string(),
                    active: active.to_string(),
                });
            }
        }
        self.entries[i].used = true;
        tracing::info!(interface = name, role = %self.entries[i].role, "backend active");
        Ok(())
    }

    pub fn deactivate(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some(i) if self.entries[i].used => {
                self.entries[i].used = false;
                true
            }
            _ => false,
        }
    }

    fn is_input(&self, name: &str) -> bool {
        self.role_of(name) == Some(Role::Input)
    }

    /// Highest-priority input backend with priority at least `floor`; the
    /// earliest registered wins a tie
    fn best_input(&self, floor: i32) -> Option<&HookEntry> {
        self.entries
            .iter()
            .filter(|e| e.role == Role::Input && e.priority >= floor)
            .fold(None::<&HookEntry>, |best, e| match best {
                Some(b) if b.priority >= e.priority => Some(b),
                _ => Some(e),
            })
    }

    /// Pick the input backend.
    ///
    /// In order: the `--interface` override, the invocation-name suffix, the
    /// highest-priority input backend with priority above zero, then
    /// [`DEFAULT_INTERFACE`], then any other input backend. An override that
    /// names no input backend is skipped with a warning. Fails only when no
    /// input backend is registered at all.
    pub fn select_input(&self, config: &UncursedConfig) -> UncursedResult<String> {
        if let Some(name) = config.interface.as_deref() {
            if self.is_input(name) {
                return Ok(name.to_string());
            }
            tracing::warn!(interface = name, "no such input interface, falling back");
        }

        if let Some(suffix) = config.invocation_suffix() {
            if self.is_input(suffix) {
                return Ok(suffix.to_string());
            }
        }

        if let Some(e) = self.best_input(1) {
            return Ok(e.name.clone());
        }
        if self.is_input(DEFAULT_INTERFACE) {
            return Ok(DEFAULT_INTERFACE.to_string());
        }
        if let Some(e) = self.best_input(i32::MIN) {
            tracing::debug!(interface = %e.name, "falling back to an unprioritized input");
            return Ok(e.name.clone());
        }
        tracing::error!("no usable interface backend");
        Err(UncursedError::NoBackend)
    }

    /// Every active backend, in registration order.
    pub fn used_tables(&mut self) -> Vec<&mut dyn UncursedHooks> {
        self.entries
            .iter_mut()
            .filter(|e| e.used)
            .map(|e| -> &mut dyn UncursedHooks { e.hooks.as_mut() })
            .collect()
    }

    pub fn for_each_used(&mut self, mut f: impl FnMut(&str, &mut dyn UncursedHooks)) {
        for e in self.entries.iter_mut().filter(|e| e.used) {
            f(&e.name, e.hooks.as_mut());
        }
    }

    pub fn input_table(&mut self) -> Option<&mut dyn UncursedHooks> {
        self.entries
            .iter_mut()
            .find(|e| e.used && e.role == Role::Input)
            .map(|e| -> &mut dyn UncursedHooks { e.hooks.as_mut() })
    }

    /// An active backend by name.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut dyn UncursedHooks> {
        self.entries
            .iter_mut()
            .find(|e| e.used && e.name == name)
            .map(|e| -> &mut dyn UncursedHooks { e.hooks.as_mut() })
    }

    /// Hand a key to every active broadcast and recording backend once.
    pub fn broadcast_key(&mut self, key: Key) {
        for e in self.entries.iter_mut() {
            if e.used && e.role != Role::Input {
                e.hooks.record_key(key);
            }
        }
    }

    pub fn recording_tables(&mut self) -> Vec<(&str, &mut dyn UncursedHooks)> {
        self.entries
            .iter_mut()
            .filter(|e| e.used && e.role == Role::Recording)
            .map(|e| -> (&str, &mut dyn UncursedHooks) { (e.name.as_str(), e.hooks.as_mut()) })
            .collect()
    }

    /// Load a backend from a shared library and register it.
    ///
    /// Returns the registered name.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initializers, and the library's exported
    /// symbols must have the types documented on [`PluginTable`].
    pub unsafe fn load_plugin(&mut self, path: &Path) -> UncursedResult<String> {
        let shown = path.display().to_string();
        let fail = |reason: String| {
            tracing::warn!(path = %shown, %reason, "plugin rejected");
            UncursedError::Plugin {
                path: shown.clone(),
                reason,
            }
        };

        // SAFETY: the caller vouches for the library.
        let library = unsafe { Library::new(path) }.map_err(|e| fail(e.to_string()))?;

        let table = {
            // SAFETY: symbol types are part of the plugin contract.
            let version: Symbol<ApiVersionFn> = unsafe {
                library.get(b"uncursed_plugin_api_version")
            }
            .map_err(|e| fail(e.to_string()))?;
            let found = unsafe { version() };
            if found != PLUGIN_API_VERSION {
                return Err(fail(format!(
                    "API version {found}, expected {PLUGIN_API_VERSION}"
                )));
            }
            let entry: Symbol<PluginEntryFn> =
                unsafe { library.get(b"uncursed_plugin") }.map_err(|e| fail(e.to_string()))?;
            unsafe { entry() }
        };

        let name = table.name.clone();
        if !self.register(table.name, table.role, table.priority, table.hooks) {
            return Err(fail(format!("backend {name} already registered")));
        }
        tracing::info!(path = %shown, interface = %name, "loaded plugin");
        self.libraries.push(library);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn headless() -> Box<dyn UncursedHooks> {
        Box::new(HeadlessBackend::new(1, 1).0)
    }

    fn registry() -> HookRegistry {
        let mut r = HookRegistry::new();
        r.register("tty", Role::Input, 10, headless());
        r.register("sdl", Role::Input, 20, headless());
        r.register("headless", Role::Input, 0, headless());
        r.register("rec", Role::Recording, 0, headless());
        r
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut r = registry();
        assert!(!r.register("tty", Role::Broadcast, 1, headless()));
        assert_eq!(r.role_of("tty"), Some(Role::Input));
    }

    #[test]
    fn test_second_input_rejected() {
        let mut r = registry();
        r.activate("tty").unwrap();
        let err = r.activate("sdl").unwrap_err();
        assert!(matches!(
            err,
            UncursedError::InputAlreadyActive { ref requested, ref active }
                if requested == "sdl" && active == "tty"
        ));
        assert!(!r.is_used("sdl"));

        r.activate("rec").unwrap();
        r.activate("tty").unwrap();
        assert!(r.deactivate("tty"));
        r.activate("sdl").unwrap();
        assert_eq!(r.active_input(), Some("sdl"));
    }

    #[test]
    fn test_unknown_interface() {
        let mut r = registry();
        assert!(matches!(
            r.activate("curses"),
            Err(UncursedError::UnknownInterface(_))
        ));
    }

    #[test]
    fn test_selection_order() {
        let r = registry();

        let config = UncursedConfig::default().with_interface("headless");
        assert_eq!(r.select_input(&config).unwrap(), "headless");

        let config = UncursedConfig {
            invocation: Some("nethack-tty".into()),
            ..UncursedConfig::default()
        };
        assert_eq!(r.select_input(&config).unwrap(), "tty");

        let config = UncursedConfig::default().with_interface("curses");
        assert_eq!(r.select_input(&config).unwrap(), "sdl");

        // A recording backend is never an input choice.
        let config = UncursedConfig::default().with_interface("rec");
        assert_eq!(r.select_input(&config).unwrap(), "sdl");
    }

    #[test]
    fn test_priority_tie_prefers_first_registered() {
        let mut r = HookRegistry::new();
        r.register("a", Role::Input, 5, headless());
        r.register("b", Role::Input, 5, headless());
        assert_eq!(r.select_input(&UncursedConfig::default()).unwrap(), "a");
    }

    #[test]
    fn test_default_then_no_backend() {
        let mut r = HookRegistry::new();
        r.register("tty", Role::Input, 0, headless());
        assert_eq!(r.select_input(&UncursedConfig::default()).unwrap(), "tty");

        let mut r = HookRegistry::new();
        r.register("rec", Role::Recording, 5, headless());
        assert!(matches!(
            r.select_input(&UncursedConfig::default()),
            Err(UncursedError::NoBackend)
        ));
    }

    #[test]
    fn test_unprioritized_input_still_selected() {
        let mut r = HookRegistry::new();
        r.register("headless", Role::Input, 0, headless());
        r.register("rec", Role::Recording, 5, headless());
        assert_eq!(r.select_input(&UncursedConfig::default()).unwrap(), "headless");

        // The platform default still beats other unprioritized inputs
        r.register("tty", Role::Input, 0, headless());
        assert_eq!(r.select_input(&UncursedConfig::default()).unwrap(), "tty");
    }

    #[test]
    fn test_missing_plugin_is_an_error() {
        let mut r = HookRegistry::new();
        let err = unsafe { r.load_plugin(Path::new("/nonexistent/libuncursed_none.so")) }
            .unwrap_err();
        assert!(matches!(err, UncursedError::Plugin { .. }));
    }
}
