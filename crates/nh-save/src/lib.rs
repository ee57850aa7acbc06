//! nh-save: Binary save/restore and bones engine for the NetHack clone
//!
//! A save file is a flat little-endian stream of tagged sections, written
//! by [`dosave`] and read back by [`dorecover`]. Cross-references between
//! records are stored as raw ids and relinked once their targets exist.
//! Bones files reuse the level format and are loaded as ghost levels with
//! fresh ids ([`savebones`], [`getbones`]).

use std::fs;
use std::path::{Path, PathBuf};

use nh_core::dungeon::DLevel;
use nh_core::GameState;

mod bones;
mod context;
mod error;
mod game;
mod idmap;
mod io;
mod level;
mod light;
mod magic;
mod monster;
mod object;
mod relink;
mod timer;
mod trie;
mod version;

pub use bones::{getbones, savebones};
pub use context::{Range, RestoreContext, SaveContext};
pub use error::{SaveError, SaveResult};
pub use game::{dorecover, dosave, Recovery};
pub use idmap::{IdMap, IDMAP_BUCKET_SIZE};
pub use io::{SaveReader, SaveWriter};
pub use level::{getlev, link_bills, savelev};
pub use light::{relink_light_sources, restore_light_sources, save_light_sources};
pub use magic::Magic;
pub use monster::{restore_mon_chain, restore_monster, save_mon_chain, save_monster};
pub use object::{restore_obj_chain, save_obj_chain, save_object, ChainHome};
pub use relink::Scan;
pub use timer::{relink_timers, restore_timers, save_timers};
pub use trie::IdTrie;
pub use version::VersionInfo;

/// Extension of save files
pub const SAVE_EXTENSION: &str = "nhsav";

fn data_dir(sub: &str) -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("nethack-rs");
    path.push(sub);
    path
}

/// Save game state to a file
pub fn save_game(state: &GameState, path: impl AsRef<Path>) -> SaveResult<()> {
    let bytes = dosave(state)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Load game state from a file
pub fn load_game(path: impl AsRef<Path>) -> SaveResult<Recovery> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SaveError::NotFound,
        _ => SaveError::Io(e),
    })?;
    dorecover(&bytes)
}

/// Check if a save file exists
pub fn save_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Delete a save file
pub fn delete_save(path: impl AsRef<Path>) -> SaveResult<()> {
    fs::remove_file(path)?;
    Ok(())
}

/// Get the default save path for a player name
pub fn default_save_path(player_name: &str) -> PathBuf {
    let mut path = data_dir("saves");
    if let Err(e) = fs::create_dir_all(&path) {
        tracing::warn!(dir = %path.display(), error = %e, "cannot create save directory");
    }
    path.push(format!("{player_name}.{SAVE_EXTENSION}"));
    path
}

/// Get the bones file path for a level
pub fn bones_path(dlevel: DLevel) -> PathBuf {
    let mut path = data_dir("bones");
    if let Err(e) = fs::create_dir_all(&path) {
        tracing::warn!(dir = %path.display(), error = %e, "cannot create bones directory");
    }
    path.push(dlevel.bones_file_name());
    path
}

/// List all save files in the default save directory, newest first
pub fn list_saves() -> SaveResult<Vec<PathBuf>> {
    let dir = data_dir("saves");
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut saves = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|e| e == SAVE_EXTENSION) {
            let modified = entry.metadata()?.modified()?;
            saves.push((modified, path));
        }
    }
    saves.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(saves.into_iter().map(|(_, p)| p).collect())
}

/// Load and consume the bones file for `target`, if one exists
pub fn load_bones(game: &mut GameState, target: DLevel) -> SaveResult<bool> {
    let path = bones_path(target);
    if !path.exists() {
        return Ok(false);
    }
    let bytes = fs::read(&path)?;
    // Bones are single use, whether or not they load
    delete_save(&path)?;
    getbones(game, &bytes, target)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("nethack_test_save.nhsav");

        let state = GameState::new(5);
        save_game(&state, &path).unwrap();
        assert!(save_exists(&path));

        let Recovery::Restored(loaded) = load_game(&path).unwrap() else {
            panic!("fresh save reported incompatible");
        };
        assert_eq!(loaded.moves, state.moves);

        delete_save(&path).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_game("/nonexistent/path/save.nhsav");
        assert!(matches!(result, Err(SaveError::NotFound)));
    }
}
