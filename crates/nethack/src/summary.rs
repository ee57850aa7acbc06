//! Plain-data views of a restored game, for `dump` and `verify`

use nh_core::dungeon::Level;
use nh_core::GameState;
use nh_save::{dorecover, dosave, Recovery};
use serde::Serialize;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub dlevel: String,
    pub monsters: usize,
    pub objects: usize,
    pub buried_objects: usize,
    pub traps: usize,
    pub rooms: usize,
    pub engravings: usize,
    pub timers: usize,
    pub lights: usize,
}

impl LevelSummary {
    fn of(level: &Level) -> Self {
        Self {
            dlevel: level.dlevel.to_string(),
            monsters: level.monsters.len(),
            objects: level.objects.len(),
            buried_objects: level.buried_objects.len(),
            traps: level.traps.len(),
            rooms: level.rooms.len(),
            engravings: level.engravings.len(),
            timers: level.timers.len(),
            lights: level.lights.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub player: String,
    pub role: String,
    pub race: String,
    pub moves: u64,
    pub current: String,
    pub bones_allowed: bool,
    pub hp: i32,
    pub hp_max: i32,
    pub inventory: usize,
    pub timers: usize,
    pub lights: usize,
    pub artifact_gifts: usize,
    pub migrating_objects: usize,
    pub migrating_monsters: usize,
    pub levels: Vec<LevelSummary>,
    pub messages: Vec<String>,
}

impl SaveSummary {
    pub fn of(game: &GameState) -> Self {
        Self {
            player: game.you.name.clone(),
            role: game.you.role.clone(),
            race: game.you.race.clone(),
            moves: game.moves,
            current: game.current.to_string(),
            bones_allowed: game.flags.allows_bones(),
            hp: game.you.hp,
            hp_max: game.you.hp_max,
            inventory: game.inventory.len(),
            timers: game.timers.len(),
            lights: game.lights.len(),
            artifact_gifts: game.artifacts.gifts_given(),
            migrating_objects: game.migrating_objects.len(),
            migrating_monsters: game.migrating_monsters.len(),
            levels: game.levels.values().map(LevelSummary::of).collect(),
            messages: game.messages.iter().cloned().collect(),
        }
    }
}

/// Restore a save image, failing on one from another version.
pub fn restore(bytes: &[u8]) -> CliResult<GameState> {
    match dorecover(bytes)? {
        Recovery::Restored(game) => Ok(*game),
        Recovery::Incompatible { found } => Err(CliError::Incompatible(found)),
    }
}

/// Outcome of restoring a save and writing it back out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Identical { len: usize },
    Differs {
        original_len: usize,
        resaved_len: usize,
        first_difference: usize,
    },
}

impl Verification {
    pub fn is_identical(&self) -> bool {
        matches!(self, Self::Identical { .. })
    }
}

pub fn verify(bytes: &[u8]) -> CliResult<Verification> {
    let game = restore(bytes)?;
    let resaved = dosave(&game)?;
    if resaved == bytes {
        return Ok(Verification::Identical { len: bytes.len() });
    }
    let first_difference = bytes
        .iter()
        .zip(&resaved)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| bytes.len().min(resaved.len()));
    Ok(Verification::Differs {
        original_len: bytes.len(),
        resaved_len: resaved.len(),
        first_difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nh_core::dungeon::Cell;
    use nh_core::monster::Monster;

    fn game() -> GameState {
        let mut game = GameState::new(7);
        game.you.name = "Summary".into();
        game.add_message("Hello.");
        let current = game.current;
        let id = game.next_monster_id();
        let level = game.current_level_mut().unwrap();
        level.cells[10][5] = Cell::floor();
        level.place_monster(Monster::new(id, 3, 10, 5));
        let mut below = Level::new(current.below());
        below.cells[2][2] = Cell::floor();
        game.levels.insert(below.dlevel, below);
        game
    }

    #[test]
    fn test_summary_counts_every_level() {
        let summary = SaveSummary::of(&game());
        assert_eq!(summary.player, "Summary");
        assert_eq!(summary.levels.len(), 2);
        assert_eq!(summary.levels[0].monsters, 1);
        assert_eq!(summary.levels[1].monsters, 0);
        assert_eq!(summary.messages, vec!["Hello.".to_string()]);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let json = serde_json::to_value(SaveSummary::of(&game())).unwrap();
        assert_eq!(json["player"], "Summary");
        assert_eq!(json["bones_allowed"], false);
        assert_eq!(json["levels"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_verify_fresh_save_is_identical() {
        let bytes = dosave(&game()).unwrap();
        let outcome = verify(&bytes).unwrap();
        assert_eq!(outcome, Verification::Identical { len: bytes.len() });
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(restore(b"not a save").is_err());
    }
}
