//! Game state container
//!
//! Everything `dosave` writes and `dorecover` rebuilds, threaded through
//! the save/restore code as an explicit value.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::dungeon::{DLevel, DungeonSystem, Level};
use crate::monster::{Monster, MonsterId, MonsterVitals};
use crate::object::{ArtifactTable, FruitTable, Object, ObjectId, find_in_chain};
use crate::player::You;
use crate::rng::GameRng;
use crate::world::{Flags, LightSource, TimerQueue};
use crate::{FIRST_TURN, MSGHISTORY, NUMMONS};

/// Levels the hero has visited, ordered by dungeon then depth
pub type LevelMap = BTreeMap<DLevel, Level>;

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Turn counter (moves)
    pub moves: u64,

    /// Last identifier handed out to an object or monster
    pub ident: u32,

    pub flags: Flags,

    /// Level the hero is on
    pub current: DLevel,

    pub you: You,

    /// The hero's monster shadow (youmonst)
    pub youmonst: Monster,

    pub dungeons: DungeonSystem,

    #[serde(skip)]
    pub levels: LevelMap,

    /// Timers that travel with the hero
    pub timers: TimerQueue,

    /// Light sources that travel with the hero
    pub lights: Vec<LightSource>,

    pub inventory: Vec<Object>,

    /// Objects falling or otherwise in transit to another level
    pub migrating_objects: Vec<Object>,

    /// Monsters in transit to another level
    pub migrating_monsters: Vec<Monster>,

    /// Per-species birth/death counts
    pub mvitals: Vec<MonsterVitals>,

    pub artifacts: ArtifactTable,

    pub fruits: FruitTable,

    pub rng: GameRng,

    /// Recent messages, oldest first
    pub messages: VecDeque<String>,
}

impl GameState {
    /// Fresh game on the first level of the main dungeon
    pub fn new(seed: u64) -> Self {
        let current = DLevel::main_dungeon_start();
        let mut levels = LevelMap::new();
        levels.insert(current, Level::new(current));
        Self {
            moves: FIRST_TURN,
            ident: 0,
            flags: Flags::default(),
            current,
            you: You::default(),
            youmonst: Monster::default(),
            dungeons: DungeonSystem::standard(),
            levels,
            timers: TimerQueue::new(),
            lights: Vec::new(),
            inventory: Vec::new(),
            migrating_objects: Vec::new(),
            migrating_monsters: Vec::new(),
            mvitals: vec![MonsterVitals::default(); NUMMONS],
            artifacts: ArtifactTable::default(),
            fruits: FruitTable::new(),
            rng: GameRng::new(seed),
            messages: VecDeque::new(),
        }
    }

    /// Allocate a fresh identifier (next_ident)
    pub fn next_ident(&mut self) -> u32 {
        self.ident = self.ident.wrapping_add(1);
        if self.ident == 0 {
            self.ident = 1;
        }
        self.ident
    }

    pub fn next_object_id(&mut self) -> ObjectId {
        ObjectId(self.next_ident())
    }

    pub fn next_monster_id(&mut self) -> MonsterId {
        MonsterId(self.next_ident())
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.levels.get(&self.current)
    }

    pub fn current_level_mut(&mut self) -> Option<&mut Level> {
        self.levels.get_mut(&self.current)
    }

    /// Record a message, dropping the oldest past the history limit
    pub fn add_message(&mut self, msg: impl Into<String>) {
        self.messages.push_back(msg.into());
        while self.messages.len() > MSGHISTORY {
            self.messages.pop_front();
        }
    }

    /// Find an object in the hero's inventory or in transit
    pub fn find_carried_object(&self, id: ObjectId) -> Option<&Object> {
        find_in_chain(&self.inventory, id).or_else(|| find_in_chain(&self.migrating_objects, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_shared() {
        let mut game = GameState::new(7);
        assert_eq!(game.next_object_id(), ObjectId(1));
        assert_eq!(game.next_monster_id(), MonsterId(2));
        assert_eq!(game.ident, 2);
    }

    #[test]
    fn test_message_history_bounded() {
        let mut game = GameState::new(7);
        for i in 0..(MSGHISTORY + 5) {
            game.add_message(format!("msg {i}"));
        }
        assert_eq!(game.messages.len(), MSGHISTORY);
        assert_eq!(game.messages.front().map(String::as_str), Some("msg 5"));
    }

    #[test]
    fn test_starts_on_first_level() {
        let game = GameState::new(1);
        assert_eq!(game.current_level().map(|l| l.dlevel), Some(DLevel::new(0, 1)));
        assert_eq!(game.moves, FIRST_TURN);
    }
}
