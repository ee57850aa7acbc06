//! The hero's persistent record

use serde::{Deserialize, Serialize};

use super::{Alignment, KnownSpell};
use crate::dungeon::DLevel;
use crate::monster::MonsterId;
use crate::reference::Reference;

/// Map coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct You {
    pub name: String,
    pub role: String,
    pub race: String,

    pub pos: Position,
    pub level: DLevel,
    pub moved: bool,

    pub exp_level: i32,
    pub exp: u64,

    pub hp: i32,
    pub hp_max: i32,
    pub energy: i32,
    pub energy_max: i32,

    pub alignment: Alignment,
    pub luck: i8,
    pub nutrition: i32,
    pub gold: i32,

    /// Monster the hero is stuck to or engulfed by
    pub stuck: Option<Reference<MonsterId>>,
    pub steed: Option<Reference<MonsterId>>,

    pub known_spells: Vec<KnownSpell>,
}

impl Default for You {
    fn default() -> Self {
        Self {
            name: String::from("Agent"),
            role: String::from("Valkyrie"),
            race: String::from("human"),
            pos: Position::default(),
            level: DLevel::main_dungeon_start(),
            moved: false,
            exp_level: 1,
            exp: 0,
            hp: 16,
            hp_max: 16,
            energy: 1,
            energy_max: 1,
            alignment: Alignment::default(),
            luck: 0,
            nutrition: 900,
            gold: 0,
            stuck: None,
            steed: None,
            known_spells: Vec::new(),
        }
    }
}

impl You {
    /// "Name the race role", as the status line shows it
    pub fn title(&self) -> String {
        format!("{} the {} {}", self.name, self.race, self.role)
    }

    /// Both monster links, in save order. They must resolve on the hero's
    /// own level.
    pub fn monster_links_mut(&mut self) -> [&mut Option<Reference<MonsterId>>; 2] {
        [&mut self.stuck, &mut self.steed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        let you = You {
            name: "Ada".into(),
            ..You::default()
        };
        assert_eq!(you.title(), "Ada the human Valkyrie");
    }

    #[test]
    fn test_monster_links_cover_stuck_and_steed() {
        let mut you = You::default();
        for (i, link) in you.monster_links_mut().into_iter().enumerate() {
            *link = Some(Reference::Unresolved(i as u32 + 1));
        }
        assert_eq!(you.stuck, Some(Reference::Unresolved(1)));
        assert_eq!(you.steed, Some(Reference::Unresolved(2)));
    }
}
