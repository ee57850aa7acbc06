//! Dungeon topology (dungeon.h)

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

use super::DLevel;

/// Dungeon flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonFlags {
    pub town: bool,
    pub hellish: bool,
    pub maze_like: bool,
    pub rogue_like: bool,
    pub alignment: i8, // -1 chaotic, 0 neutral, 1 lawful
}

/// Dungeon definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    /// Dungeon name (e.g., "The Dungeons of Doom")
    pub name: String,

    /// Prototype file name
    pub prototype: String,

    /// Character for bones files
    pub bones_char: char,

    /// Dungeon flags
    pub flags: DungeonFlags,

    /// Entry level
    pub entry_level: i8,

    /// Number of levels
    pub num_levels: i8,

    /// Deepest level reached by player
    pub deepest_reached: i8,

    /// Ledger start (for level numbering)
    pub ledger_start: i32,

    /// Depth start (for difficulty)
    pub depth_start: i32,
}

impl Dungeon {
    /// Create the main dungeon
    pub fn main_dungeon() -> Self {
        Self {
            name: "The Dungeons of Doom".to_string(),
            prototype: "dungeon".to_string(),
            bones_char: 'D',
            flags: DungeonFlags::default(),
            entry_level: 1,
            num_levels: 29,
            deepest_reached: 0,
            ledger_start: 0,
            depth_start: 1,
        }
    }

    /// Create the Gnomish Mines
    pub fn mines() -> Self {
        Self {
            name: "The Gnomish Mines".to_string(),
            prototype: "mines".to_string(),
            bones_char: 'M',
            flags: DungeonFlags::default(),
            entry_level: 1,
            num_levels: 8,
            deepest_reached: 0,
            ledger_start: 29,
            depth_start: 3,
        }
    }

    /// Check if a level is in this dungeon
    pub fn contains_level(&self, level: i8) -> bool {
        level >= 1 && level <= self.num_levels
    }
}

/// Branch connection types
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
pub enum BranchType {
    #[default]
    Stairs = 0,
    NoEnd1 = 1, // No connection at end 1
    NoEnd2 = 2, // No connection at end 2
    Portal = 3, // Magic portal
}

/// Branch between dungeons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch identifier
    pub id: i32,

    /// Branch type
    pub branch_type: BranchType,

    /// First endpoint
    pub end1: DLevel,

    /// Second endpoint
    pub end2: DLevel,

    /// Is end1 going up?
    pub end1_up: bool,
}

impl Branch {
    /// The endpoint on the other side of the branch from `here`
    pub fn other_end(&self, here: &DLevel) -> DLevel {
        if self.end1 == *here {
            self.end2
        } else {
            self.end1
        }
    }
}

/// A level built from a special-level description (sp_lev)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialLevel {
    /// Description file name
    pub proto: String,
    pub dlevel: DLevel,
    /// Number of random variants, 0 if fixed
    pub random_variants: u8,
    pub flags: DungeonFlags,
}

/// The whole dungeon graph: dungeons, branches, landmark levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonSystem {
    pub dungeons: Vec<Dungeon>,
    pub branches: Vec<Branch>,
    pub special_levels: Vec<SpecialLevel>,
    /// Medusa's island
    pub medusa_level: DLevel,
    /// The castle (stronghold)
    pub castle_level: DLevel,
}

impl Default for DungeonSystem {
    fn default() -> Self {
        Self::standard()
    }
}

impl DungeonSystem {
    /// Main dungeon plus the Mines, joined by stairs on level 3
    pub fn standard() -> Self {
        Self {
            dungeons: vec![Dungeon::main_dungeon(), Dungeon::mines()],
            branches: vec![Branch {
                id: 0,
                branch_type: BranchType::Stairs,
                end1: DLevel::new(0, 3),
                end2: DLevel::new(1, 1),
                end1_up: false,
            }],
            special_levels: vec![
                SpecialLevel {
                    proto: "medusa".to_string(),
                    dlevel: DLevel::new(0, 21),
                    random_variants: 2,
                    flags: DungeonFlags::default(),
                },
                SpecialLevel {
                    proto: "castle".to_string(),
                    dlevel: DLevel::new(0, 25),
                    random_variants: 0,
                    flags: DungeonFlags::default(),
                },
            ],
            medusa_level: DLevel::new(0, 21),
            castle_level: DLevel::new(0, 25),
        }
    }

    /// Global level number used for ordering levels (ledger_no)
    pub fn ledger_no(&self, level: &DLevel) -> Option<i32> {
        let dungeon = self.dungeons.get(level.dungeon_num as usize)?;
        if !dungeon.contains_level(level.level_num) {
            return None;
        }
        Some(dungeon.ledger_start + level.level_num as i32)
    }

    /// Branch with an endpoint on `level` (Is_branchlev)
    pub fn branch_at(&self, level: &DLevel) -> Option<&Branch> {
        self.branches
            .iter()
            .find(|b| b.end1 == *level || b.end2 == *level)
    }

    /// Is `level` strictly between Medusa and the castle in ledger order?
    pub fn between_medusa_and_castle(&self, level: &DLevel) -> bool {
        match (
            self.ledger_no(level),
            self.ledger_no(&self.medusa_level),
            self.ledger_no(&self.castle_level),
        ) {
            (Some(lev), Some(medusa), Some(castle)) => lev > medusa && lev < castle,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_numbers() {
        let dungeons = DungeonSystem::standard();
        assert_eq!(dungeons.ledger_no(&DLevel::new(0, 1)), Some(1));
        assert_eq!(dungeons.ledger_no(&DLevel::new(1, 2)), Some(31));
        assert_eq!(dungeons.ledger_no(&DLevel::new(0, 30)), None);
        assert_eq!(dungeons.ledger_no(&DLevel::new(7, 1)), None);
    }

    #[test]
    fn test_branch_lookup() {
        let dungeons = DungeonSystem::standard();
        let branch = dungeons.branch_at(&DLevel::new(1, 1)).expect("mines entry");
        assert_eq!(branch.other_end(&DLevel::new(1, 1)), DLevel::new(0, 3));
        assert!(dungeons.branch_at(&DLevel::new(0, 4)).is_none());
    }

    #[test]
    fn test_between_landmarks() {
        let dungeons = DungeonSystem::standard();
        assert!(dungeons.between_medusa_and_castle(&DLevel::new(0, 23)));
        assert!(!dungeons.between_medusa_and_castle(&DLevel::new(0, 21)));
        assert!(!dungeons.between_medusa_and_castle(&DLevel::new(0, 25)));
    }
}
