//! Where a level sits: branch plus depth within the branch

use serde::{Deserialize, Serialize};

/// Ordered by branch first, which is the order levels are saved in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct DLevel {
    pub dungeon_num: i8,
    pub level_num: i8,
}

impl DLevel {
    pub const fn new(dungeon_num: i8, level_num: i8) -> Self {
        Self {
            dungeon_num,
            level_num,
        }
    }

    /// Top level of the Dungeons of Doom
    pub const fn main_dungeon_start() -> Self {
        Self::new(0, 1)
    }

    /// The next level down in the same branch
    pub const fn below(self) -> Self {
        Self::new(self.dungeon_num, self.level_num.saturating_add(1))
    }

    /// Name of the bones file for this level
    pub fn bones_file_name(self) -> String {
        format!("bon{}.{}", self.dungeon_num, self.level_num)
    }
}

impl std::fmt::Display for DLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dungeon_num, self.level_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_orders_first() {
        assert!(DLevel::new(0, 30) < DLevel::new(1, 1));
        assert!(DLevel::new(2, 1) < DLevel::new(2, 2));
    }

    #[test]
    fn test_below_stays_in_branch() {
        assert_eq!(DLevel::new(3, 4).below(), DLevel::new(3, 5));
        assert_eq!(DLevel::new(0, i8::MAX).below().level_num, i8::MAX);
    }

    #[test]
    fn test_bones_file_name() {
        assert_eq!(DLevel::new(0, 7).bones_file_name(), "bon0.7");
    }
}
