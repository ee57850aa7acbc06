//! Monster instances (monst.h)

use serde::{Deserialize, Serialize};

use super::MonsterExtra;
use crate::dungeon::DLevel;
use crate::object::{Object, ObjectId, ObjectLocation};
use crate::player::AlignmentType;
use crate::reference::EntityId;
use crate::rng::GameRng;

/// Unique identifier for monster instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

impl MonsterId {
    pub const NONE: MonsterId = MonsterId(0);

    pub fn next(self) -> Self {
        MonsterId(self.0 + 1)
    }
}

impl EntityId for MonsterId {
    fn raw(self) -> u32 {
        self.0
    }

    fn from_raw(raw: u32) -> Self {
        MonsterId(raw)
    }
}

/// Monster behavior state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterState {
    /// Peaceful toward player
    pub peaceful: bool,

    /// Tameness (0 = not a pet)
    pub tame: u8,

    /// Currently sleeping
    pub sleeping: bool,

    /// Fleeing
    pub fleeing: bool,

    /// Can currently move
    pub can_move: bool,

    /// Invisible
    pub invisible: bool,

    /// Hiding/undetected
    pub hiding: bool,

    /// Cancelled (magic suppressed)
    pub cancelled: bool,

    /// Trapped (in a pit, bear trap, etc.)
    pub trapped: bool,

    pub female: bool,

    /// Species is never peaceful
    pub always_hostile: bool,

    /// Species is always peaceful
    pub always_peaceful: bool,
}

/// Monster instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    /// Unique identifier
    pub id: MonsterId,

    /// Monster type index (into PerMonst array)
    pub monster_type: i16,

    /// Position
    pub x: i8,
    pub y: i8,

    /// Adjusted level
    pub level: u8,

    /// Species alignment (A_NONE is -128)
    pub alignment: i8,

    /// Alignment-record adjustment for killing this monster
    pub malign: i32,

    /// Hit points
    pub hp: i32,
    pub hp_max: i32,

    /// Behavior state
    pub state: MonsterState,

    /// Long worm slot (0 = not a worm)
    pub wormno: u8,

    /// Turn of last movement (mlstmv)
    pub last_move: i64,

    /// Personal name
    pub name: Option<String>,

    /// Inventory chain
    pub inventory: Vec<Object>,

    /// Wielded weapon, pointing into `inventory`
    pub weapon: Option<ObjectId>,

    /// Shopkeeper/priest/minion state
    pub extra: MonsterExtra,

    /// Destination while migrating between levels
    pub migrating_to: Option<DLevel>,
}

impl Default for Monster {
    fn default() -> Self {
        Self {
            id: MonsterId::NONE,
            monster_type: 0,
            x: 0,
            y: 0,
            level: 0,
            alignment: 0,
            malign: 0,
            hp: 1,
            hp_max: 1,
            state: MonsterState {
                can_move: true,
                ..Default::default()
            },
            wormno: 0,
            last_move: 0,
            name: None,
            inventory: Vec::new(),
            weapon: None,
            extra: MonsterExtra::None,
            migrating_to: None,
        }
    }
}

impl Monster {
    pub fn new(id: MonsterId, monster_type: i16, x: i8, y: i8) -> Self {
        Self {
            id,
            monster_type,
            x,
            y,
            ..Default::default()
        }
    }

    pub fn is_shopkeeper(&self) -> bool {
        matches!(self.extra, MonsterExtra::Shopkeeper(_))
    }

    pub fn is_tame(&self) -> bool {
        self.state.tame > 0
    }

    /// Add an object to this monster's inventory (mpickobj)
    pub fn add_to_inventory(&mut self, mut obj: Object) {
        obj.location = ObjectLocation::MonsterInventory;
        obj.carrier = Some(self.id);
        obj.container = None;
        self.inventory.push(obj);
    }

    /// Find the inventory item flagged as wielded
    pub fn find_wielded(&self) -> Option<ObjectId> {
        self.inventory.iter().find(|o| o.is_wielded()).map(|o| o.id)
    }

    /// Recompute the alignment-record adjustment (set_malign)
    pub fn set_malign(&mut self, player_align: AlignmentType) {
        let coaligned = sign(self.alignment) == player_align.sign();
        let absmal = (self.alignment as i32).abs().min(20);
        self.malign = if self.state.always_peaceful {
            if coaligned { -3 * absmal.max(5) } else { 3 * absmal.max(5) }
        } else if self.state.always_hostile {
            if coaligned { 0 } else { absmal.max(1) }
        } else if coaligned {
            if self.state.peaceful { -3 * absmal.max(3) } else { absmal.max(1) }
        } else if self.state.peaceful {
            -3 * absmal.max(3)
        } else {
            absmal
        };
    }
}

fn sign(v: i8) -> i8 {
    v.signum()
}

/// Would this monster be peaceful toward a player of the given alignment?
///
/// Used when a bones level is loaded into a game whose hero may not share
/// the dead hero's alignment.
pub fn peace_minded(
    mon: &Monster,
    player_align: AlignmentType,
    align_record: i32,
    rng: &mut GameRng,
) -> bool {
    if mon.state.always_peaceful {
        return true;
    }
    if mon.state.always_hostile {
        return false;
    }
    if sign(mon.alignment) != player_align.sign() {
        return false;
    }
    // A_NONE monsters are never coaligned with anyone.
    if mon.alignment == i8::MIN {
        return false;
    }
    let record_bias = if align_record < -15 { -5 } else { align_record.min(50) };
    let strayed = 16 + record_bias;
    rng.rn2(strayed.max(1) as u32) != 0 && rng.rn2(2 + (mon.alignment as i32).unsigned_abs()) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectClass, WornMask};

    #[test]
    fn test_find_wielded() {
        let mut mon = Monster::new(MonsterId(3), 100, 5, 5);
        mon.add_to_inventory(Object::new(ObjectId(10), 5, ObjectClass::Gem));
        let mut sword = Object::new(ObjectId(11), 30, ObjectClass::Weapon);
        sword.worn_mask = WornMask::WEAPON;
        mon.add_to_inventory(sword);

        assert_eq!(mon.find_wielded(), Some(ObjectId(11)));
        assert!(mon.inventory.iter().all(|o| o.carrier == Some(MonsterId(3))));
    }

    #[test]
    fn test_cross_aligned_is_hostile() {
        let mut rng = GameRng::new(1);
        let mut mon = Monster::new(MonsterId(1), 50, 1, 1);
        mon.alignment = -5;
        for _ in 0..20 {
            assert!(!peace_minded(&mon, AlignmentType::Lawful, 10, &mut rng));
        }
        mon.state.always_peaceful = true;
        assert!(peace_minded(&mon, AlignmentType::Lawful, 10, &mut rng));
    }

    #[test]
    fn test_coaligned_usually_peaceful() {
        let mut rng = GameRng::new(2);
        let mut mon = Monster::new(MonsterId(1), 50, 1, 1);
        mon.alignment = 3;
        let peaceful = (0..200)
            .filter(|_| peace_minded(&mon, AlignmentType::Lawful, 10, &mut rng))
            .count();
        assert!(peaceful > 100);
    }
}
