//! Level structure (dlevel_t from rm.h)

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::{Cell, CellType, DLevel, Region, Room, Trap};
use crate::monster::{Monster, MonsterId, Worm};
use crate::object::{Object, ObjectId, ObjectLocation};
use crate::rng::GameRng;
use crate::world::{LightSource, TimerQueue};
use crate::{COLNO, MAX_NUM_WORMS, ROWNO};

/// Create default cells grid
fn default_cells() -> Vec<Vec<Cell>> {
    vec![vec![Cell::stone(); ROWNO]; COLNO]
}

/// Create default object grid
fn default_object_grid() -> Vec<Vec<Vec<ObjectId>>> {
    vec![vec![Vec::new(); ROWNO]; COLNO]
}

/// Create default monster grid
fn default_monster_grid() -> Vec<Vec<Option<MonsterId>>> {
    vec![vec![None; ROWNO]; COLNO]
}

fn default_worms() -> Vec<Worm> {
    vec![Worm::default(); MAX_NUM_WORMS]
}

/// Engraving types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum EngravingType {
    #[default]
    Dust = 0, // Written in dust (easily erased)
    Engrave = 1,    // Engraved (permanent)
    Burn = 2,       // Burned (permanent)
    Mark = 3,       // Marked with marker
    BloodStain = 4, // Written in blood
    Headstone = 5,  // Grave inscription
}

/// An engraving on the floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engraving {
    pub x: i8,
    pub y: i8,
    pub text: String,
    pub engr_type: EngravingType,
    pub time: i64,
}

impl Engraving {
    pub fn new(x: i8, y: i8, text: String, engr_type: EngravingType) -> Self {
        Self {
            x,
            y,
            text,
            engr_type,
            time: 0,
        }
    }
}

/// Level flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFlags {
    pub fountain_count: u8,
    pub sink_count: u8,
    pub has_shop: bool,
    pub has_vault: bool,
    pub has_zoo: bool,
    pub has_court: bool,
    pub has_morgue: bool,
    pub has_beehive: bool,
    pub has_barracks: bool,
    pub has_temple: bool,
    pub has_swamp: bool,
    pub no_teleport: bool,
    pub hard_floor: bool,
    pub no_magic_map: bool,
    pub hero_memory: bool,
    pub shortsighted: bool,
    pub graveyard: bool,
    pub is_maze: bool,
    pub is_cavernous: bool,
    pub arboreal: bool,
    pub corridor_maze: bool,
}

/// Stairway or ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stairway {
    pub x: i8,
    pub y: i8,
    pub destination: DLevel,
    pub up: bool,
    pub ladder: bool,
    /// Leads into another dungeon (sstairs)
    pub branch: bool,
}

/// Arrival area for level teleport or falling in from above/below
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestArea {
    pub lx: i8,
    pub ly: i8,
    pub hx: i8,
    pub hy: i8,
    /// Excluded sub-rectangle
    pub nlx: i8,
    pub nly: i8,
    pub nhx: i8,
    pub nhy: i8,
}

/// Pending terrain repair (shopkeepers fix what the hero breaks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainDamage {
    pub when: u64,
    pub cost: i64,
    pub x: i8,
    pub y: i8,
    /// Terrain to restore
    pub typ: CellType,
}

/// Objects and monsters pulled off a level while its derived indices are
/// rebuilt
#[derive(Debug, Default)]
pub struct FloatingPool {
    pub objects: Vec<Object>,
    pub monsters: Vec<Monster>,
}

/// Complete level structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Level identifier
    pub dlevel: DLevel,

    /// Turn at which the hero last left this level
    pub last_moves: u64,

    /// Map cells, indexed `[x][y]`
    #[serde(default = "default_cells")]
    pub cells: Vec<Vec<Cell>>,

    /// Object pile at each position, bottom first (derived)
    #[serde(skip, default = "default_object_grid")]
    pub object_grid: Vec<Vec<Vec<ObjectId>>>,

    /// Monster at each position (derived)
    #[serde(skip, default = "default_monster_grid")]
    pub monster_grid: Vec<Vec<Option<MonsterId>>>,

    /// Floor objects
    pub objects: Vec<Object>,

    /// Buried objects
    pub buried_objects: Vec<Object>,

    /// Used-up objects the hero still owes a shopkeeper for
    pub bill_objects: Vec<Object>,

    /// All monsters on this level
    pub monsters: Vec<Monster>,

    /// Long worm tails, indexed by `wormno`
    #[serde(default = "default_worms")]
    pub worms: Vec<Worm>,

    pub traps: Vec<Trap>,

    pub engravings: Vec<Engraving>,

    pub rooms: Vec<Room>,

    /// Door positions referenced by rooms
    pub doors: Vec<(i8, i8)>,

    /// Stairways and ladders
    pub stairs: Vec<Stairway>,

    pub up_dest: DestArea,
    pub down_dest: DestArea,

    /// Level flags
    pub flags: LevelFlags,

    /// Terrain waiting for repair
    pub damage: Vec<TerrainDamage>,

    pub regions: Vec<Region>,

    /// Timers tied to this level
    pub timers: TimerQueue,

    /// Light sources tied to this level
    pub lights: Vec<LightSource>,
}

impl Default for Level {
    fn default() -> Self {
        Self::new(DLevel::default())
    }
}

impl PartialEq for Level {
    /// Persisted state only; derived indices are ignored
    fn eq(&self, other: &Self) -> bool {
        self.dlevel == other.dlevel
            && self.last_moves == other.last_moves
            && self.cells == other.cells
            && self.objects == other.objects
            && self.buried_objects == other.buried_objects
            && self.bill_objects == other.bill_objects
            && self.monsters == other.monsters
            && self.worms == other.worms
            && self.traps == other.traps
            && self.engravings == other.engravings
            && self.rooms == other.rooms
            && self.doors == other.doors
            && self.stairs == other.stairs
            && self.up_dest == other.up_dest
            && self.down_dest == other.down_dest
            && self.flags == other.flags
            && self.damage == other.damage
            && self.regions == other.regions
            && self.timers == other.timers
            && self.lights == other.lights
    }
}

impl Level {
    /// Create a new empty level
    pub fn new(dlevel: DLevel) -> Self {
        Self {
            dlevel,
            last_moves: 0,
            cells: default_cells(),
            object_grid: default_object_grid(),
            monster_grid: default_monster_grid(),
            objects: Vec::new(),
            buried_objects: Vec::new(),
            bill_objects: Vec::new(),
            monsters: Vec::new(),
            worms: default_worms(),
            traps: Vec::new(),
            engravings: Vec::new(),
            rooms: Vec::new(),
            doors: Vec::new(),
            stairs: Vec::new(),
            up_dest: DestArea::default(),
            down_dest: DestArea::default(),
            flags: LevelFlags::default(),
            damage: Vec::new(),
            regions: Vec::new(),
            timers: TimerQueue::new(),
            lights: Vec::new(),
        }
    }

    /// Get cell at position
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[x][y]
    }

    /// Check if position is valid
    pub const fn is_valid_pos(&self, x: i8, y: i8) -> bool {
        x >= 0 && y >= 0 && (x as usize) < COLNO && (y as usize) < ROWNO
    }

    /// Get monster at position
    pub fn monster_at(&self, x: i8, y: i8) -> Option<&Monster> {
        if !self.is_valid_pos(x, y) {
            return None;
        }
        let id = self.monster_grid[x as usize][y as usize]?;
        self.monster(id)
    }

    /// Get monster by ID
    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id)
    }

    /// Objects piled at position, bottom first
    pub fn objects_at(&self, x: i8, y: i8) -> Vec<&Object> {
        if !self.is_valid_pos(x, y) {
            return Vec::new();
        }
        self.object_grid[x as usize][y as usize]
            .iter()
            .filter_map(|id| self.objects.iter().find(|o| o.id == *id))
            .collect()
    }

    /// Find an object anywhere on the level, including containers and
    /// monster inventories
    pub fn find_object(&self, id: ObjectId) -> Option<&Object> {
        use crate::object::find_in_chain;

        find_in_chain(&self.objects, id)
            .or_else(|| find_in_chain(&self.buried_objects, id))
            .or_else(|| find_in_chain(&self.bill_objects, id))
            .or_else(|| {
                self.monsters
                    .iter()
                    .find_map(|m| find_in_chain(&m.inventory, id))
            })
    }

    /// Put an object on the floor chain and the pile index (place_object)
    pub fn place_object(&mut self, mut object: Object) {
        object.location = ObjectLocation::Floor;
        object.container = None;
        object.carrier = None;
        object.olev = Some(self.dlevel);
        if self.is_valid_pos(object.x, object.y) {
            self.object_grid[object.x as usize][object.y as usize].push(object.id);
        }
        self.objects.push(object);
    }

    /// Put a monster on the chain and the occupancy index (place_monster).
    ///
    /// Monsters with an off-map position (x == 0) are chained but not
    /// indexed. Returns false if the square already held another monster.
    pub fn place_monster(&mut self, monster: Monster) -> bool {
        let mut vacant = true;
        if monster.x > 0 && self.is_valid_pos(monster.x, monster.y) {
            let slot = &mut self.monster_grid[monster.x as usize][monster.y as usize];
            vacant = slot.is_none();
            *slot = Some(monster.id);
        }
        self.monsters.push(monster);
        vacant
    }

    /// Detach every floor object and monster and clear the derived indices
    pub fn stage_all(&mut self) -> FloatingPool {
        self.object_grid = default_object_grid();
        self.monster_grid = default_monster_grid();
        FloatingPool {
            objects: std::mem::take(&mut self.objects)
                .into_iter()
                .map(|mut o| {
                    o.location = ObjectLocation::Free;
                    o
                })
                .collect(),
            monsters: std::mem::take(&mut self.monsters),
        }
    }

    /// Place everything from `pool` at its stored coordinates, in order.
    ///
    /// Returns the ids of monsters that landed on an occupied square.
    pub fn place_all(&mut self, pool: FloatingPool) -> Vec<MonsterId> {
        for object in pool.objects {
            self.place_object(object);
        }
        let mut collisions = Vec::new();
        for monster in pool.monsters {
            let id = monster.id;
            if !self.place_monster(monster) {
                collisions.push(id);
            }
        }
        collisions
    }

    /// Rebuild both derived indices from the chains
    pub fn rebuild_indices(&mut self) -> Vec<MonsterId> {
        let pool = self.stage_all();
        self.place_all(pool)
    }

    /// Do the derived indices equal a fresh projection of the chains?
    pub fn derived_indices_consistent(&self) -> bool {
        let mut objects = default_object_grid();
        for obj in &self.objects {
            if self.is_valid_pos(obj.x, obj.y) {
                objects[obj.x as usize][obj.y as usize].push(obj.id);
            }
        }
        let mut monsters = default_monster_grid();
        for mon in &self.monsters {
            if mon.x > 0 && self.is_valid_pos(mon.x, mon.y) {
                monsters[mon.x as usize][mon.y as usize] = Some(mon.id);
            }
        }
        objects == self.object_grid && monsters == self.monster_grid
    }

    /// Get trap at position
    pub fn trap_at(&self, x: i8, y: i8) -> Option<&Trap> {
        self.traps.iter().find(|t| t.x == x && t.y == y)
    }

    /// Find downstairs
    pub fn find_downstairs(&self) -> Option<(i8, i8)> {
        self.stairs
            .iter()
            .find(|s| !s.up && !s.branch && !s.ladder)
            .map(|s| (s.x, s.y))
    }

    /// The stairs leading into another dungeon, if any
    pub fn branch_stairs_mut(&mut self) -> Option<&mut Stairway> {
        self.stairs.iter_mut().find(|s| s.branch)
    }

    /// Random accessible spot inside a random ordinary room (somexy)
    pub fn random_room_spot(&self, rng: &mut GameRng) -> Option<(i8, i8)> {
        if self.rooms.is_empty() {
            return None;
        }
        for _ in 0..100 {
            let room = &self.rooms[rng.rn2(self.rooms.len() as u32) as usize];
            let (x, y) = room.bounds.random_spot(rng);
            if self.is_valid_pos(x, y)
                && self.cells[x as usize][y as usize].typ == CellType::Room
                && self.trap_at(x, y).is_none()
            {
                return Some((x, y));
            }
        }
        None
    }

    /// Turn (x, y) into a staircase (mkstairs)
    pub fn make_stairs(&mut self, x: i8, y: i8, up: bool, destination: DLevel) {
        if !self.is_valid_pos(x, y) {
            return;
        }
        self.cells[x as usize][y as usize].typ = CellType::Stairs;
        self.stairs.push(Stairway {
            x,
            y,
            destination,
            up,
            ladder: false,
            branch: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::RoomType;
    use crate::object::ObjectClass;

    fn rock(id: u32, x: i8, y: i8) -> Object {
        let mut obj = Object::new(ObjectId(id), 447, ObjectClass::Rock);
        obj.x = x;
        obj.y = y;
        obj
    }

    #[test]
    fn test_place_object_builds_pile() {
        let mut level = Level::new(DLevel::new(0, 2));
        level.place_object(rock(1, 5, 5));
        level.place_object(rock(2, 5, 5));
        level.place_object(rock(3, 6, 5));

        let pile: Vec<_> = level.objects_at(5, 5).iter().map(|o| o.id).collect();
        assert_eq!(pile, vec![ObjectId(1), ObjectId(2)]);
        assert_eq!(level.objects[0].olev, Some(DLevel::new(0, 2)));
        assert!(level.derived_indices_consistent());
    }

    #[test]
    fn test_stage_and_place_preserves_order() {
        let mut level = Level::new(DLevel::new(0, 1));
        for i in 1..=4 {
            level.place_object(rock(i, 3 + i as i8, 4));
        }
        level.place_monster(Monster::new(MonsterId(8), 20, 10, 10));
        level.place_monster(Monster::new(MonsterId(9), 20, 11, 10));
        let before = level.clone();

        let pool = level.stage_all();
        assert!(level.objects.is_empty());
        assert_eq!(pool.objects.len(), 4);
        assert!(pool.objects.iter().all(|o| o.location == ObjectLocation::Free));

        assert!(level.place_all(pool).is_empty());
        assert_eq!(level, before);
        assert!(level.derived_indices_consistent());
        assert_eq!(level.monster_at(11, 10).map(|m| m.id), Some(MonsterId(9)));
    }

    #[test]
    fn test_stale_index_detected() {
        let mut level = Level::new(DLevel::new(0, 1));
        level.place_object(rock(1, 5, 5));
        level.objects[0].x = 6;
        assert!(!level.derived_indices_consistent());
        level.rebuild_indices();
        assert!(level.derived_indices_consistent());
    }

    #[test]
    fn test_monster_collision_reported() {
        let mut level = Level::new(DLevel::new(0, 1));
        level.place_monster(Monster::new(MonsterId(1), 20, 4, 4));
        assert!(!level.place_monster(Monster::new(MonsterId(2), 20, 4, 4)));
    }

    #[test]
    fn test_random_room_spot() {
        let mut level = Level::new(DLevel::new(0, 1));
        assert!(level.random_room_spot(&mut GameRng::new(3)).is_none());

        for x in 10..15 {
            for y in 5..8 {
                level.cells[x][y] = Cell::floor();
            }
        }
        level.rooms.push(Room::new(10, 5, 14, 7, RoomType::Ordinary));
        let (x, y) = level.random_room_spot(&mut GameRng::new(3)).unwrap();
        assert!((10..=14).contains(&x) && (5..=7).contains(&y));

        level.make_stairs(x, y, false, DLevel::new(0, 2));
        assert_eq!(level.find_downstairs(), Some((x, y)));
        assert_eq!(level.cell(x as usize, y as usize).typ, CellType::Stairs);
    }
}
