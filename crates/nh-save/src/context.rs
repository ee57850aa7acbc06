//! Per-operation state threaded through save and restore

use hashbrown::HashSet;
use nh_core::dungeon::{DLevel, DungeonSystem};
use nh_core::object::{FruitTable, Object, ObjectLocation};
use nh_core::world::{LightOwner, LightSource, Timer, TimerArg, TimerKind, TimerQueue};
use nh_core::GameState;

use crate::idmap::IdMap;
use crate::trie::IdTrie;

/// Transient state for one restore
#[derive(Debug, Default)]
pub struct RestoreContext {
    /// Loading a level from another game (bones)
    pub ghostly: bool,
    /// Old to new ids, only filled while `ghostly`
    pub idmap: IdMap,
    /// Current turn of the game being restored into
    pub moves: u64,
    /// Turn the level being read was last active
    pub omoves: u64,
    /// Objects created by this load, by (new) id
    pub objects: IdTrie<ObjectLocation>,
    /// Monsters created by this load, by (new) id
    pub monsters: IdTrie<()>,
    /// The bones file's own fruit chain
    pub bones_fruits: Option<FruitTable>,
}

impl RestoreContext {
    pub fn new(moves: u64) -> Self {
        Self {
            moves,
            ..Self::default()
        }
    }

    pub fn ghost(moves: u64, bones_fruits: FruitTable) -> Self {
        Self {
            ghostly: true,
            moves,
            bones_fruits: Some(bones_fruits),
            ..Self::default()
        }
    }

    /// Turns that passed in this game since the level was last active
    pub fn elapsed(&self) -> i64 {
        self.moves as i64 - self.omoves as i64
    }

    pub fn clear_caches(&mut self) {
        self.objects.clear();
        self.monsters.clear();
    }
}

/// Timers and lights live in either the game-wide (global) range or one
/// level's (local) range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Global,
    Local,
}

/// Read-only view used while writing
pub struct SaveContext<'a> {
    pub dungeons: &'a DungeonSystem,
    /// Level whose local range also takes the carried timers/lights that
    /// are not attached to anything in transit
    pub current: Option<DLevel>,
    pub carried_timers: Option<&'a TimerQueue>,
    pub carried_lights: &'a [LightSource],
    /// Raw ids of objects in the hero's inventory or in transit
    global_objects: HashSet<u32>,
    /// Raw ids of monsters in transit
    migrating_monsters: HashSet<u32>,
    /// Bones have no game-wide range: whatever the level holds is local
    bones: bool,
}

fn collect_ids(chain: &[Object], into: &mut HashSet<u32>) {
    for obj in chain {
        obj.walk(&mut |o| {
            into.insert(o.id.0);
        });
    }
}

impl<'a> SaveContext<'a> {
    pub fn for_game(game: &'a GameState) -> Self {
        let mut global_objects = HashSet::new();
        collect_ids(&game.inventory, &mut global_objects);
        collect_ids(&game.migrating_objects, &mut global_objects);
        let mut migrating_monsters = HashSet::new();
        for mon in &game.migrating_monsters {
            migrating_monsters.insert(mon.id.0);
            collect_ids(&mon.inventory, &mut global_objects);
        }
        Self {
            dungeons: &game.dungeons,
            current: Some(game.current),
            carried_timers: Some(&game.timers),
            carried_lights: &game.lights,
            global_objects,
            migrating_monsters,
            bones: false,
        }
    }

    /// Bones: one level, nothing carried, nothing in transit
    pub fn for_bones(dungeons: &'a DungeonSystem) -> Self {
        Self {
            dungeons,
            current: None,
            carried_timers: None,
            carried_lights: &[],
            global_objects: HashSet::new(),
            migrating_monsters: HashSet::new(),
            bones: true,
        }
    }

    fn object_in_transit(&self, raw: u32) -> bool {
        self.global_objects.contains(&raw)
    }

    /// Which range a timer belongs in, from what it is attached to
    pub fn timer_range(&self, timer: &Timer) -> Range {
        if self.bones {
            return Range::Local;
        }
        let global = match (timer.kind, timer.arg) {
            (TimerKind::Global, _) => true,
            (_, TimerArg::Object(r)) => self.object_in_transit(r.raw_id()),
            (_, TimerArg::Monster(r)) => self.migrating_monsters.contains(&r.raw_id()),
            _ => false,
        };
        if global { Range::Global } else { Range::Local }
    }

    pub fn light_range(&self, light: &LightSource) -> Range {
        if self.bones {
            return Range::Local;
        }
        let global = match light.owner {
            LightOwner::Object(r) => self.object_in_transit(r.raw_id()),
            LightOwner::Monster(r) => self.migrating_monsters.contains(&r.raw_id()),
        };
        if global { Range::Global } else { Range::Local }
    }

    /// Is `level` the one carried local timers/lights are written with?
    pub fn adopts(&self, level: DLevel) -> bool {
        self.current == Some(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nh_core::object::{ObjectClass, ObjectId};
    use nh_core::world::TimerFunc;
    use nh_core::Reference;

    #[test]
    fn test_range_follows_attachment() {
        let mut game = GameState::new(1);
        game.inventory
            .push(Object::new(ObjectId(5), 222, ObjectClass::Tool));
        let ctx = SaveContext::for_game(&game);

        let timer = |kind, arg| Timer {
            id: 1,
            fire_at: 10,
            kind,
            func: TimerFunc::BurnObject,
            arg,
        };
        assert_eq!(
            ctx.timer_range(&timer(TimerKind::Object, TimerArg::Object(Reference::Resolved(ObjectId(5))))),
            Range::Global
        );
        assert_eq!(
            ctx.timer_range(&timer(TimerKind::Object, TimerArg::Object(Reference::Resolved(ObjectId(6))))),
            Range::Local
        );
        assert_eq!(ctx.timer_range(&timer(TimerKind::Global, TimerArg::None)), Range::Global);
        assert_eq!(
            ctx.timer_range(&timer(TimerKind::Level, TimerArg::Location { x: 1, y: 1 })),
            Range::Local
        );
    }

    #[test]
    fn test_bones_keep_everything_local() {
        let dungeons = DungeonSystem::default();
        let ctx = SaveContext::for_bones(&dungeons);
        let timer = Timer {
            id: 1,
            fire_at: 10,
            kind: TimerKind::Global,
            func: TimerFunc::BurnObject,
            arg: TimerArg::None,
        };
        assert_eq!(ctx.timer_range(&timer), Range::Local);
    }

    #[test]
    fn test_elapsed() {
        let mut ctx = RestoreContext::new(500);
        ctx.omoves = 350;
        assert_eq!(ctx.elapsed(), 150);
    }
}
