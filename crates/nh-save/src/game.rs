//! Whole-game save and recovery (dosave / dorecover)
//!
//! Section order is fixed and shared by both directions. A game restored
//! from a stream and saved again reproduces that stream byte for byte.

use nh_core::dungeon::{Branch, BranchType, DLevel, Dungeon, DungeonFlags, DungeonSystem, SpecialLevel};
use nh_core::monster::{MonsterId, MonsterVitals, VitalFlags};
use nh_core::object::{
    find_in_chain, ArtifactState, ArtifactTable, Fruit, FruitTable, ObjectId, ObjectLocation,
};
use nh_core::player::{Alignment, AlignmentType, KnownSpell, Position, You};
use nh_core::world::{Flags, LightSource, Timer};
use nh_core::{
    GameRng, GameState, LevelMap, Reference, RngState, MAXDUNGEON, MAXSPELL, MSGHISTORY,
    NROFARTIFACTS, NUMMONS,
};

use crate::context::{Range, RestoreContext, SaveContext};
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::level::{getlev, link_bills, savelev};
use crate::light::{relink_light_sources, restore_light_sources, save_light_sources};
use crate::magic::Magic;
use crate::monster::{
    read_dlevel, restore_mon_chain, restore_monster, save_mon_chain, save_monster, write_dlevel,
};
use crate::object::{restore_obj_chain, save_obj_chain, ChainHome};
use crate::relink::Scan;
use crate::timer::{into_queue, relink_timers, restore_timers, save_timers};
use crate::version::VersionInfo;

const MAX_LEVELS: usize = MAXDUNGEON * nh_core::MAXLEVEL;
const MAX_BRANCHES: usize = 32;
const MAX_FRUITS: usize = 1 << 12;

/// Outcome of reading a save file
#[derive(Debug)]
pub enum Recovery {
    Restored(Box<GameState>),
    /// Written by a build with a different layout; nothing was read past
    /// the version record
    Incompatible { found: VersionInfo },
}

// ---------------------------------------------------------------------------
// Small records
// ---------------------------------------------------------------------------

fn write_monster_ref(w: &mut SaveWriter, r: Option<Reference<MonsterId>>) {
    w.u32(r.map_or(0, |r| r.raw_id()));
}

fn read_monster_ref(r: &mut SaveReader<'_>) -> SaveResult<Option<Reference<MonsterId>>> {
    let raw = r.u32()?;
    Ok((raw != 0).then_some(Reference::Unresolved(raw)))
}

fn save_you(w: &mut SaveWriter, you: &You) -> SaveResult<()> {
    w.magic(Magic::PLYR);
    w.str(&you.name)?;
    w.str(&you.role)?;
    w.str(&you.race)?;
    w.i8(you.pos.x);
    w.i8(you.pos.y);
    write_dlevel(w, you.level);
    w.bool(you.moved);
    w.i32(you.exp_level);
    w.u64(you.exp);
    w.i32(you.hp);
    w.i32(you.hp_max);
    w.i32(you.energy);
    w.i32(you.energy_max);
    w.i8(you.alignment.typ.sign());
    w.i32(you.alignment.record);
    w.i8(you.luck);
    w.i32(you.nutrition);
    w.i32(you.gold);
    write_monster_ref(w, you.stuck);
    write_monster_ref(w, you.steed);
    Ok(())
}

/// Player record; known spells come later from `SPEL`
fn restore_you(r: &mut SaveReader<'_>) -> SaveResult<You> {
    r.expect_magic(Magic::PLYR)?;
    Ok(You {
        name: r.str()?,
        role: r.str()?,
        race: r.str()?,
        pos: Position::new(r.i8()?, r.i8()?),
        level: read_dlevel(r)?,
        moved: r.bool()?,
        exp_level: r.i32()?,
        exp: r.u64()?,
        hp: r.i32()?,
        hp_max: r.i32()?,
        energy: r.i32()?,
        energy_max: r.i32()?,
        alignment: Alignment {
            typ: AlignmentType::from_sign(r.i8()?),
            record: r.i32()?,
        },
        luck: r.i8()?,
        nutrition: r.i32()?,
        gold: r.i32()?,
        stuck: read_monster_ref(r)?,
        steed: read_monster_ref(r)?,
        known_spells: Vec::new(),
    })
}

fn write_dungeon_flags(w: &mut SaveWriter, f: &DungeonFlags) {
    w.bool(f.town);
    w.bool(f.hellish);
    w.bool(f.maze_like);
    w.bool(f.rogue_like);
    w.i8(f.alignment);
}

fn read_dungeon_flags(r: &mut SaveReader<'_>) -> SaveResult<DungeonFlags> {
    Ok(DungeonFlags {
        town: r.bool()?,
        hellish: r.bool()?,
        maze_like: r.bool()?,
        rogue_like: r.bool()?,
        alignment: r.i8()?,
    })
}

fn save_dungeons(w: &mut SaveWriter, ds: &DungeonSystem) -> SaveResult<()> {
    w.magic(Magic::DUNG);
    w.count(ds.dungeons.len(), MAXDUNGEON)?;
    for d in &ds.dungeons {
        w.str(&d.name)?;
        w.str(&d.prototype)?;
        w.u32(d.bones_char as u32);
        write_dungeon_flags(w, &d.flags);
        w.i8(d.entry_level);
        w.i8(d.num_levels);
        w.i8(d.deepest_reached);
        w.i32(d.ledger_start);
        w.i32(d.depth_start);
    }
    w.count(ds.branches.len(), MAX_BRANCHES)?;
    for b in &ds.branches {
        w.i32(b.id);
        w.u8(b.branch_type as u8);
        write_dlevel(w, b.end1);
        write_dlevel(w, b.end2);
        w.bool(b.end1_up);
    }
    write_dlevel(w, ds.medusa_level);
    write_dlevel(w, ds.castle_level);

    w.magic(Magic::SPLV);
    w.count(ds.special_levels.len(), MAX_LEVELS)?;
    for sp in &ds.special_levels {
        w.str(&sp.proto)?;
        write_dlevel(w, sp.dlevel);
        w.u8(sp.random_variants);
        write_dungeon_flags(w, &sp.flags);
    }
    Ok(())
}

fn restore_dungeons(r: &mut SaveReader<'_>) -> SaveResult<DungeonSystem> {
    r.expect_magic(Magic::DUNG)?;
    let n = r.count(MAXDUNGEON)?;
    let mut dungeons = Vec::with_capacity(n);
    for _ in 0..n {
        let name = r.str()?;
        let prototype = r.str()?;
        let ch = r.u32()?;
        let bones_char =
            char::from_u32(ch).ok_or_else(|| SaveError::corrupt(format!("bones char {ch:#x}")))?;
        dungeons.push(Dungeon {
            name,
            prototype,
            bones_char,
            flags: read_dungeon_flags(r)?,
            entry_level: r.i8()?,
            num_levels: r.i8()?,
            deepest_reached: r.i8()?,
            ledger_start: r.i32()?,
            depth_start: r.i32()?,
        });
    }
    let n = r.count(MAX_BRANCHES)?;
    let mut branches = Vec::with_capacity(n);
    for _ in 0..n {
        let id = r.i32()?;
        let btyp = r.u8()?;
        let branch_type = BranchType::from_repr(btyp)
            .ok_or_else(|| SaveError::corrupt(format!("branch type {btyp}")))?;
        branches.push(Branch {
            id,
            branch_type,
            end1: read_dlevel(r)?,
            end2: read_dlevel(r)?,
            end1_up: r.bool()?,
        });
    }
    let medusa_level = read_dlevel(r)?;
    let castle_level = read_dlevel(r)?;

    r.expect_magic(Magic::SPLV)?;
    let n = r.count(MAX_LEVELS)?;
    let mut special_levels = Vec::with_capacity(n);
    for _ in 0..n {
        special_levels.push(SpecialLevel {
            proto: r.str()?,
            dlevel: read_dlevel(r)?,
            random_variants: r.u8()?,
            flags: read_dungeon_flags(r)?,
        });
    }
    Ok(DungeonSystem {
        dungeons,
        branches,
        special_levels,
        medusa_level,
        castle_level,
    })
}

pub(crate) fn save_fruits(w: &mut SaveWriter, fruits: &FruitTable) -> SaveResult<()> {
    w.magic(Magic::FRCH);
    w.count(fruits.len(), MAX_FRUITS)?;
    for f in fruits.iter() {
        w.i32(f.fid);
        w.str(&f.name)?;
    }
    Ok(())
}

pub(crate) fn restore_fruits(r: &mut SaveReader<'_>) -> SaveResult<FruitTable> {
    r.expect_magic(Magic::FRCH)?;
    let n = r.count(MAX_FRUITS)?;
    let mut fruits = Vec::with_capacity(n);
    for _ in 0..n {
        fruits.push(Fruit {
            fid: r.i32()?,
            name: r.str()?,
        });
    }
    Ok(FruitTable::from_fruits(fruits))
}

// ---------------------------------------------------------------------------
// dosave
// ---------------------------------------------------------------------------

/// Global-range timers and lights from the hero and every level
fn global_sections<'a>(
    game: &'a GameState,
    ctx: &SaveContext<'a>,
) -> (Vec<&'a Timer>, Vec<&'a LightSource>) {
    let mut timers: Vec<&Timer> = game
        .timers
        .iter()
        .filter(|t| ctx.timer_range(t) == Range::Global)
        .collect();
    let mut lights: Vec<&LightSource> = game
        .lights
        .iter()
        .filter(|l| ctx.light_range(l) == Range::Global)
        .collect();
    for level in game.levels.values() {
        timers.extend(level.timers.iter().filter(|t| ctx.timer_range(t) == Range::Global));
        lights.extend(level.lights.iter().filter(|l| ctx.light_range(l) == Range::Global));
    }
    timers.sort_by_key(|t| t.fire_at);
    (timers, lights)
}

/// Serialize the whole game
pub fn dosave(game: &GameState) -> SaveResult<Vec<u8>> {
    let _span = tracing::info_span!("dosave", moves = game.moves).entered();
    let ctx = SaveContext::for_game(game);
    let mut w = SaveWriter::new();

    VersionInfo::CURRENT.write(&mut w);

    w.magic(Magic::STAT);
    w.u64(game.moves);
    w.u32(game.ident);
    w.u32(game.flags.bits());
    write_dlevel(&mut w, game.current);

    save_you(&mut w, &game.you)?;
    save_monster(&mut w, &game.youmonst)?;
    save_dungeons(&mut w, &game.dungeons)?;

    w.count(game.levels.len(), MAX_LEVELS)?;
    for level in game.levels.values() {
        savelev(&mut w, level, &ctx)?;
    }

    let (timers, lights) = global_sections(game, &ctx);
    save_timers(&mut w, game.timers.next_id(), &timers)?;
    save_light_sources(&mut w, &lights)?;

    w.magic(Magic::INVT);
    save_obj_chain(&mut w, &game.inventory)?;
    w.magic(Magic::OCLL);
    save_obj_chain(&mut w, &game.migrating_objects)?;
    w.magic(Magic::MMIG);
    save_mon_chain(&mut w, &game.migrating_monsters)?;

    w.magic(Magic::MVIT);
    w.count(game.mvitals.len(), NUMMONS)?;
    for v in &game.mvitals {
        w.u8(v.born);
        w.u8(v.died);
        w.u8(v.flags.bits());
    }

    w.magic(Magic::SPEL);
    w.count(game.you.known_spells.len(), MAXSPELL)?;
    for sp in &game.you.known_spells {
        w.i16(sp.spell_id);
        w.i8(sp.level);
        w.i32(sp.retention);
    }

    w.magic(Magic::ARTI);
    w.count(game.artifacts.entries.len(), NROFARTIFACTS)?;
    for a in &game.artifacts.entries {
        w.bool(a.exists);
        w.bool(a.gift);
        w.i64(a.last_invoked);
    }

    save_fruits(&mut w, &game.fruits)?;

    w.magic(Magic::RNGS);
    let rng = game.rng.state();
    w.u64(rng.seed);
    w.u128(rng.word_pos);

    w.magic(Magic::MSGS);
    w.count(game.messages.len(), MSGHISTORY)?;
    for msg in &game.messages {
        w.str(msg)?;
    }

    tracing::info!(bytes = w.len(), levels = game.levels.len(), "game saved");
    Ok(w.into_bytes())
}

// ---------------------------------------------------------------------------
// dorecover
// ---------------------------------------------------------------------------

/// Rebuild a game from a save stream
pub fn dorecover(data: &[u8]) -> SaveResult<Recovery> {
    let _span = tracing::info_span!("dorecover", bytes = data.len()).entered();
    let mut r = SaveReader::new(data);

    let found = VersionInfo::read(&mut r)?;
    if !found.is_compatible() {
        return Ok(Recovery::Incompatible { found });
    }

    r.expect_magic(Magic::STAT)?;
    let moves = r.u64()?;
    let ident = r.u32()?;
    let flags = Flags::from_bits_truncate(r.u32()?);
    let current = read_dlevel(&mut r)?;

    let mut game = GameState::new(0);
    game.moves = moves;
    game.ident = ident;
    game.flags = flags;
    game.current = current;
    game.levels = LevelMap::new();
    game.you = restore_you(&mut r)?;

    let mut ctx = RestoreContext::new(moves);
    game.youmonst = restore_monster(&mut r, &mut ctx, &mut game, None)?;
    game.dungeons = restore_dungeons(&mut r)?;

    let n = r.count(MAX_LEVELS)?;
    for _ in 0..n {
        // The level names itself; peek it so getlev can check it
        let peek = SaveReader::new(&data[r.position()..]);
        let target = peek_level_id(peek)?;
        let level = getlev(&mut r, &mut ctx, &mut game, target)?;
        if game.levels.insert(target, level).is_some() {
            return Err(SaveError::corrupt(format!("level {target} saved twice")));
        }
    }

    ctx.clear_caches();
    let (mut timers, timer_next_id) = restore_timers(&mut r, &ctx)?;
    let mut lights = restore_light_sources(&mut r)?;

    r.expect_magic(Magic::INVT)?;
    game.inventory = restore_obj_chain(
        &mut r,
        &mut ctx,
        &mut game,
        ChainHome::detached(ObjectLocation::PlayerInventory),
    )?;
    r.expect_magic(Magic::OCLL)?;
    game.migrating_objects = restore_obj_chain(
        &mut r,
        &mut ctx,
        &mut game,
        ChainHome::detached(ObjectLocation::Migrating),
    )?;
    r.expect_magic(Magic::MMIG)?;
    game.migrating_monsters = restore_mon_chain(&mut r, &mut ctx, &mut game, None)?;

    {
        let game = &game;
        let objects = |raw: u32| {
            let id = ObjectId(raw);
            game.find_carried_object(id).is_some()
                || game
                    .migrating_monsters
                    .iter()
                    .any(|m| find_in_chain(&m.inventory, id).is_some())
                || game.levels.values().any(|l| l.find_object(id).is_some())
        };
        let monsters = |raw: u32| {
            let id = MonsterId(raw);
            game.migrating_monsters.iter().any(|m| m.id == id)
                || game.levels.values().any(|l| l.monster(id).is_some())
        };
        let scan = Scan {
            objects: &objects,
            monsters: &monsters,
        };
        relink_timers(&mut timers, &ctx, &scan)?;
        relink_light_sources(&mut lights, &ctx, &scan)?;
    }
    game.timers = into_queue(timers, timer_next_id)?;
    game.lights = lights;

    r.expect_magic(Magic::MVIT)?;
    let n = r.count(NUMMONS)?;
    game.mvitals = Vec::with_capacity(n);
    for _ in 0..n {
        game.mvitals.push(MonsterVitals {
            born: r.u8()?,
            died: r.u8()?,
            flags: VitalFlags::from_bits_truncate(r.u8()?),
        });
    }

    r.expect_magic(Magic::SPEL)?;
    let n = r.count(MAXSPELL)?;
    for _ in 0..n {
        game.you.known_spells.push(KnownSpell {
            spell_id: r.i16()?,
            level: r.i8()?,
            retention: r.i32()?,
        });
    }

    r.expect_magic(Magic::ARTI)?;
    let n = r.count(NROFARTIFACTS)?;
    let mut entries = Vec::with_capacity(n);
    for _ in 0..n {
        entries.push(ArtifactState {
            exists: r.bool()?,
            gift: r.bool()?,
            last_invoked: r.i64()?,
        });
    }
    game.artifacts = ArtifactTable { entries };

    game.fruits = restore_fruits(&mut r)?;

    r.expect_magic(Magic::RNGS)?;
    let seed = r.u64()?;
    let word_pos = r.u128()?;
    game.rng = GameRng::from_state(RngState { seed, word_pos });

    r.expect_magic(Magic::MSGS)?;
    let n = r.count(MSGHISTORY)?;
    for _ in 0..n {
        game.messages.push_back(r.str()?);
    }

    if !r.is_at_end() {
        return Err(SaveError::corrupt(format!(
            "{} trailing bytes after message history",
            data.len() - r.position()
        )));
    }

    {
        let inv = &game.inventory;
        let mig = &game.migrating_objects;
        let carried = |raw: u32| {
            let id = ObjectId(raw);
            find_in_chain(inv, id).is_some() || find_in_chain(mig, id).is_some()
        };
        for level in game.levels.values_mut() {
            link_bills(level, &carried);
        }
    }
    resolve_hero_links(&mut game)?;

    tracing::info!(moves = game.moves, levels = game.levels.len(), "game restored");
    Ok(Recovery::Restored(Box::new(game)))
}

/// Level id at the head of a `LEVL` record
fn peek_level_id(mut r: SaveReader<'_>) -> SaveResult<DLevel> {
    r.expect_magic(Magic::LEVL)?;
    read_dlevel(&mut r)
}

/// The monster the hero is stuck to or riding must be on the hero's level
fn resolve_hero_links(game: &mut GameState) -> SaveResult<()> {
    let level = game
        .levels
        .get(&game.current)
        .ok_or_else(|| SaveError::corrupt(format!("current level {} not saved", game.current)))?;
    let resolve = |r: Option<Reference<MonsterId>>| -> SaveResult<Option<Reference<MonsterId>>> {
        match r {
            None => Ok(None),
            Some(r) => {
                let id = MonsterId(r.raw_id());
                if level.monster(id).is_none() {
                    return Err(SaveError::missing("monster", id.0));
                }
                Ok(Some(Reference::Resolved(id)))
            }
        }
    };
    for link in game.you.monster_links_mut() {
        *link = resolve(*link)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dungeon_survives() {
        let mut w = SaveWriter::new();
        save_dungeons(&mut w, &DungeonSystem::standard()).unwrap();
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        assert_eq!(restore_dungeons(&mut r).unwrap(), DungeonSystem::standard());
    }

    #[test]
    fn test_stuck_to_absent_monster_is_fatal() {
        let mut game = GameState::new(1);
        game.you.stuck = Some(Reference::Unresolved(77));
        assert!(matches!(
            resolve_hero_links(&mut game),
            Err(SaveError::MissingReference { what: "monster", id: 77 })
        ));
    }
}
