//! Whole-level persistence (savelev / getlev)
//!
//! Sections are written and read in one fixed order. Timers and light
//! sources come before the chains they point into, so they are relinked
//! at the very end, once everything on the level exists.

use hashbrown::HashSet;
use nh_core::dungeon::{
    BranchType, Cell, CellType, DLevel, DestArea, Engraving, EngravingType, Level, LevelFlags,
    Region, RegionType, Room, RoomType, Stairway, TerrainDamage, Trap, TrapType,
};
use nh_core::monster::{MonsterExtra, MonsterId, Worm, WormSegment};
use nh_core::object::{ObjectId, ObjectLocation};
use nh_core::{
    GameState, Reference, COLNO, MAXNROFROOMS, MAX_NUM_WORMS, MAX_REGIONS, MAX_SUBROOMS, ROWNO,
};

use crate::context::{Range, RestoreContext, SaveContext};
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::light::{relink_light_sources, restore_light_sources, save_light_sources};
use crate::magic::Magic;
use crate::monster::{read_dlevel, restore_mon_chain, save_mon_chain, write_dlevel};
use crate::object::{restore_obj_chain, save_obj_chain, ChainHome, MAX_CHAIN};
use crate::relink::Scan;
use crate::timer::{into_queue, relink_timers, restore_timers, save_timers};

const MAX_ROOMS: usize = MAXNROFROOMS + MAX_SUBROOMS;
const MAX_DOORS: usize = 120;
const MAX_STAIRS: usize = 8;
const MAX_TRAPS: usize = COLNO * ROWNO;
const MAX_SEGMENTS: usize = COLNO * ROWNO;

fn unpack_cell(bits: u32, glyph: i32) -> SaveResult<Cell> {
    Cell::from_packed(bits, glyph).map_err(|code| SaveError::corrupt(format!("terrain type {code}")))
}

fn pack_level_flags(f: &LevelFlags) -> u32 {
    [
        f.has_shop,
        f.has_vault,
        f.has_zoo,
        f.has_court,
        f.has_morgue,
        f.has_beehive,
        f.has_barracks,
        f.has_temple,
        f.has_swamp,
        f.no_teleport,
        f.hard_floor,
        f.no_magic_map,
        f.hero_memory,
        f.shortsighted,
        f.graveyard,
        f.is_maze,
        f.is_cavernous,
        f.arboreal,
        f.corridor_maze,
    ]
    .into_iter()
    .enumerate()
    .fold(0, |acc, (i, on)| acc | (on as u32) << i)
}

fn unpack_level_flags(fountain_count: u8, sink_count: u8, bits: u32) -> LevelFlags {
    let on = |i: u32| bits & 1 << i != 0;
    LevelFlags {
        fountain_count,
        sink_count,
        has_shop: on(0),
        has_vault: on(1),
        has_zoo: on(2),
        has_court: on(3),
        has_morgue: on(4),
        has_beehive: on(5),
        has_barracks: on(6),
        has_temple: on(7),
        has_swamp: on(8),
        no_teleport: on(9),
        hard_floor: on(10),
        no_magic_map: on(11),
        hero_memory: on(12),
        shortsighted: on(13),
        graveyard: on(14),
        is_maze: on(15),
        is_cavernous: on(16),
        arboreal: on(17),
        corridor_maze: on(18),
    }
}

fn write_dest(w: &mut SaveWriter, d: &DestArea) {
    for v in [d.lx, d.ly, d.hx, d.hy, d.nlx, d.nly, d.nhx, d.nhy] {
        w.i8(v);
    }
}

fn read_dest(r: &mut SaveReader<'_>) -> SaveResult<DestArea> {
    Ok(DestArea {
        lx: r.i8()?,
        ly: r.i8()?,
        hx: r.i8()?,
        hy: r.i8()?,
        nlx: r.i8()?,
        nly: r.i8()?,
        nhx: r.i8()?,
        nhy: r.i8()?,
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Timers and lights in this level's local range, in queue order
fn local_sections<'a>(
    level: &'a Level,
    ctx: &SaveContext<'a>,
) -> (Vec<&'a nh_core::world::Timer>, Vec<&'a nh_core::world::LightSource>) {
    let adopt = ctx.adopts(level.dlevel);
    let mut timers: Vec<_> = level
        .timers
        .iter()
        .filter(|t| ctx.timer_range(t) == Range::Local)
        .collect();
    let mut lights: Vec<_> = level
        .lights
        .iter()
        .filter(|l| ctx.light_range(l) == Range::Local)
        .collect();
    if adopt {
        if let Some(carried) = ctx.carried_timers {
            timers.extend(carried.iter().filter(|t| ctx.timer_range(t) == Range::Local));
        }
        lights.extend(
            ctx.carried_lights
                .iter()
                .filter(|l| ctx.light_range(l) == Range::Local),
        );
    }
    // Stable: ties keep queue order, level entries first
    timers.sort_by_key(|t| t.fire_at);
    (timers, lights)
}

/// Write one level
pub fn savelev(w: &mut SaveWriter, level: &Level, ctx: &SaveContext<'_>) -> SaveResult<()> {
    tracing::debug!(level = %level.dlevel, "saving level");
    w.magic(Magic::LEVL);
    write_dlevel(w, level.dlevel);
    w.i32(ctx.dungeons.ledger_no(&level.dlevel).unwrap_or(-1));
    w.u64(level.last_moves);

    for column in &level.cells {
        for cell in column {
            w.u32(cell.packed());
            w.i32(cell.glyph);
        }
    }
    w.u8(level.flags.fountain_count);
    w.u8(level.flags.sink_count);
    w.u32(pack_level_flags(&level.flags));

    w.magic(Magic::STRS);
    w.count(level.stairs.len(), MAX_STAIRS)?;
    for s in &level.stairs {
        w.i8(s.x);
        w.i8(s.y);
        write_dlevel(w, s.destination);
        w.bool(s.up);
        w.bool(s.ladder);
        w.bool(s.branch);
    }
    write_dest(w, &level.up_dest);
    write_dest(w, &level.down_dest);

    w.magic(Magic::ROOM);
    w.count(level.rooms.len(), MAX_ROOMS)?;
    for room in &level.rooms {
        let b = room.bounds;
        for v in [b.lx, b.hx, b.ly, b.hy] {
            w.i8(v);
        }
        w.u8(room.room_type as u8);
        w.bool(room.lit);
        w.u8(room.first_door);
        w.u8(room.door_count);
        w.bool(room.irregular);
        w.bool(room.needs_fill);
    }
    w.count(level.doors.len(), MAX_DOORS)?;
    for &(x, y) in &level.doors {
        w.i8(x);
        w.i8(y);
    }

    let (timers, lights) = local_sections(level, ctx);
    save_timers(w, level.timers.next_id(), &timers)?;
    save_light_sources(w, &lights)?;

    save_mon_chain(w, &level.monsters)?;

    w.magic(Magic::WORM);
    if level.worms.len() != MAX_NUM_WORMS {
        return Err(SaveError::unsavable(
            Magic::WORM.name(),
            format!("{} worm slots (need {MAX_NUM_WORMS})", level.worms.len()),
        ));
    }
    for worm in &level.worms {
        w.i64(worm.grow_time);
        w.count(worm.segments.len(), MAX_SEGMENTS)?;
        for seg in &worm.segments {
            w.i8(seg.x);
            w.i8(seg.y);
        }
    }

    w.magic(Magic::TRPS);
    w.count(level.traps.len(), MAX_TRAPS)?;
    for trap in &level.traps {
        w.i8(trap.x);
        w.i8(trap.y);
        w.u8(trap.trap_type as u8);
        w.bool(trap.seen);
        w.bool(trap.once);
        w.bool(trap.madeby_u);
        w.i8(trap.launch.0);
        w.i8(trap.launch.1);
        write_dlevel(w, trap.dst);
    }

    save_obj_chain(w, &level.objects)?;
    save_obj_chain(w, &level.buried_objects)?;
    save_obj_chain(w, &level.bill_objects)?;

    w.magic(Magic::ENGR);
    w.count(level.engravings.len(), MAX_TRAPS)?;
    for engr in &level.engravings {
        w.i8(engr.x);
        w.i8(engr.y);
        w.str(&engr.text)?;
        w.u8(engr.engr_type as u8);
        w.i64(engr.time);
    }

    w.magic(Magic::DMGE);
    w.count(level.damage.len(), MAX_TRAPS)?;
    for d in &level.damage {
        w.u64(d.when);
        w.i64(d.cost);
        w.i8(d.x);
        w.i8(d.y);
        w.u8(d.typ as u8);
    }

    w.magic(Magic::REGI);
    w.count(level.regions.len(), MAX_REGIONS)?;
    for reg in &level.regions {
        w.magic(Magic::RDAT);
        w.u8(reg.region_type as u8);
        let b = reg.bounds;
        for v in [b.lx, b.ly, b.hx, b.hy] {
            w.i8(v);
        }
        w.u32(reg.turns_remaining);
        w.i32(reg.damage);
        w.bool(reg.visible);
        w.bool(reg.player_created);
        w.bool(reg.player_inside);
        w.count(reg.monsters.len(), MAX_CHAIN)?;
        for m in &reg.monsters {
            w.u32(m.raw_id());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn check_level_identity(
    game: &GameState,
    ctx: &RestoreContext,
    stored: DLevel,
    stored_ledger: i32,
    target: DLevel,
) -> SaveResult<()> {
    if ctx.ghostly {
        let expected = game.dungeons.ledger_no(&target);
        if stored.dungeon_num != target.dungeon_num || expected != Some(stored_ledger) {
            return Err(SaveError::corrupt(format!(
                "bones level {stored} (ledger {stored_ledger}) cannot be loaded as {target}"
            )));
        }
    } else if stored != target {
        return Err(SaveError::corrupt(format!(
            "expected level {target}, stream holds {stored}"
        )));
    } else if game.dungeons.ledger_no(&stored).unwrap_or(-1) != stored_ledger {
        return Err(SaveError::corrupt(format!(
            "level {stored} saved with ledger {stored_ledger}"
        )));
    }
    Ok(())
}

fn read_stairs(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::STRS)?;
    let n = r.count(MAX_STAIRS)?;
    for _ in 0..n {
        level.stairs.push(Stairway {
            x: r.i8()?,
            y: r.i8()?,
            destination: read_dlevel(r)?,
            up: r.bool()?,
            ladder: r.bool()?,
            branch: r.bool()?,
        });
    }
    level.up_dest = read_dest(r)?;
    level.down_dest = read_dest(r)?;
    Ok(())
}

fn read_rooms(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::ROOM)?;
    let n = r.count(MAX_ROOMS)?;
    for _ in 0..n {
        let (lx, hx, ly, hy) = (r.i8()?, r.i8()?, r.i8()?, r.i8()?);
        let rtype = r.u8()?;
        let room_type = RoomType::from_repr(rtype)
            .ok_or_else(|| SaveError::corrupt(format!("room type {rtype}")))?;
        let mut room = Room::new(lx, ly, hx, hy, room_type);
        room.lit = r.bool()?;
        room.first_door = r.u8()?;
        room.door_count = r.u8()?;
        room.irregular = r.bool()?;
        room.needs_fill = r.bool()?;
        level.rooms.push(room);
    }
    let n = r.count(MAX_DOORS)?;
    for _ in 0..n {
        level.doors.push((r.i8()?, r.i8()?));
    }
    Ok(())
}

fn read_worms(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::WORM)?;
    let mut worms = Vec::with_capacity(MAX_NUM_WORMS);
    for _ in 0..MAX_NUM_WORMS {
        let grow_time = r.i64()?;
        let n = r.count(MAX_SEGMENTS)?;
        let mut segments = Vec::with_capacity(n);
        for _ in 0..n {
            segments.push(WormSegment {
                x: r.i8()?,
                y: r.i8()?,
            });
        }
        worms.push(Worm {
            segments,
            grow_time,
        });
    }
    level.worms = worms;
    Ok(())
}

fn read_traps(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::TRPS)?;
    let n = r.count(MAX_TRAPS)?;
    for _ in 0..n {
        let (x, y) = (r.i8()?, r.i8()?);
        let ttyp = r.u8()?;
        let trap_type = TrapType::from_repr(ttyp)
            .ok_or_else(|| SaveError::corrupt(format!("trap type {ttyp}")))?;
        let mut trap = Trap::new(x, y, trap_type);
        trap.seen = r.bool()?;
        trap.once = r.bool()?;
        trap.madeby_u = r.bool()?;
        trap.launch = (r.i8()?, r.i8()?);
        trap.dst = read_dlevel(r)?;
        level.traps.push(trap);
    }
    Ok(())
}

fn read_engravings(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::ENGR)?;
    let n = r.count(MAX_TRAPS)?;
    for _ in 0..n {
        let (x, y) = (r.i8()?, r.i8()?);
        let text = r.str()?;
        let etyp = r.u8()?;
        let engr_type = EngravingType::from_repr(etyp)
            .ok_or_else(|| SaveError::corrupt(format!("engraving type {etyp}")))?;
        let mut engr = Engraving::new(x, y, text, engr_type);
        engr.time = r.i64()?;
        level.engravings.push(engr);
    }
    Ok(())
}

fn read_damage(r: &mut SaveReader<'_>, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::DMGE)?;
    let n = r.count(MAX_TRAPS)?;
    for _ in 0..n {
        let when = r.u64()?;
        let cost = r.i64()?;
        let (x, y) = (r.i8()?, r.i8()?);
        let typ = r.u8()?;
        let typ = CellType::from_repr(typ)
            .ok_or_else(|| SaveError::corrupt(format!("damaged terrain type {typ}")))?;
        level.damage.push(TerrainDamage {
            when,
            cost,
            x,
            y,
            typ,
        });
    }
    Ok(())
}

/// Regions; occupants that no longer exist are dropped
fn read_regions(r: &mut SaveReader<'_>, ctx: &RestoreContext, level: &mut Level) -> SaveResult<()> {
    r.expect_magic(Magic::REGI)?;
    let n = r.count(MAX_REGIONS)?;
    for _ in 0..n {
        r.expect_magic(Magic::RDAT)?;
        let rtyp = r.u8()?;
        let region_type = RegionType::from_repr(rtyp)
            .ok_or_else(|| SaveError::corrupt(format!("region type {rtyp}")))?;
        let (x1, y1, x2, y2) = (r.i8()?, r.i8()?, r.i8()?, r.i8()?);
        let mut reg = Region::new(region_type, x1, y1, x2, y2, r.u32()?);
        reg.damage = r.i32()?;
        reg.visible = r.bool()?;
        reg.player_created = r.bool()?;
        reg.player_inside = r.bool()?;
        let count = r.count(MAX_CHAIN)?;
        for _ in 0..count {
            let raw = r.u32()?;
            let raw = if ctx.ghostly { ctx.idmap.lookup(raw) } else { Some(raw) };
            match raw.filter(|&id| level.monster(MonsterId(id)).is_some()) {
                Some(id) => reg.monsters.push(Reference::Resolved(MonsterId(id))),
                None => tracing::debug!(region = level.regions.len(), "dropping region occupant"),
            }
        }
        level.regions.push(reg);
    }
    Ok(())
}

/// Point bones shop bills at the new object ids; entries for objects that
/// did not come along are dropped
fn remap_ghost_bills(level: &mut Level, ctx: &RestoreContext) {
    for mon in &mut level.monsters {
        if let MonsterExtra::Shopkeeper(shk) = &mut mon.extra {
            shk.bill.retain_mut(|entry| match ctx.idmap.lookup(entry.object.raw_id()) {
                Some(nid) => {
                    entry.object = Reference::Unresolved(nid);
                    true
                }
                None => {
                    tracing::debug!(old = entry.object.raw_id(), "dropping bill entry");
                    false
                }
            });
        }
    }
}

/// Patch a bones level into this game's dungeon layout
fn ghost_fixups(game: &mut GameState, level: &mut Level) -> SaveResult<()> {
    let here = level.dlevel;
    match game.dungeons.branch_at(&here).cloned() {
        Some(branch) if branch.branch_type == BranchType::Portal => {
            let dest = branch.other_end(&here);
            let portal = level
                .traps
                .iter_mut()
                .find(|t| t.trap_type == TrapType::MagicPortal)
                .ok_or_else(|| SaveError::corrupt("need portal but none found"))?;
            portal.dst = dest;
        }
        Some(branch) => {
            let dest = branch.other_end(&here);
            match level.branch_stairs_mut() {
                Some(stairs) => stairs.destination = dest,
                None => tracing::warn!(level = %here, "branch level has no branch stairs"),
            }
        }
        None => {
            let before = level.traps.len();
            level.traps.retain(|t| t.trap_type != TrapType::MagicPortal);
            if level.traps.len() != before {
                tracing::debug!(level = %here, "removed dangling magic portal");
            }
        }
    }

    if game.dungeons.between_medusa_and_castle(&here) && level.find_downstairs().is_none() {
        match level.random_room_spot(&mut game.rng) {
            Some((x, y)) => {
                let below = here.below();
                level.make_stairs(x, y, false, below);
                tracing::info!(level = %here, x, y, "added missing downstairs");
            }
            None => tracing::warn!(level = %here, "no room for forced downstairs"),
        }
    }
    Ok(())
}

/// Read one level as `target`.
///
/// On a ghost load every object and monster gets a fresh id and the
/// level is fitted to this game's dungeon; the id map is emptied before
/// returning.
pub fn getlev(
    r: &mut SaveReader<'_>,
    ctx: &mut RestoreContext,
    game: &mut GameState,
    target: DLevel,
) -> SaveResult<Level> {
    r.expect_magic(Magic::LEVL)?;
    let stored = read_dlevel(r)?;
    let stored_ledger = r.i32()?;
    let last_moves = r.u64()?;
    check_level_identity(game, ctx, stored, stored_ledger, target)?;
    tracing::debug!(level = %target, ghostly = ctx.ghostly, "restoring level");

    ctx.clear_caches();
    ctx.omoves = last_moves;
    let mut level = Level::new(target);
    level.last_moves = if ctx.ghostly { ctx.moves } else { last_moves };

    for x in 0..COLNO {
        for y in 0..ROWNO {
            let bits = r.u32()?;
            let glyph = r.i32()?;
            level.cells[x][y] = unpack_cell(bits, glyph)?;
        }
    }
    let fountains = r.u8()?;
    let sinks = r.u8()?;
    level.flags = unpack_level_flags(fountains, sinks, r.u32()?);

    read_stairs(r, &mut level)?;
    read_rooms(r, &mut level)?;

    let (mut timers, timer_next_id) = restore_timers(r, ctx)?;
    let mut lights = restore_light_sources(r)?;

    level.monsters = restore_mon_chain(r, ctx, game, Some(target))?;
    read_worms(r, &mut level)?;
    read_traps(r, &mut level)?;

    level.objects =
        restore_obj_chain(r, ctx, game, ChainHome::on_level(ObjectLocation::Floor, target))?;
    level.buried_objects =
        restore_obj_chain(r, ctx, game, ChainHome::on_level(ObjectLocation::Buried, target))?;
    level.bill_objects =
        restore_obj_chain(r, ctx, game, ChainHome::on_level(ObjectLocation::OnBill, target))?;
    read_engravings(r, &mut level)?;

    for id in level.rebuild_indices() {
        tracing::warn!(monster = id.0, level = %target, "monster placed on an occupied square");
    }

    read_damage(r, &mut level)?;
    read_regions(r, ctx, &mut level)?;

    if ctx.ghostly {
        remap_ghost_bills(&mut level, ctx);
        ghost_fixups(game, &mut level)?;
    }

    {
        let objects = |raw: u32| level.find_object(ObjectId(raw)).is_some();
        let monsters = |raw: u32| level.monster(MonsterId(raw)).is_some();
        let scan = Scan {
            objects: &objects,
            monsters: &monsters,
        };
        relink_timers(&mut timers, ctx, &scan)?;
        relink_light_sources(&mut lights, ctx, &scan)?;
    }
    level.timers = into_queue(timers, timer_next_id)?;
    level.lights = lights;

    ctx.idmap.clear();
    Ok(level)
}

/// Resolve shop bill entries against the level and whatever the hero
/// carries; entries naming nothing are dropped
pub fn link_bills(level: &mut Level, carried: &dyn Fn(u32) -> bool) {
    let wanted: Vec<u32> = level
        .monsters
        .iter()
        .filter_map(|m| match &m.extra {
            MonsterExtra::Shopkeeper(shk) => Some(shk.bill.iter().map(|e| e.object.raw_id())),
            _ => None,
        })
        .flatten()
        .collect();
    let present: HashSet<u32> = wanted
        .into_iter()
        .filter(|&raw| level.find_object(ObjectId(raw)).is_some() || carried(raw))
        .collect();

    for mon in &mut level.monsters {
        if let MonsterExtra::Shopkeeper(shk) = &mut mon.extra {
            shk.bill.retain_mut(|entry| {
                let raw = entry.object.raw_id();
                if present.contains(&raw) {
                    entry.object = Reference::Resolved(ObjectId(raw));
                    true
                } else {
                    tracing::debug!(object = raw, "bill entry names no object");
                    false
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_bits_survive_packing() {
        let mut cell = Cell::floor();
        cell.seen_from = 0xa5;
        cell.flags = 0x2c;
        cell.room_number = 37;
        cell.explored = true;
        cell.horizontal = true;
        cell.glyph = -12;
        let back = unpack_cell(cell.packed(), cell.glyph).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn test_unknown_terrain_is_corrupt() {
        assert!(matches!(unpack_cell(63, 0), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn test_level_flags_packing() {
        let flags = LevelFlags {
            fountain_count: 2,
            has_temple: true,
            graveyard: true,
            corridor_maze: true,
            ..LevelFlags::default()
        };
        let bits = pack_level_flags(&flags);
        assert_eq!(unpack_level_flags(2, 0, bits), flags);
        assert_eq!(bits.count_ones(), 3);
    }
}
