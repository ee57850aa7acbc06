//! Monster chains (MCHN / MON\0)
//!
//! Each monster record is followed by its inventory chain. The wielded
//! weapon is not stored as an id; only whether there was one, and it is
//! found again by its worn bit after the inventory is read.

use nh_core::dungeon::DLevel;
use nh_core::monster::{
    peace_minded, shopkeeper_name_known, BillEntry, Monster, MonsterExtra, MonsterId,
    MonsterState, PriestData, ShopkeeperData,
};
use nh_core::{GameState, Reference};

use crate::context::RestoreContext;
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::magic::Magic;
use crate::object::{restore_obj_chain, save_obj_chain, ChainHome, MAX_CHAIN};

const MAX_BILL: usize = 200;

mod bits {
    pub const PEACEFUL: u32 = 1 << 0;
    pub const SLEEPING: u32 = 1 << 1;
    pub const FLEEING: u32 = 1 << 2;
    pub const CAN_MOVE: u32 = 1 << 3;
    pub const INVISIBLE: u32 = 1 << 4;
    pub const HIDING: u32 = 1 << 5;
    pub const CANCELLED: u32 = 1 << 6;
    pub const TRAPPED: u32 = 1 << 7;
    pub const FEMALE: u32 = 1 << 8;
    pub const ALWAYS_HOSTILE: u32 = 1 << 9;
    pub const ALWAYS_PEACEFUL: u32 = 1 << 10;
}

fn pack_state(s: &MonsterState) -> u32 {
    [
        (s.peaceful, bits::PEACEFUL),
        (s.sleeping, bits::SLEEPING),
        (s.fleeing, bits::FLEEING),
        (s.can_move, bits::CAN_MOVE),
        (s.invisible, bits::INVISIBLE),
        (s.hiding, bits::HIDING),
        (s.cancelled, bits::CANCELLED),
        (s.trapped, bits::TRAPPED),
        (s.female, bits::FEMALE),
        (s.always_hostile, bits::ALWAYS_HOSTILE),
        (s.always_peaceful, bits::ALWAYS_PEACEFUL),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .fold(0, |acc, (_, bit)| acc | bit)
}

fn unpack_state(f: u32, tame: u8) -> MonsterState {
    MonsterState {
        peaceful: f & bits::PEACEFUL != 0,
        tame,
        sleeping: f & bits::SLEEPING != 0,
        fleeing: f & bits::FLEEING != 0,
        can_move: f & bits::CAN_MOVE != 0,
        invisible: f & bits::INVISIBLE != 0,
        hiding: f & bits::HIDING != 0,
        cancelled: f & bits::CANCELLED != 0,
        trapped: f & bits::TRAPPED != 0,
        female: f & bits::FEMALE != 0,
        always_hostile: f & bits::ALWAYS_HOSTILE != 0,
        always_peaceful: f & bits::ALWAYS_PEACEFUL != 0,
    }
}

pub(crate) fn write_dlevel(w: &mut SaveWriter, d: DLevel) {
    w.i8(d.dungeon_num);
    w.i8(d.level_num);
}

pub(crate) fn read_dlevel(r: &mut SaveReader<'_>) -> SaveResult<DLevel> {
    Ok(DLevel::new(r.i8()?, r.i8()?))
}

fn write_pos(w: &mut SaveWriter, (x, y): (i8, i8)) {
    w.i8(x);
    w.i8(y);
}

fn read_pos(r: &mut SaveReader<'_>) -> SaveResult<(i8, i8)> {
    Ok((r.i8()?, r.i8()?))
}

fn save_extra(w: &mut SaveWriter, extra: &MonsterExtra) -> SaveResult<()> {
    w.u8(extra.tag());
    match extra {
        MonsterExtra::None => {}
        MonsterExtra::Shopkeeper(shk) => {
            w.str(&shk.shk_name)?;
            w.u8(shk.shop_type);
            w.u8(shk.shop_room);
            write_dlevel(w, shk.shop_level);
            write_pos(w, shk.shk_pos);
            write_pos(w, shk.shop_door);
            w.count(shk.bill.len(), MAX_BILL)?;
            for entry in &shk.bill {
                w.u32(entry.object.raw_id());
                w.i32(entry.price);
                w.i32(entry.quantity);
                w.bool(entry.used_up);
            }
            w.i64(shk.credit);
            w.i64(shk.debit);
            w.i64(shk.robbed);
            w.bool(shk.following);
            w.bool(shk.surcharge);
        }
        MonsterExtra::Priest(pri) => {
            w.i8(pri.shrine_align);
            w.u8(pri.shrine_room);
            write_pos(w, pri.shrine_pos);
            write_dlevel(w, pri.shrine_level);
        }
        MonsterExtra::Minion { align } => w.i8(*align),
    }
    Ok(())
}

fn restore_extra(r: &mut SaveReader<'_>) -> SaveResult<MonsterExtra> {
    let tag = r.u8()?;
    Ok(match tag {
        0 => MonsterExtra::None,
        1 => {
            let shk_name = r.str()?;
            let shop_type = r.u8()?;
            let shop_room = r.u8()?;
            let shop_level = read_dlevel(r)?;
            let shk_pos = read_pos(r)?;
            let shop_door = read_pos(r)?;
            let n = r.count(MAX_BILL)?;
            let mut bill = Vec::with_capacity(n);
            for _ in 0..n {
                bill.push(BillEntry {
                    object: Reference::Unresolved(r.u32()?),
                    price: r.i32()?,
                    quantity: r.i32()?,
                    used_up: r.bool()?,
                });
            }
            MonsterExtra::Shopkeeper(ShopkeeperData {
                shk_name,
                shop_type,
                shop_room,
                shop_level,
                shk_pos,
                shop_door,
                bill,
                credit: r.i64()?,
                debit: r.i64()?,
                robbed: r.i64()?,
                following: r.bool()?,
                surcharge: r.bool()?,
            })
        }
        2 => MonsterExtra::Priest(PriestData {
            shrine_align: r.i8()?,
            shrine_room: r.u8()?,
            shrine_pos: read_pos(r)?,
            shrine_level: read_dlevel(r)?,
        }),
        3 => MonsterExtra::Minion { align: r.i8()? },
        _ => return Err(SaveError::corrupt(format!("monster extension tag {tag}"))),
    })
}

/// Write one monster record followed by its inventory
pub fn save_monster(w: &mut SaveWriter, mon: &Monster) -> SaveResult<()> {
    w.magic(Magic::MON);
    w.u32(mon.id.0);
    w.i16(mon.monster_type);
    w.i8(mon.x);
    w.i8(mon.y);
    w.u8(mon.level);
    w.i8(mon.alignment);
    w.i32(mon.malign);
    w.i32(mon.hp);
    w.i32(mon.hp_max);
    w.u32(pack_state(&mon.state));
    w.u8(mon.state.tame);
    w.u8(mon.wormno);
    w.i64(mon.last_move);
    w.opt_str(mon.name.as_deref())?;
    w.bool(mon.weapon.is_some());
    w.bool(mon.migrating_to.is_some());
    write_dlevel(w, mon.migrating_to.unwrap_or_default());
    save_extra(w, &mon.extra)?;
    save_obj_chain(w, &mon.inventory)
}

pub fn save_mon_chain(w: &mut SaveWriter, chain: &[Monster]) -> SaveResult<()> {
    w.magic(Magic::MCHN);
    w.count(chain.len(), MAX_CHAIN)?;
    for mon in chain {
        save_monster(w, mon)?;
    }
    Ok(())
}

/// Read one monster record and its inventory.
///
/// `home` is the level the monster now lives on, or `None` for monsters
/// in transit.
pub fn restore_monster(
    r: &mut SaveReader<'_>,
    ctx: &mut RestoreContext,
    game: &mut GameState,
    home: Option<DLevel>,
) -> SaveResult<Monster> {
    r.expect_magic(Magic::MON)?;
    let mut mon = Monster {
        id: MonsterId(r.u32()?),
        monster_type: r.i16()?,
        x: r.i8()?,
        y: r.i8()?,
        level: r.u8()?,
        alignment: r.i8()?,
        malign: r.i32()?,
        hp: r.i32()?,
        hp_max: r.i32()?,
        ..Monster::default()
    };
    let state = r.u32()?;
    let tame = r.u8()?;
    mon.state = unpack_state(state, tame);
    mon.wormno = r.u8()?;
    mon.last_move = r.i64()?;
    mon.name = r.opt_str()?;
    let had_weapon = r.bool()?;
    let migrating = r.bool()?;
    let dest = read_dlevel(r)?;
    mon.migrating_to = migrating.then_some(dest);
    mon.extra = restore_extra(r)?;

    if ctx.ghostly {
        let nid = game.next_ident();
        ctx.idmap.add(mon.id.0, nid);
        mon.id = MonsterId(nid);
    }
    ctx.monsters.insert(mon.id.0, ());

    mon.inventory = restore_obj_chain(r, ctx, game, ChainHome::carried_by(mon.id, home))?;

    if had_weapon {
        mon.weapon = mon.find_wielded();
        if mon.weapon.is_none() {
            tracing::warn!(monster = mon.id.0, "wielded weapon missing from inventory");
        }
    }

    if ctx.ghostly {
        rehome_ghost_monster(&mut mon, game, home);
    }
    check_shopkeeper_name(&mon);
    Ok(mon)
}

/// Fit a bones monster to the current hero and level
fn rehome_ghost_monster(mon: &mut Monster, game: &mut GameState, home: Option<DLevel>) {
    let hero = game.you.alignment;
    if mon.is_tame() {
        // The dead hero's pets do not recognise the new one
        mon.state.tame = 0;
        mon.state.peaceful = false;
    } else if !mon.is_shopkeeper() {
        mon.state.peaceful = peace_minded(mon, hero.typ, hero.record, &mut game.rng);
    }
    mon.set_malign(hero.typ);

    match &mut mon.extra {
        MonsterExtra::Shopkeeper(shk) => {
            // Bill ids are remapped once the level's bill chain is read
            if let Some(level) = home {
                shk.shop_level = level;
            }
        }
        MonsterExtra::Priest(pri) => {
            if let Some(level) = home {
                pri.shrine_level = level;
            }
        }
        _ => {}
    }
}

fn check_shopkeeper_name(mon: &Monster) {
    if let MonsterExtra::Shopkeeper(shk) = &mon.extra {
        if !shopkeeper_name_known(shk.shop_type, &shk.shk_name) {
            tracing::warn!(
                name = %shk.shk_name,
                shop_type = shk.shop_type,
                "shopkeeper name not in dialogue table"
            );
        }
    }
}

pub fn restore_mon_chain(
    r: &mut SaveReader<'_>,
    ctx: &mut RestoreContext,
    game: &mut GameState,
    home: Option<DLevel>,
) -> SaveResult<Vec<Monster>> {
    r.expect_magic(Magic::MCHN)?;
    let n = r.count(MAX_CHAIN)?;
    let mut chain = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        chain.push(restore_monster(r, ctx, game, home)?);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nh_core::object::{FruitTable, Object, ObjectClass, ObjectId, WornMask};
    use nh_core::player::AlignmentType;

    fn roundtrip(
        chain: &[Monster],
        ctx: &mut RestoreContext,
        game: &mut GameState,
    ) -> Vec<Monster> {
        let mut w = SaveWriter::new();
        save_mon_chain(&mut w, chain).unwrap();
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        let out = restore_mon_chain(&mut r, ctx, game, Some(DLevel::new(0, 6))).unwrap();
        assert!(r.is_at_end());
        out
    }

    fn armed_soldier(id: u32) -> Monster {
        let mut mon = Monster::new(MonsterId(id), 280, 12, 7);
        let mut spear = Object::new(ObjectId(id + 100), 40, ObjectClass::Weapon);
        spear.worn_mask = WornMask::WEAPON;
        spear.olev = Some(DLevel::new(0, 6));
        mon.add_to_inventory(spear);
        mon.inventory[0].olev = Some(DLevel::new(0, 6));
        mon.weapon = Some(ObjectId(id + 100));
        mon
    }

    #[test]
    fn test_weapon_relinked_from_worn_bit() {
        let chain = vec![armed_soldier(3)];
        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::new(50);
        let out = roundtrip(&chain, &mut ctx, &mut game);
        assert_eq!(out, chain);
        assert_eq!(out[0].weapon, Some(ObjectId(103)));
    }

    #[test]
    fn test_missing_weapon_degrades_to_unarmed() {
        let mut mon = armed_soldier(3);
        mon.inventory[0].worn_mask = WornMask::empty();
        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::new(50);
        let out = roundtrip(&[mon], &mut ctx, &mut game);
        assert_eq!(out[0].weapon, None);
    }

    #[test]
    fn test_ghost_pet_turns_hostile_and_gets_new_ids() {
        let mut pet = armed_soldier(3);
        pet.state.tame = 10;
        pet.state.peaceful = true;

        let mut game = GameState::new(1);
        game.ident = 60;
        game.you.alignment.typ = AlignmentType::Lawful;
        let mut ctx = RestoreContext::ghost(50, FruitTable::new());
        let out = roundtrip(&[pet], &mut ctx, &mut game);

        assert_eq!(out[0].id, MonsterId(61));
        assert_eq!(out[0].inventory[0].id, ObjectId(62));
        assert_eq!(out[0].inventory[0].carrier, Some(MonsterId(61)));
        assert_eq!(out[0].weapon, Some(ObjectId(62)));
        assert!(!out[0].is_tame());
        assert!(!out[0].state.peaceful);
        assert_eq!(ctx.idmap.lookup(3), Some(61));
    }

    #[test]
    fn test_ghost_shopkeeper_rehomed() {
        let mut shk = Monster::new(MonsterId(9), 270, 20, 4);
        shk.state.peaceful = true;
        shk.extra = MonsterExtra::Shopkeeper(ShopkeeperData {
            shk_name: "Izchak".into(),
            shop_type: 10,
            shop_room: 3,
            shop_level: DLevel::new(0, 2),
            shk_pos: (20, 4),
            shop_door: (21, 4),
            bill: vec![BillEntry {
                object: Reference::Unresolved(11),
                price: 10,
                quantity: 1,
                used_up: false,
            }],
            credit: 0,
            debit: 0,
            robbed: 0,
            following: false,
            surcharge: false,
        });

        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::ghost(50, FruitTable::new());
        let out = roundtrip(&[shk], &mut ctx, &mut game);

        let MonsterExtra::Shopkeeper(data) = &out[0].extra else {
            panic!("shopkeeper extension lost");
        };
        assert_eq!(data.shop_level, DLevel::new(0, 6));
        assert_eq!(data.bill[0].object, Reference::Unresolved(11));
        // Shopkeepers keep their own peacefulness
        assert!(out[0].state.peaceful);
    }

    #[test]
    fn test_unknown_extension_tag_is_corrupt() {
        let mut w = SaveWriter::new();
        save_monster(&mut w, &Monster::new(MonsterId(1), 1, 1, 1)).unwrap();
        let mut bytes = w.into_bytes();
        // Tag byte sits just before the inventory chain tag and its count
        let tag_at = bytes.len() - 9;
        bytes[tag_at] = 9;

        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::new(1);
        let mut r = SaveReader::new(&bytes);
        assert!(matches!(
            restore_monster(&mut r, &mut ctx, &mut game, None),
            Err(SaveError::Corrupt(_))
        ));
    }
}
