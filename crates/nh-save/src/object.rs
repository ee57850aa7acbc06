//! Object chains (OCHN / OBJ\0)
//!
//! A chain is its tag, a count, then each object. An object whose contents
//! are non-empty is followed directly by its contents chain, so containers
//! nest depth-first in pre-order.

use nh_core::dungeon::DLevel;
use nh_core::monster::MonsterId;
use nh_core::object::{
    age_is_relative, BucStatus, Object, ObjectClass, ObjectId, ObjectLocation, WornMask,
    SLIME_MOLD,
};
use nh_core::GameState;

use crate::context::RestoreContext;
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::magic::Magic;

/// Objects a single chain may hold before the stream is assumed garbage
pub const MAX_CHAIN: usize = 1 << 20;

/// Packed object flag bits
mod bits {
    pub const KNOWN: u32 = 1 << 0;
    pub const DESC_KNOWN: u32 = 1 << 1;
    pub const BUC_KNOWN: u32 = 1 << 2;
    pub const RUST_KNOWN: u32 = 1 << 3;
    pub const EROSION_PROOF: u32 = 1 << 4;
    pub const LOCKED: u32 = 1 << 5;
    pub const BROKEN: u32 = 1 << 6;
    pub const TRAPPED: u32 = 1 << 7;
    pub const LIT: u32 = 1 << 8;
    pub const GREASED: u32 = 1 << 9;
    pub const IN_USE: u32 = 1 << 10;
    pub const UNPAID: u32 = 1 << 11;
    pub const HAS_CONTENTS: u32 = 1 << 12;
}

/// Where a restored chain lives
#[derive(Debug, Clone, Copy)]
pub struct ChainHome {
    pub location: ObjectLocation,
    pub olev: Option<DLevel>,
    pub carrier: Option<MonsterId>,
    pub container: Option<ObjectId>,
}

impl ChainHome {
    pub fn on_level(location: ObjectLocation, level: DLevel) -> Self {
        Self {
            location,
            olev: Some(level),
            carrier: None,
            container: None,
        }
    }

    /// Objects not on any level (inventory, in transit)
    pub fn detached(location: ObjectLocation) -> Self {
        Self {
            location,
            olev: None,
            carrier: None,
            container: None,
        }
    }

    pub fn carried_by(mon: MonsterId, olev: Option<DLevel>) -> Self {
        Self {
            location: ObjectLocation::MonsterInventory,
            olev,
            carrier: Some(mon),
            container: None,
        }
    }

    fn inside(&self, container: ObjectId) -> Self {
        Self {
            location: ObjectLocation::Contained,
            olev: self.olev,
            carrier: None,
            container: Some(container),
        }
    }
}

fn pack_flags(obj: &Object) -> u32 {
    let mut f = 0;
    let mut set = |cond: bool, bit: u32| {
        if cond {
            f |= bit;
        }
    };
    set(obj.known, bits::KNOWN);
    set(obj.desc_known, bits::DESC_KNOWN);
    set(obj.buc_known, bits::BUC_KNOWN);
    set(obj.rust_known, bits::RUST_KNOWN);
    set(obj.erosion_proof, bits::EROSION_PROOF);
    set(obj.locked, bits::LOCKED);
    set(obj.broken, bits::BROKEN);
    set(obj.trapped, bits::TRAPPED);
    set(obj.lit, bits::LIT);
    set(obj.greased, bits::GREASED);
    set(obj.in_use, bits::IN_USE);
    set(obj.unpaid, bits::UNPAID);
    set(obj.has_contents(), bits::HAS_CONTENTS);
    f
}

fn unpack_flags(obj: &mut Object, f: u32) {
    obj.known = f & bits::KNOWN != 0;
    obj.desc_known = f & bits::DESC_KNOWN != 0;
    obj.buc_known = f & bits::BUC_KNOWN != 0;
    obj.rust_known = f & bits::RUST_KNOWN != 0;
    obj.erosion_proof = f & bits::EROSION_PROOF != 0;
    obj.locked = f & bits::LOCKED != 0;
    obj.broken = f & bits::BROKEN != 0;
    obj.trapped = f & bits::TRAPPED != 0;
    obj.lit = f & bits::LIT != 0;
    obj.greased = f & bits::GREASED != 0;
    obj.in_use = f & bits::IN_USE != 0;
    obj.unpaid = f & bits::UNPAID != 0;
}

/// Write one object record and, if it has any, its contents
pub fn save_object(w: &mut SaveWriter, obj: &Object) -> SaveResult<()> {
    w.magic(Magic::OBJ);
    w.u32(obj.id.0);
    w.i16(obj.object_type);
    w.u8(obj.class as u8);
    w.i8(obj.x);
    w.i8(obj.y);
    w.u32(obj.weight);
    w.i32(obj.quantity);
    w.i8(obj.enchantment);
    w.u32(obj.inv_letter as u32);
    w.u8(obj.artifact);
    w.u8(obj.location as u8);
    w.u8(obj.buc as u8);
    w.u32(pack_flags(obj));
    w.u8(obj.erosion1);
    w.u8(obj.erosion2);
    w.u8(obj.recharged);
    w.u32(obj.worn_mask.bits());
    w.i16(obj.corpse_type);
    w.i64(obj.age);
    w.i32(obj.shop_price);
    w.opt_str(obj.name.as_deref())?;
    if obj.has_contents() {
        save_obj_chain(w, &obj.contents)?;
    }
    Ok(())
}

pub fn save_obj_chain(w: &mut SaveWriter, chain: &[Object]) -> SaveResult<()> {
    w.magic(Magic::OCHN);
    w.count(chain.len(), MAX_CHAIN)?;
    for obj in chain {
        save_object(w, obj)?;
    }
    Ok(())
}

fn read_record(r: &mut SaveReader<'_>) -> SaveResult<(Object, bool)> {
    r.expect_magic(Magic::OBJ)?;
    let mut obj = Object::default();
    obj.id = ObjectId(r.u32()?);
    obj.object_type = r.i16()?;
    let class = r.u8()?;
    obj.class = ObjectClass::from_repr(class)
        .ok_or_else(|| SaveError::corrupt(format!("object class {class}")))?;
    obj.x = r.i8()?;
    obj.y = r.i8()?;
    obj.weight = r.u32()?;
    obj.quantity = r.i32()?;
    obj.enchantment = r.i8()?;
    let letter = r.u32()?;
    obj.inv_letter = char::from_u32(letter)
        .ok_or_else(|| SaveError::corrupt(format!("inventory letter {letter:#x}")))?;
    obj.artifact = r.u8()?;
    let location = r.u8()?;
    obj.location = ObjectLocation::from_repr(location)
        .ok_or_else(|| SaveError::corrupt(format!("object location {location}")))?;
    let buc = r.u8()?;
    obj.buc =
        BucStatus::from_repr(buc).ok_or_else(|| SaveError::corrupt(format!("buc {buc}")))?;
    let flags = r.u32()?;
    unpack_flags(&mut obj, flags);
    obj.erosion1 = r.u8()?;
    obj.erosion2 = r.u8()?;
    obj.recharged = r.u8()?;
    obj.worn_mask = WornMask::from_bits_retain(r.u32()?);
    obj.corpse_type = r.i16()?;
    obj.age = r.i64()?;
    obj.shop_price = r.i32()?;
    obj.name = r.opt_str()?;
    Ok((obj, flags & bits::HAS_CONTENTS != 0))
}

/// Give a bones object a fresh identity and move it onto this game's
/// timeline
fn rehome_ghost_object(obj: &mut Object, ctx: &mut RestoreContext, game: &mut GameState) {
    let nid = game.next_ident();
    ctx.idmap.add(obj.id.0, nid);
    obj.id = ObjectId(nid);

    if !age_is_relative(obj.class, obj.object_type) {
        obj.age += ctx.elapsed();
    }

    if obj.object_type == SLIME_MOLD {
        remap_fruit(obj, ctx, game);
    }
}

/// Slime molds name their fruit by id; ids differ between games, names
/// do not
fn remap_fruit(obj: &mut Object, ctx: &RestoreContext, game: &mut GameState) {
    let old = obj.enchantment as i32;
    let Some(name) = ctx.bones_fruits.as_ref().and_then(|f| f.name_of(old)) else {
        tracing::warn!(fid = old, "bones fruit id has no name");
        return;
    };
    let fid = game.fruits.add(name);
    match i8::try_from(fid) {
        Ok(fid) => obj.enchantment = fid,
        Err(_) => tracing::warn!(fid, "fruit id does not fit an object record"),
    }
}

/// Read one chain, nested contents included
pub fn restore_obj_chain(
    r: &mut SaveReader<'_>,
    ctx: &mut RestoreContext,
    game: &mut GameState,
    home: ChainHome,
) -> SaveResult<Vec<Object>> {
    r.expect_magic(Magic::OCHN)?;
    let n = r.count(MAX_CHAIN)?;
    let mut chain = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        let (mut obj, has_contents) = read_record(r)?;
        if ctx.ghostly {
            rehome_ghost_object(&mut obj, ctx, game);
        }
        obj.location = home.location;
        obj.olev = home.olev;
        obj.carrier = home.carrier;
        obj.container = home.container;
        ctx.objects.insert(obj.id.0, obj.location);

        if has_contents {
            obj.contents = restore_obj_chain(r, ctx, game, home.inside(obj.id))?;
            if obj.contents.is_empty() {
                return Err(SaveError::corrupt(format!(
                    "object {} claims contents but has none",
                    obj.id.0
                )));
            }
        }
        chain.push(obj);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nh_core::object::{FruitTable, CORPSE, OIL_LAMP};

    fn roundtrip(chain: &[Object], ctx: &mut RestoreContext, game: &mut GameState) -> Vec<Object> {
        let mut w = SaveWriter::new();
        save_obj_chain(&mut w, chain).unwrap();
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        let home = ChainHome::on_level(ObjectLocation::Floor, DLevel::new(0, 4));
        let out = restore_obj_chain(&mut r, ctx, game, home).unwrap();
        assert!(r.is_at_end());
        out
    }

    fn floor_object(id: u32, otyp: i16, class: ObjectClass) -> Object {
        let mut obj = Object::new(ObjectId(id), otyp, class);
        obj.location = ObjectLocation::Floor;
        obj.olev = Some(DLevel::new(0, 4));
        obj.x = 10;
        obj.y = 5;
        obj
    }

    #[test]
    fn test_nested_containers_restore_with_back_references() {
        let mut inner = floor_object(3, 200, ObjectClass::Tool);
        inner.add_to_container(Object::new(ObjectId(4), 10, ObjectClass::Gem));
        let mut outer = floor_object(1, 200, ObjectClass::Tool);
        outer.name = Some("bag".into());
        outer.add_to_container(Object::new(ObjectId(2), 10, ObjectClass::Gem));
        outer.add_to_container(inner);
        let chain = vec![outer, floor_object(5, 30, ObjectClass::Weapon)];

        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::new(100);
        let out = roundtrip(&chain, &mut ctx, &mut game);

        assert_eq!(out, chain);
        assert_eq!(out[0].contents[1].contents[0].container, Some(ObjectId(3)));
        assert_eq!(out[0].contents[1].contents[0].location, ObjectLocation::Contained);
        assert_eq!(ctx.objects.get(4), Some(ObjectLocation::Contained));
        assert_eq!(ctx.objects.len(), 5);
    }

    #[test]
    fn test_ghost_load_assigns_fresh_ids_and_rehomes_age() {
        let mut corpse = floor_object(7, CORPSE, ObjectClass::Food);
        corpse.age = 900;
        let mut lamp = floor_object(8, OIL_LAMP, ObjectClass::Tool);
        lamp.age = 1500;

        let mut game = GameState::new(1);
        game.ident = 40;
        let mut ctx = RestoreContext::ghost(5000, FruitTable::new());
        ctx.omoves = 1000;
        let out = roundtrip(&[corpse, lamp], &mut ctx, &mut game);

        assert_eq!(out[0].id, ObjectId(41));
        assert_eq!(ctx.idmap.lookup(7), Some(41));
        assert_eq!(ctx.idmap.lookup(8), Some(42));
        assert_eq!(out[0].age, 4900);
        // Remaining fuel, not a timestamp
        assert_eq!(out[1].age, 1500);
    }

    #[test]
    fn test_ghost_fruit_remapped_by_name() {
        let mut bones_fruits = FruitTable::new();
        bones_fruits.add("kumquat");
        bones_fruits.add("durian");

        let mut game = GameState::new(1);
        game.fruits.add("durian");

        let mut mold = floor_object(9, SLIME_MOLD, ObjectClass::Food);
        mold.enchantment = 2;
        let mut ctx = RestoreContext::ghost(10, bones_fruits);
        let out = roundtrip(&[mold], &mut ctx, &mut game);

        assert_eq!(out[0].enchantment, 1);
        assert_eq!(game.fruits.name_of(1), Some("durian"));
    }

    #[test]
    fn test_truncated_chain_is_eof() {
        let mut w = SaveWriter::new();
        save_obj_chain(&mut w, &[floor_object(1, 5, ObjectClass::Gem)]).unwrap();
        let bytes = w.into_bytes();
        let cut = &bytes[..bytes.len() - 3];

        let mut game = GameState::new(1);
        let mut ctx = RestoreContext::new(1);
        let mut r = SaveReader::new(cut);
        let home = ChainHome::detached(ObjectLocation::PlayerInventory);
        assert!(matches!(
            restore_obj_chain(&mut r, &mut ctx, &mut game, home),
            Err(SaveError::UnexpectedEof { section: "OBJ" })
        ));
    }
}
