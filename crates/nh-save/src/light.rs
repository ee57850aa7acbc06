//! Light source persistence (LITE)

use nh_core::world::{LightFlags, LightOwner, LightSource};
use nh_core::Reference;

use crate::context::RestoreContext;
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::magic::Magic;
use crate::relink::{resolve_monster, resolve_object, Scan};

const MAX_LIGHTS: usize = 1 << 16;

pub fn save_light_sources(w: &mut SaveWriter, lights: &[&LightSource]) -> SaveResult<()> {
    w.magic(Magic::LITE);
    w.count(lights.len(), MAX_LIGHTS)?;
    for ls in lights {
        w.i8(ls.x);
        w.i8(ls.y);
        w.i16(ls.range);
        w.u16(ls.flags.bits());
        w.u8(ls.owner.code());
        w.u32(ls.owner.raw_id());
    }
    Ok(())
}

/// Read one range of light sources with raw owners
pub fn restore_light_sources(r: &mut SaveReader<'_>) -> SaveResult<Vec<LightSource>> {
    r.expect_magic(Magic::LITE)?;
    let n = r.count(MAX_LIGHTS)?;
    let mut lights = Vec::with_capacity(n);
    for _ in 0..n {
        let x = r.i8()?;
        let y = r.i8()?;
        let range = r.i16()?;
        let flags = LightFlags::from_bits_truncate(r.u16()?);
        let code = r.u8()?;
        let raw = r.u32()?;
        let owner = match code {
            0 => LightOwner::Object(Reference::Unresolved(raw)),
            1 => LightOwner::Monster(Reference::Unresolved(raw)),
            _ => return Err(SaveError::corrupt(format!("light source owner type {code}"))),
        };
        lights.push(LightSource {
            x,
            y,
            range,
            flags,
            owner,
        });
    }
    Ok(lights)
}

pub fn relink_light_sources(
    lights: &mut [LightSource],
    ctx: &RestoreContext,
    scan: &Scan<'_>,
) -> SaveResult<()> {
    for ls in lights.iter_mut() {
        ls.owner = match ls.owner {
            LightOwner::Object(r) => LightOwner::Object(resolve_object(r, ctx, scan)?),
            LightOwner::Monster(r) => LightOwner::Monster(resolve_monster(r, ctx, scan)?),
        };
    }
    Ok(())
}
