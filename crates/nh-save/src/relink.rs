//! Reference resolution after a chain has been read
//!
//! Timers and light sources are read before the objects and monsters they
//! point at, so their references stay raw until the owning section is
//! complete. Resolution goes through the restore cache first; the chain
//! scan is the slow path and the cross-check.

use nh_core::monster::MonsterId;
use nh_core::object::ObjectId;
use nh_core::Reference;

use crate::context::RestoreContext;
use crate::error::{SaveError, SaveResult};

/// Linear scans over whatever the references may point into
pub struct Scan<'a> {
    pub objects: &'a dyn Fn(u32) -> bool,
    pub monsters: &'a dyn Fn(u32) -> bool,
}

/// Translate an id from the bones file to this game
fn remap(raw: u32, what: &'static str, ctx: &RestoreContext) -> SaveResult<u32> {
    if !ctx.ghostly {
        return Ok(raw);
    }
    ctx.idmap.lookup(raw).ok_or_else(|| SaveError::missing(what, raw))
}

pub fn resolve_object(
    r: Reference<ObjectId>,
    ctx: &RestoreContext,
    scan: &Scan<'_>,
) -> SaveResult<Reference<ObjectId>> {
    let raw = remap(r.raw_id(), "object", ctx)?;
    let cached = ctx.objects.contains(raw);
    debug_assert!(!cached || (scan.objects)(raw), "object {raw} cached but not in any chain");
    if cached || (scan.objects)(raw) {
        Ok(Reference::Resolved(ObjectId(raw)))
    } else {
        Err(SaveError::missing("object", raw))
    }
}

pub fn resolve_monster(
    r: Reference<MonsterId>,
    ctx: &RestoreContext,
    scan: &Scan<'_>,
) -> SaveResult<Reference<MonsterId>> {
    let raw = remap(r.raw_id(), "monster", ctx)?;
    let cached = ctx.monsters.contains(raw);
    debug_assert!(!cached || (scan.monsters)(raw), "monster {raw} cached but not in any chain");
    if cached || (scan.monsters)(raw) {
        Ok(Reference::Resolved(MonsterId(raw)))
    } else {
        Err(SaveError::missing("monster", raw))
    }
}
