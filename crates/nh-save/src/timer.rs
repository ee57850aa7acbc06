//! Timer persistence (TIMR)
//!
//! A section holds one range of timers in queue order. Reading yields the
//! raw list; the caller relinks it once the targets exist and then builds
//! the queue with [`TimerQueue::restore_sorted`].

use nh_core::world::{Timer, TimerArg, TimerFunc, TimerId, TimerKind, TimerQueue};
use nh_core::Reference;

use crate::context::RestoreContext;
use crate::error::{SaveError, SaveResult};
use crate::io::{SaveReader, SaveWriter};
use crate::magic::Magic;
use crate::relink::{resolve_monster, resolve_object, Scan};

const MAX_TIMERS: usize = 1 << 16;

fn write_arg(w: &mut SaveWriter, arg: &TimerArg) {
    match *arg {
        TimerArg::None => w.u8(0),
        TimerArg::Object(r) => {
            w.u8(1);
            w.u32(r.raw_id());
        }
        TimerArg::Monster(r) => {
            w.u8(2);
            w.u32(r.raw_id());
        }
        TimerArg::Location { x, y } => {
            w.u8(3);
            w.i8(x);
            w.i8(y);
        }
        TimerArg::Value(v) => {
            w.u8(4);
            w.i64(v);
        }
    }
}

fn read_arg(r: &mut SaveReader<'_>) -> SaveResult<TimerArg> {
    let tag = r.u8()?;
    Ok(match tag {
        0 => TimerArg::None,
        1 => TimerArg::Object(Reference::Unresolved(r.u32()?)),
        2 => TimerArg::Monster(Reference::Unresolved(r.u32()?)),
        3 => TimerArg::Location {
            x: r.i8()?,
            y: r.i8()?,
        },
        4 => TimerArg::Value(r.i64()?),
        _ => return Err(SaveError::corrupt(format!("timer argument tag {tag}"))),
    })
}

/// Write one range of timers; `timers` must already be in firing order
pub fn save_timers(
    w: &mut SaveWriter,
    next_id: TimerId,
    timers: &[&Timer],
) -> SaveResult<()> {
    w.magic(Magic::TIMR);
    w.u32(next_id);
    w.count(timers.len(), MAX_TIMERS)?;
    for timer in timers {
        w.u32(timer.id);
        w.u64(timer.fire_at);
        w.u8(timer.kind as u8);
        w.u8(timer.func as u8);
        write_arg(w, &timer.arg);
    }
    Ok(())
}

/// Read one range of timers with their references still raw
pub fn restore_timers(
    r: &mut SaveReader<'_>,
    ctx: &RestoreContext,
) -> SaveResult<(Vec<Timer>, TimerId)> {
    r.expect_magic(Magic::TIMR)?;
    let next_id = r.u32()?;
    let n = r.count(MAX_TIMERS)?;
    let mut timers = Vec::with_capacity(n);
    for _ in 0..n {
        let id = r.u32()?;
        let mut fire_at = r.u64()?;
        let kind = r.u8()?;
        let kind = TimerKind::from_repr(kind)
            .ok_or_else(|| SaveError::corrupt(format!("timer kind {kind}")))?;
        let func = r.u8()?;
        let func = TimerFunc::from_repr(func)
            .ok_or_else(|| SaveError::corrupt(format!("timer callback index {func}")))?;
        let arg = read_arg(r)?;
        if ctx.ghostly {
            fire_at = fire_at.saturating_add_signed(ctx.elapsed());
        }
        timers.push(Timer {
            id,
            fire_at,
            kind,
            func,
            arg,
        });
    }
    Ok((timers, next_id))
}

/// Point restored timers at the restored objects and monsters
pub fn relink_timers(timers: &mut [Timer], ctx: &RestoreContext, scan: &Scan<'_>) -> SaveResult<()> {
    for timer in timers.iter_mut() {
        timer.arg = match timer.arg {
            TimerArg::Object(r) => TimerArg::Object(resolve_object(r, ctx, scan)?),
            TimerArg::Monster(r) => TimerArg::Monster(resolve_monster(r, ctx, scan)?),
            other => other,
        };
    }
    Ok(())
}

/// Build a queue from a relinked list
pub fn into_queue(timers: Vec<Timer>, next_id: TimerId) -> SaveResult<TimerQueue> {
    TimerQueue::restore_sorted(timers, next_id).map_err(|e| SaveError::corrupt(e.to_string()))
}
