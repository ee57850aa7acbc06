//! Scheduled callbacks
//!
//! Each level owns a [`TimerQueue`], and the game keeps one more for
//! timers that travel with the hero. A queue is kept sorted by `fire_at`;
//! timers with equal `fire_at` fire in the order they were started.

use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};
use thiserror::Error;

use crate::monster::MonsterId;
use crate::object::ObjectId;
use crate::reference::{EntityId, Reference};

/// Timer identifier, unique within its queue
pub type TimerId = u32;

/// What a timer is attached to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
pub enum TimerKind {
    /// Tied to a map location
    Level = 0,
    /// Game-wide
    Global = 1,
    /// Attached to an object
    Object = 2,
    /// Attached to a monster
    Monster = 3,
}

/// Callback table index
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
pub enum TimerFunc {
    RotOrganic = 0,
    RotCorpse = 1,
    ReviveMon = 2,
    BurnObject = 3,
    HatchEgg = 4,
    FigTransform = 5,
    MeltIce = 6,
    ShrinkGlob = 7,
}

impl TimerFunc {
    /// Callbacks that must undo partial effects when cancelled
    pub const fn has_cleanup(&self) -> bool {
        matches!(self, TimerFunc::BurnObject)
    }
}

/// Timer argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerArg {
    None,
    Object(Reference<ObjectId>),
    Monster(Reference<MonsterId>),
    Location { x: i8, y: i8 },
    Value(i64),
}

impl TimerArg {
    pub fn object(id: ObjectId) -> Self {
        TimerArg::Object(Reference::Resolved(id))
    }

    pub fn monster(id: MonsterId) -> Self {
        TimerArg::Monster(Reference::Resolved(id))
    }

    /// Same target, regardless of whether either side is resolved yet
    pub fn same_target(&self, other: &TimerArg) -> bool {
        match (self, other) {
            (TimerArg::Object(a), TimerArg::Object(b)) => a.raw_id() == b.raw_id(),
            (TimerArg::Monster(a), TimerArg::Monster(b)) => a.raw_id() == b.raw_id(),
            _ => self == other,
        }
    }

    /// Raw id of the attached object, if any
    pub fn object_raw(&self) -> Option<u32> {
        match self {
            TimerArg::Object(r) => Some(r.raw_id()),
            _ => None,
        }
    }

    fn targets_object(&self, id: ObjectId) -> bool {
        self.object_raw() == Some(id.raw())
    }
}

/// A scheduled callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    /// Absolute turn at which the timer fires
    pub fire_at: u64,
    pub kind: TimerKind,
    pub func: TimerFunc,
    pub arg: TimerArg,
}

/// Callback implementations
///
/// `fire` receives the queue the timer was popped from, so a callback can
/// schedule follow-up timers; ones that are already due fire in the same
/// `run_due` pass.
pub trait TimerHandler {
    fn fire(&mut self, timer: &Timer, queue: &mut TimerQueue, now: u64);

    /// Undo partial effects of a cancelled timer (only called for
    /// callbacks where [`TimerFunc::has_cleanup`] holds)
    fn cleanup(&mut self, _timer: &Timer, _now: u64) {}
}

/// Restored timer list was not in ascending `fire_at` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timer {id} at position {position} fires before its predecessor")]
pub struct UnsortedTimers {
    pub id: TimerId,
    pub position: usize,
}

/// A sorted list of timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerQueue {
    timers: VecDeque<Timer>,
    next_id: TimerId,
    /// Per-object count of attached timers, keyed by raw object id
    timed: HashMap<u32, u32>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            timers: VecDeque::new(),
            next_id: 1,
            timed: HashMap::new(),
        }
    }

    /// Rebuild a queue from timers read back in saved order.
    ///
    /// The list is built back to front with head insertion so each insert
    /// is O(1); a list that is not ascending is rejected.
    pub fn restore_sorted(saved: Vec<Timer>, next_id: TimerId) -> Result<Self, UnsortedTimers> {
        for (position, pair) in saved.windows(2).enumerate() {
            if pair[1].fire_at < pair[0].fire_at {
                return Err(UnsortedTimers {
                    id: pair[1].id,
                    position: position + 1,
                });
            }
        }

        let mut queue = Self::new();
        queue.next_id = next_id;
        for timer in saved.into_iter().rev() {
            queue.timers.push_front(timer);
        }
        queue.recount_timed();
        Ok(queue)
    }

    /// Id the next started timer will get
    pub fn next_id(&self) -> TimerId {
        self.next_id
    }

    /// Schedule `func` to fire `delay` turns after `now` (start_timer).
    ///
    /// Returns false if the same callback is already pending for `arg`.
    pub fn start(
        &mut self,
        now: u64,
        delay: u64,
        kind: TimerKind,
        func: TimerFunc,
        arg: TimerArg,
    ) -> bool {
        if self.position(func, &arg).is_some() {
            return false;
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.insert(Timer {
            id,
            fire_at: now.saturating_add(delay),
            kind,
            func,
            arg,
        });
        true
    }

    /// Place `timer` after every timer with `fire_at <=` its own
    fn insert(&mut self, timer: Timer) {
        if timer.kind == TimerKind::Object {
            if let Some(raw) = timer.arg.object_raw() {
                *self.timed.entry(raw).or_insert(0) += 1;
            }
        }
        let pos = self
            .timers
            .iter()
            .position(|t| t.fire_at > timer.fire_at)
            .unwrap_or(self.timers.len());
        self.timers.insert(pos, timer);
    }

    fn position(&self, func: TimerFunc, arg: &TimerArg) -> Option<usize> {
        self.timers
            .iter()
            .position(|t| t.func == func && t.arg.same_target(arg))
    }

    fn remove_at(&mut self, pos: usize) -> Option<Timer> {
        let timer = self.timers.remove(pos)?;
        self.release(&timer);
        Some(timer)
    }

    fn release(&mut self, timer: &Timer) {
        if timer.kind != TimerKind::Object {
            return;
        }
        if let Some(raw) = timer.arg.object_raw() {
            if let Some(count) = self.timed.get_mut(&raw) {
                *count -= 1;
                if *count == 0 {
                    self.timed.remove(&raw);
                }
            }
        }
    }

    /// Cancel a pending timer (stop_timer).
    ///
    /// Returns the cancelled timer's `fire_at`, or 0 if nothing matched.
    pub fn stop(
        &mut self,
        func: TimerFunc,
        arg: &TimerArg,
        handler: &mut dyn TimerHandler,
        now: u64,
    ) -> u64 {
        let Some(timer) = self.position(func, arg).and_then(|pos| self.remove_at(pos)) else {
            return 0;
        };
        if timer.func.has_cleanup() {
            handler.cleanup(&timer, now);
        }
        timer.fire_at
    }

    /// When `func` will fire for `arg`, or 0 if not pending (peek_timer)
    pub fn peek(&self, func: TimerFunc, arg: &TimerArg) -> u64 {
        self.position(func, arg)
            .map(|pos| self.timers[pos].fire_at)
            .unwrap_or(0)
    }

    /// Fire every timer due at `now`, earliest first (run_timers).
    ///
    /// The head is re-read after each callback. Returns how many fired.
    pub fn run_due(&mut self, now: u64, handler: &mut dyn TimerHandler) -> usize {
        let mut fired = 0;
        while self.timers.front().is_some_and(|t| t.fire_at <= now) {
            let Some(timer) = self.remove_at(0) else {
                break;
            };
            handler.fire(&timer, self, now);
            fired += 1;
        }
        fired
    }

    pub fn obj_has_timer(&self, obj: ObjectId, func: TimerFunc) -> bool {
        self.timers
            .iter()
            .any(|t| t.func == func && t.arg.targets_object(obj))
    }

    /// Does any timer reference `obj`?
    pub fn is_timed(&self, obj: ObjectId) -> bool {
        self.timed.contains_key(&obj.raw())
    }

    /// Cancel every timer attached to `obj`, running cleanups
    pub fn obj_stop_timers(&mut self, obj: ObjectId, handler: &mut dyn TimerHandler, now: u64) {
        while let Some(pos) = self.timers.iter().position(|t| t.arg.targets_object(obj)) {
            if let Some(timer) = self.remove_at(pos) {
                if timer.func.has_cleanup() {
                    handler.cleanup(&timer, now);
                }
            }
        }
    }

    /// Re-target `src`'s timers at `dest` (stack merge)
    pub fn obj_move_timers(&mut self, src: ObjectId, dest: ObjectId) {
        let mut moved = 0;
        for timer in self.timers.iter_mut() {
            if timer.arg.targets_object(src) {
                timer.arg = TimerArg::object(dest);
                moved += 1;
            }
        }
        if moved > 0 {
            self.timed.remove(&src.raw());
            *self.timed.entry(dest.raw()).or_insert(0) += moved;
        }
    }

    /// Copy `src`'s timers onto `dest` (stack split)
    pub fn obj_split_timers(&mut self, src: ObjectId, dest: ObjectId) {
        let copies: Vec<Timer> = self
            .timers
            .iter()
            .filter(|t| t.arg.targets_object(src))
            .cloned()
            .collect();
        for mut timer in copies {
            timer.id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            timer.arg = TimerArg::object(dest);
            self.insert(timer);
        }
    }

    /// Cancel timers bound to map location (x, y)
    pub fn spot_stop_timers(&mut self, x: i8, y: i8, handler: &mut dyn TimerHandler, now: u64) {
        let spot = TimerArg::Location { x, y };
        while let Some(pos) = self.timers.iter().position(|t| t.arg == spot) {
            if let Some(timer) = self.remove_at(pos) {
                if timer.func.has_cleanup() {
                    handler.cleanup(&timer, now);
                }
            }
        }
    }

    /// Recompute per-object counts from the current arguments
    pub fn recount_timed(&mut self) {
        self.timed.clear();
        for timer in &self.timers {
            if timer.kind != TimerKind::Object {
                continue;
            }
            if let Some(raw) = timer.arg.object_raw() {
                *self.timed.entry(raw).or_insert(0) += 1;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.timers.iter()
    }

    /// Mutable access for argument relinking; `fire_at` must not change
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Timer> {
        self.timers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
        self.timed.clear();
    }
}
