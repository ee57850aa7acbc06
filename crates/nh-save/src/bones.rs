//! Bones files: a dead hero's level, left for another game to find
//!
//! A bones file is the version record, the dead game's fruit chain and a
//! single level. Loading one is a ghost load: every object and monster on
//! it gets an id from the loading game.

use nh_core::dungeon::{DLevel, DungeonSystem, Level};
use nh_core::object::{find_in_chain, FruitTable, ObjectId};
use nh_core::{GameRng, GameState};

use crate::context::{RestoreContext, SaveContext};
use crate::error::{SaveError, SaveResult};
use crate::game::{restore_fruits, save_fruits};
use crate::io::{SaveReader, SaveWriter};
use crate::level::{getlev, link_bills, savelev};
use crate::magic::Magic;
use crate::version::VersionInfo;

/// The next visitor does not share the dead hero's map memory
fn forget_map(level: &mut Level) {
    for cell in level.cells.iter_mut().flatten() {
        cell.seen_from = 0;
        cell.explored = false;
        cell.was_lit = false;
        cell.glyph = 0;
    }
}

/// Serialize `level` as a bones file
pub fn savebones(
    level: &Level,
    fruits: &FruitTable,
    dungeons: &DungeonSystem,
) -> SaveResult<Vec<u8>> {
    let mut level = level.clone();
    forget_map(&mut level);

    let mut w = SaveWriter::new();
    VersionInfo::CURRENT.write(&mut w);
    w.magic(Magic::BONE);
    save_fruits(&mut w, fruits)?;
    savelev(&mut w, &level, &SaveContext::for_bones(dungeons))?;
    tracing::info!(level = %level.dlevel, bytes = w.len(), "bones saved");
    Ok(w.into_bytes())
}

/// What a ghost load draws from the loading game
struct Staged {
    ident: u32,
    fruits: FruitTable,
    rng: GameRng,
}

impl Staged {
    fn take(game: &GameState) -> Self {
        Self {
            ident: game.ident,
            fruits: game.fruits.clone(),
            rng: game.rng.clone(),
        }
    }

    fn roll_back(self, game: &mut GameState) {
        game.ident = self.ident;
        game.fruits = self.fruits;
        game.rng = self.rng;
    }
}

/// Load a bones file into `game` as level `target`.
///
/// On error `game` is left as it was.
pub fn getbones(game: &mut GameState, data: &[u8], target: DLevel) -> SaveResult<()> {
    let _span = tracing::info_span!("getbones", level = %target).entered();
    let staged = Staged::take(game);
    let mut level = match read_bones(game, data, target) {
        Ok(level) => level,
        Err(err) => {
            staged.roll_back(game);
            tracing::error!(%err, "bones rejected");
            return Err(err);
        }
    };

    let carried = |raw: u32| {
        let id = ObjectId(raw);
        find_in_chain(&game.inventory, id).is_some()
            || find_in_chain(&game.migrating_objects, id).is_some()
    };
    link_bills(&mut level, &carried);

    if game.levels.insert(target, level).is_some() {
        tracing::warn!(level = %target, "bones replaced an existing level");
    }
    tracing::info!(ident = game.ident, "bones loaded");
    Ok(())
}

fn read_bones(game: &mut GameState, data: &[u8], target: DLevel) -> SaveResult<Level> {
    let mut r = SaveReader::new(data);
    let found = VersionInfo::read(&mut r)?;
    if !found.is_compatible() {
        return Err(SaveError::IncompatibleVersion {
            expected: VersionInfo::CURRENT.to_string(),
            found: found.to_string(),
        });
    }
    r.expect_magic(Magic::BONE)?;
    let fruits = restore_fruits(&mut r)?;

    let mut ctx = RestoreContext::ghost(game.moves, fruits);
    ctx.idmap.clear();
    let level = getlev(&mut r, &mut ctx, game, target)?;
    if !r.is_at_end() {
        return Err(SaveError::corrupt("trailing bytes after bones level"));
    }
    Ok(level)
}
