//! Full redraw is a correctness fallback: it never changes the end result

use nh_uncursed::backend::{HeadlessBackend, HeadlessProbe};
use nh_uncursed::{Attr, Color, STDSCR, Screen, UncursedHooks};
use proptest::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

const HEIGHT: u16 = 4;
const WIDTH: u16 = 10;

#[derive(Debug, Clone)]
enum Op {
    Draw {
        y: u16,
        x: u16,
        text: String,
        pair: u16,
        bold: bool,
    },
    Recolor {
        pair: u16,
        fg: u8,
    },
    Erase,
    Commit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..HEIGHT, 0..WIDTH, "[a-z@#. ]{1,6}", 0u16..4, any::<bool>()).prop_map(
            |(y, x, text, pair, bold)| Op::Draw { y, x, text, pair, bold }
        ),
        1 => (1u16..4, 0u8..16).prop_map(|(pair, fg)| Op::Recolor { pair, fg }),
        1 => Just(Op::Erase),
        2 => Just(Op::Commit),
    ]
}

fn commit(screen: &mut Screen, backend: &mut HeadlessBackend) -> usize {
    let mut tables: [&mut dyn UncursedHooks; 1] = [backend];
    screen.doupdate(&mut tables)
}

fn apply(screen: &mut Screen, op: &Op) {
    match op {
        Op::Draw {
            y,
            x,
            text,
            pair,
            bold,
        } => {
            let win = screen.stdscr();
            win.move_cursor(*y, *x);
            win.set_pair(*pair);
            win.set_attr(if *bold { Attr::BOLD } else { Attr::empty() });
            win.add_str(text);
        }
        Op::Recolor { pair, fg } => {
            let fg = Color::from_repr(*fg).unwrap_or(Color::Default);
            screen.init_pair(*pair, fg, Color::Black);
        }
        Op::Erase => screen.stdscr().erase(),
        Op::Commit => {}
    }
}

fn fresh() -> (Screen, HeadlessBackend, HeadlessProbe) {
    let mut screen = Screen::new(HEIGHT, WIDTH);
    for pair in 1..4 {
        screen.init_pair(pair, Color::Gray, Color::Black);
    }
    let (backend, probe) = HeadlessBackend::new(HEIGHT, WIDTH);
    (screen, backend, probe)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_full_redraw_matches_incremental(ops in prop::collection::vec(op(), 0..40)) {
        // Incremental: commit whenever the script says so.
        let (mut inc, mut inc_backend, inc_probe) = fresh();
        for op in &ops {
            apply(&mut inc, op);
            if matches!(op, Op::Commit) {
                inc.noutrefresh(STDSCR).unwrap();
                commit(&mut inc, &mut inc_backend);
            }
        }
        inc.noutrefresh(STDSCR).unwrap();
        commit(&mut inc, &mut inc_backend);
        let incremental = inc.displayed_grid().to_vec();
        let incremental_mirror = inc_probe.grid();

        // One commit from blank.
        let (mut once, mut once_backend, once_probe) = fresh();
        for op in &ops {
            apply(&mut once, op);
        }
        once.noutrefresh(STDSCR).unwrap();
        commit(&mut once, &mut once_backend);

        prop_assert_eq!(&incremental, &once.displayed_grid().to_vec());
        prop_assert_eq!(&incremental_mirror, &once_probe.grid());

        // Full redraw then commit lands in the same place.
        {
            let mut tables: [&mut dyn UncursedHooks; 1] = [&mut inc_backend];
            inc.full_redraw(&mut tables);
        }
        let redrawn = commit(&mut inc, &mut inc_backend);
        prop_assert_eq!(redrawn, (HEIGHT * WIDTH) as usize);
        prop_assert_eq!(&incremental, &inc.displayed_grid().to_vec());
        prop_assert_eq!(&incremental_mirror, &inc_probe.grid());

        // And nothing is left to do.
        prop_assert_eq!(commit(&mut inc, &mut inc_backend), 0);
    }
}

#[test]
fn test_displayed_matches_requested_after_commit() {
    let (mut screen, mut backend, _probe) = fresh();
    screen.stdscr().add_str("You see here a lamp.");
    screen.noutrefresh(STDSCR).unwrap();
    commit(&mut screen, &mut backend);

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let requested = screen.requested(y, x).map(|c| c.glyph);
            let displayed = screen.displayed(y, x).map(|v| v.glyph);
            assert_eq!(requested, displayed);
        }
    }
}
