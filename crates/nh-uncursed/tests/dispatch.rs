//! Backend dispatch through the `Uncursed` facade

use std::time::Duration;

use nh_uncursed::backend::{HeadlessBackend, HeadlessProbe};
use nh_uncursed::tiles::TileOwner;
use nh_uncursed::{
    Key, Modifiers, MouseButton, RawInput, Rect, Role, STDSCR, SpecialKey, Uncursed,
    UncursedConfig, UncursedError,
};

// ============================================================================
// Fixtures
// ============================================================================

const HEIGHT: u16 = 4;
const WIDTH: u16 = 10;

struct Rig {
    ui: Uncursed,
    input: HeadlessProbe,
    mirrors: Vec<HeadlessProbe>,
}

fn rig_with(input: HeadlessBackend, probe: HeadlessProbe) -> Rig {
    let config = UncursedConfig {
        extra_interfaces: vec!["mirror-a".into(), "mirror-b".into(), "rec".into()],
        ..UncursedConfig::default()
    };
    let mut ui = Uncursed::new(config);
    ui.registry_mut()
        .register("scripted", Role::Input, 5, Box::new(input));

    let mut mirrors = Vec::new();
    for (name, role) in [
        ("mirror-a", Role::Broadcast),
        ("mirror-b", Role::Broadcast),
        ("rec", Role::Recording),
    ] {
        let (backend, probe) = HeadlessBackend::new(HEIGHT, WIDTH);
        ui.registry_mut().register(name, role, 0, Box::new(backend));
        mirrors.push(probe);
    }
    ui.initialize().unwrap();
    Rig {
        ui,
        input: probe,
        mirrors,
    }
}

fn rig(script: Vec<RawInput>) -> Rig {
    let (backend, probe) = HeadlessBackend::new(HEIGHT, WIDTH);
    rig_with(backend.with_script(script), probe)
}

fn key(c: char) -> RawInput {
    RawInput::Key(Key::Char(c))
}

// ============================================================================
// Selection and exclusivity
// ============================================================================

#[test]
fn test_only_one_input_backend_active() {
    let mut ui = Uncursed::new(UncursedConfig::default());
    let (a, a_probe) = HeadlessBackend::new(HEIGHT, WIDTH);
    let (b, b_probe) = HeadlessBackend::new(HEIGHT, WIDTH);
    ui.registry_mut().register("a", Role::Input, 1, Box::new(a));
    ui.registry_mut().register("b", Role::Input, 2, Box::new(b));

    ui.initialize().unwrap();
    assert_eq!(ui.registry().active_input(), Some("b"));
    assert!(b_probe.is_active());
    assert!(!a_probe.is_active());

    let err = ui.registry_mut().activate("a").unwrap_err();
    assert!(matches!(err, UncursedError::InputAlreadyActive { .. }));
}

#[test]
fn test_interface_override_wins() {
    let config = UncursedConfig::default().with_interface("a");
    let mut ui = Uncursed::new(config);
    let (a, _) = HeadlessBackend::new(HEIGHT, WIDTH);
    let (b, _) = HeadlessBackend::new(HEIGHT, WIDTH);
    ui.registry_mut().register("a", Role::Input, 1, Box::new(a));
    ui.registry_mut().register("b", Role::Input, 2, Box::new(b));
    ui.initialize().unwrap();
    assert_eq!(ui.registry().active_input(), Some("a"));
}

#[test]
fn test_no_input_backend_is_fatal() {
    let mut ui = Uncursed::new(UncursedConfig::default());
    let (rec, _) = HeadlessBackend::new(HEIGHT, WIDTH);
    ui.registry_mut().register("rec", Role::Recording, 3, Box::new(rec));
    assert!(matches!(ui.initialize(), Err(UncursedError::NoBackend)));
    assert!(!ui.is_initialized());
}

#[test]
fn test_screen_takes_backend_size() {
    let (backend, probe) = HeadlessBackend::new(7, 33);
    let rig = rig_with(backend, probe);
    assert_eq!(rig.ui.screen().size(), (7, 33));
}

#[test]
fn test_exit_releases_backends() {
    let mut rig = rig(vec![]);
    assert!(rig.mirrors.iter().all(HeadlessProbe::is_active));
    rig.ui.exit();
    assert!(!rig.input.is_active());
    assert!(rig.mirrors.iter().all(|m| !m.is_active()));
}

// ============================================================================
// Input broadcast
// ============================================================================

#[test]
fn test_every_key_reaches_every_mirror_once() {
    let up = Key::Special(SpecialKey::Up, Modifiers::empty());
    let mut rig = rig(vec![key('a'), key('b'), RawInput::Key(up)]);

    let got: Vec<Key> = (0..3).map(|_| rig.ui.get_key(None).unwrap()).collect();
    assert_eq!(got, vec![Key::Char('a'), Key::Char('b'), up]);

    for mirror in &rig.mirrors {
        assert_eq!(mirror.keys(), got);
    }
    // The input backend is not told about its own keys.
    assert!(rig.input.keys().is_empty());
}

#[test]
fn test_ungot_key_comes_first_and_is_broadcast() {
    let mut rig = rig(vec![key('z')]);
    rig.ui.unget_key(Key::Char('y'));
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('y'));
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('z'));
    assert_eq!(rig.mirrors[0].keys(), vec![Key::Char('y'), Key::Char('z')]);
}

#[test]
fn test_mouse_click_uses_cell_binding() {
    let mut rig = rig(vec![
        RawInput::Mouse {
            button: MouseButton::Left,
            y: 0,
            x: 5,
        },
        RawInput::Mouse {
            button: MouseButton::Left,
            y: 0,
            x: 0,
        },
    ]);
    let win = rig.ui.screen_mut().stdscr();
    win.set_mouse_binding(MouseButton::Left, Some(Key::Char('k')));
    win.add_char('>');
    rig.ui.refresh(STDSCR).unwrap();

    // The first click lands on an unbound cell and is swallowed.
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('k'));
    assert_eq!(rig.mirrors[1].keys(), vec![Key::Char('k')]);
}

#[test]
fn test_unbound_click_does_not_extend_timeout() {
    let mut expired = rig(vec![
        RawInput::Mouse {
            button: MouseButton::Left,
            y: 1,
            x: 1,
        },
        key('a'),
    ]);
    assert_eq!(expired.ui.get_key(Some(Duration::ZERO)).unwrap(), Key::Timeout);
    assert_eq!(expired.input.waits(), vec![Some(Duration::ZERO)]);

    let mut waiting = rig(vec![
        RawInput::Mouse {
            button: MouseButton::Left,
            y: 1,
            x: 1,
        },
        key('b'),
    ]);
    let limit = Duration::from_secs(30);
    assert_eq!(waiting.ui.get_key(Some(limit)).unwrap(), Key::Char('b'));
    let waits = waiting.input.waits();
    assert_eq!(waits.len(), 2);
    assert!(waits[1].unwrap() <= limit);
}

#[test]
fn test_signal_wakeup() {
    let mut rig = rig(vec![key('a')]);
    let waker = rig.ui.signal_waker();
    waker.wake();
    assert_eq!(rig.ui.get_key(Some(Duration::from_millis(10))).unwrap(), Key::Signal);
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('a'));
}

// ============================================================================
// Hangup, resize, job control
// ============================================================================

#[test]
fn test_hangup_is_permanent() {
    let mut rig = rig(vec![key('x')]);
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('x'));
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Hangup);
    assert!(rig.ui.is_hung_up());

    // New input after the hangup is never read.
    rig.input.push_input(key('y'));
    rig.ui.unget_key(Key::Char('w'));
    for _ in 0..3 {
        assert_eq!(rig.ui.get_key(None).unwrap(), Key::Hangup);
    }

    rig.ui.screen_mut().stdscr().add_str("gone");
    assert_eq!(rig.ui.refresh(STDSCR).unwrap(), 0);
    assert_eq!(
        rig.mirrors[0].keys(),
        vec![Key::Char('x'), Key::Hangup, Key::Hangup, Key::Hangup, Key::Hangup]
    );
}

#[test]
fn test_backend_resize_becomes_key() {
    let mut rig = rig(vec![RawInput::Resize {
        height: 6,
        width: 20,
    }]);
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Resize);
    assert_eq!(rig.ui.screen().size(), (6, 20));
    assert_eq!(rig.mirrors[0].lines().len(), 6);
    assert_eq!(rig.ui.doupdate(), 120);
}

#[test]
fn test_explicit_resize_queues_key() {
    let mut rig = rig(vec![key('q')]);
    rig.ui.resize(3, 5);
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Resize);
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('q'));
    assert_eq!(rig.ui.screen().size(), (3, 5));
}

#[test]
fn test_suspend_resume_is_not_hangup() {
    let mut rig = rig(vec![key('r')]);
    rig.ui.screen_mut().stdscr().add_str("map");
    rig.ui.refresh(STDSCR).unwrap();

    rig.ui.suspend();
    assert!(rig.input.is_suspended());
    rig.ui.resume();
    assert!(!rig.input.is_suspended());
    assert!(!rig.ui.is_hung_up());
    assert_eq!(rig.input.full_redraws(), 1);
    assert_eq!(rig.input.row(0), "map       ");
    assert_eq!(rig.ui.get_key(None).unwrap(), Key::Char('r'));
}

// ============================================================================
// Output fan-out
// ============================================================================

#[test]
fn test_output_reaches_all_backends() {
    let mut rig = rig(vec![]);
    rig.ui.screen_mut().stdscr().add_str("@ here");
    rig.ui.refresh(STDSCR).unwrap();
    rig.ui.beep();

    for probe in rig.mirrors.iter().chain(std::iter::once(&rig.input)) {
        assert_eq!(probe.row(0), "@ here    ");
        assert_eq!(probe.flushes(), 1);
        assert_eq!(probe.beeps(), 1);
        assert_eq!(probe.cursor(), (0, 6));
    }
}

// ============================================================================
// Tiles
// ============================================================================

#[test]
fn test_tiles_owned_by_first_capable_backend() {
    let (backend, probe) = HeadlessBackend::new(HEIGHT, WIDTH);
    let mut rig = rig_with(backend.with_tiles(), probe);
    rig.ui
        .set_tiles_tile_file(std::path::Path::new("tiles.png"), 16, 16);

    let owner = rig.ui.screen().tiles().tile_set().map(|s| s.owner.clone());
    assert!(matches!(owner, Some(TileOwner::Backend { ref table, .. }) if table == "scripted"));

    let region = rig.ui.create_tiles_region(Rect::new(0, 0, 2, 4)).unwrap();
    assert!(matches!(
        rig.ui.create_tiles_region(Rect::new(1, 3, 2, 2)),
        Err(UncursedError::RegionOverlap { .. })
    ));
    assert!(rig.ui.set_tile(region, 1, 1, Some(42)));
    assert!(!rig.ui.set_tile(region, 2, 0, Some(42)));
    assert_eq!(rig.input.tile_calls(), vec![(region, 1, 1, Some(42))]);

    rig.ui.doupdate();
    let shown = rig.input.cell(1, 1).and_then(|v| v.tile);
    assert_eq!(shown.and_then(|t| t.tile), Some(42));

    assert!(rig.ui.delete_tiles_region(region));
    assert!(!rig.ui.delete_tiles_region(region));
}

#[test]
fn test_tiles_fall_back_to_placeholder() {
    let mut rig = rig(vec![]);
    rig.ui
        .set_tiles_tile_file(std::path::Path::new("tiles.png"), 8, 8);
    let owner = rig.ui.screen().tiles().tile_set().map(|s| s.owner.clone());
    assert_eq!(owner, Some(TileOwner::Dummy));
    assert!(rig.ui.create_tiles_region(Rect::new(0, 0, 1, 1)).is_ok());
}
