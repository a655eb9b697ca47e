// tests/end_to_end.rs
//! Full sessions on the synchronous loop, driven through a headless surface.

mod support;

use divergence_meter::config::Config;
use divergence_meter::display::HeadlessSurface;
use divergence_meter::display_loop::LoopState;
use divergence_meter::error::DivergenceError;
use divergence_meter::keys::KeyInput;
use divergence_meter::session::Session;
use test_log::test;

fn values(list: &[&str]) -> Vec<String> {
    list.iter().map(|v| v.to_string()).collect()
}

#[test]
fn demo_presents_each_value_once_then_stops() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new();

    let report = session
        .demo(&values(&["1.048596", "3.1415926", "10086"]), 0, &mut surface)
        .unwrap();

    assert_eq!(report.frames_presented, 3);
    assert_eq!(report.final_state, LoopState::Stopped);
    assert_eq!(surface.values(), vec!["1.048596", "3.1415926", "10086"]);
    assert_eq!(surface.presentations(), 3);
    assert!(surface.is_closed());
    assert_eq!(surface.window_name(), Some("divergence meter"));
}

#[test]
fn presented_frames_match_direct_composition() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new();
    session
        .demo(&values(&["23.59.59", "0.000001"]), 0, &mut surface)
        .unwrap();

    for frame in surface.frames() {
        let expected = session.compositor().compose(frame.value()).unwrap();
        assert_eq!(frame.as_raw(), expected.as_raw(), "{}", frame.value());
        // Digits are 6 px, points 3 px, plus 2 x 104 of border.
        let points = frame.value().matches('.').count() as u32;
        let digits = frame.value().len() as u32 - points;
        assert_eq!(frame.width(), 6 * digits + 3 * points + 208);
        assert_eq!(frame.height(), 10 + 2 * 76);
    }
}

#[test]
fn save_writes_the_presented_frame() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new().with_key_after(1, KeyInput::char('s'));

    let report = session.demo(&values(&["42"]), 0, &mut surface).unwrap();
    assert_eq!(report.frames_saved, 1);

    let path = dir.path().join("divergence meter.png");
    assert_eq!(surface.saved_paths(), &[path.clone()]);
    let decoded = image::open(&path).unwrap().to_rgb8();
    let expected = session.compositor().compose("42").unwrap();
    assert_eq!(decoded.dimensions(), (expected.width(), expected.height()));
    assert_eq!(decoded.as_raw(), expected.as_raw());
}

#[test]
fn failed_save_keeps_the_loop_running() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(&dir.path().join("missing").join("deeper"));
    let mut surface = HeadlessSurface::new().with_key_after(1, KeyInput::char('s'));

    let report = session.demo(&values(&["1", "2", "3"]), 0, &mut surface).unwrap();
    assert_eq!(report.frames_presented, 3);
    assert_eq!(report.frames_saved, 0);
    assert!(surface.saved_paths().is_empty());
}

#[test]
fn pause_then_resume_continues_with_the_next_value() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new()
        .with_key_after(1, KeyInput::char(' '))
        .with_key_after(1, KeyInput::char('k'));

    let report = session.demo(&values(&["1", "2", "3"]), 0, &mut surface).unwrap();
    assert_eq!(report.frames_presented, 3);
    assert_eq!(surface.values(), vec!["1", "2", "3"]);
}

#[test]
fn closed_surface_ends_an_endless_meter() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.appearance.save_dir = dir.path().to_path_buf();
    config.meter.random_seed = Some(2024);
    let session = Session::with_atlas(config, support::atlas());
    let mut surface = HeadlessSurface::new().close_after(25);

    let report = session.meter(&mut surface).unwrap();
    assert_eq!(report.frames_presented, 25);
    assert_eq!(report.final_state, LoopState::Stopped);
    for value in surface.values() {
        assert_eq!(value.len(), 8, "{value}");
        assert_eq!(value.as_bytes()[1], b'.', "{value}");
    }
}

#[test]
fn ctrl_c_quits_the_clock() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new().with_key_after(2, KeyInput::ctrl('c'));

    let report = session.clock(&mut surface).unwrap();
    assert_eq!(report.frames_presented, 2);
    assert_eq!(surface.window_name(), Some("divergence clock"));
    for value in surface.values() {
        let bytes = value.as_bytes();
        assert_eq!((bytes.len(), bytes[2], bytes[5]), (8, b'.', b'.'), "{value}");
    }
}

#[test]
fn demo_rejects_undisplayable_values_before_showing_anything() {
    let dir = tempfile::tempdir().unwrap();
    let session = support::session_saving_to(dir.path());
    let mut surface = HeadlessSurface::new();

    let result = session.demo(&values(&["1", "1a"]), 0, &mut surface);
    assert!(matches!(result, Err(DivergenceError::UnknownGlyph('a'))));
    assert_eq!(surface.presentations(), 0);
}

#[test]
fn session_loads_assets_from_disk() {
    let assets = tempfile::tempdir().unwrap();
    support::write_assets(assets.path());
    let mut config = Config::default();
    config.appearance.glyph_dir = assets.path().to_path_buf();

    let session = Session::new(config).unwrap();
    let frame = session.compositor().compose("1.0").unwrap();
    let expected = support::session_saving_to(assets.path())
        .compositor()
        .compose("1.0")
        .unwrap();
    assert_eq!(frame.as_raw(), expected.as_raw());
}

#[test]
fn missing_assets_fail_at_startup() {
    let assets = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.appearance.glyph_dir = assets.path().to_path_buf();
    assert!(matches!(
        Session::new(config),
        Err(DivergenceError::AssetMissing { ch: '0', .. })
    ));
}
