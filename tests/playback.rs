use std::time::Duration;

use scrollbook::{Engine, EngineConfig, ScrollMode, SyntheticFetcher, Viewport};

fn engine(cfg: EngineConfig, viewport: Viewport) -> Engine {
    let (w, h) = viewport.physical(cfg.compositor.max_pixel_ratio);
    Engine::new(cfg, Box::new(SyntheticFetcher::new(w, h)), viewport).unwrap()
}

fn t(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Tick at a steady 60Hz until `stop` says so or the budget runs out.
fn run_until(e: &mut Engine, start_ms: u64, budget: u64, mut stop: impl FnMut(&Engine) -> bool) -> u64 {
    for i in 0..budget {
        e.tick(t(start_ms + i * 16));
        if stop(e) {
            return start_ms + (i + 1) * 16;
        }
    }
    start_ms + budget * 16
}

#[test]
fn mid_scroll_settles_on_the_mapped_frame() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));
    e.on_scroll(500.0, 1000.0);
    assert_eq!(e.scroll_state().target_frame, 75);

    run_until(&mut e, 0, 600, |e| {
        e.scroll_state().smooth_frame == 75.0
    });
    assert_eq!(e.scroll_state().smooth_progress, 0.5);

    let (_, _, pixels) = e.frame_buffer();
    assert!(!pixels.is_empty());
}

#[test]
fn converged_playback_elides_every_draw() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));
    e.on_scroll(500.0, 1000.0);
    let end = run_until(&mut e, 0, 600, |e| e.scroll_state().smooth_frame == 75.0);

    // One extra tick so the converged value has definitely been presented.
    e.tick(t(end));
    let settled = e.stats();

    for i in 1..=20 {
        let report = e.tick(t(end + i * 16));
        assert!(!report.redrew);
        assert_eq!(report.displayed, Some(75));
    }
    let after = e.stats();
    assert_eq!(after.draws, settled.draws);
    assert_eq!(after.draws_elided, settled.draws_elided + 20);
}

#[test]
fn scroll_extremes_map_to_first_and_last_frame() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));

    e.on_scroll(0.0, 1000.0);
    run_until(&mut e, 0, 100, |e| e.scroll_state().smooth_frame == 0.0);
    e.tick(t(100 * 16));
    assert_eq!(e.scroll_state().target_frame, 0);

    e.on_scroll(1000.0, 1000.0);
    let end = run_until(&mut e, 2000, 600, |e| e.scroll_state().smooth_frame == 149.0);
    e.tick(t(end));
    let report = e.tick(t(end + 16));
    assert_eq!(report.displayed, Some(149));
}

#[test]
fn content_shorter_than_viewport_pins_frame_zero() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));
    e.on_scroll(640.0, 0.0);
    let report = e.tick(t(0));
    assert_eq!(e.scroll_state().target_progress, 0.0);
    assert_eq!(e.scroll_state().target_frame, 0);
    assert_eq!(report.displayed, Some(0));
}

#[test]
fn resize_forces_exactly_one_redraw() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));
    e.on_scroll(500.0, 1000.0);
    let end = run_until(&mut e, 0, 600, |e| e.scroll_state().smooth_frame == 75.0);
    e.tick(t(end));
    let before = e.stats();

    e.on_resize(Viewport::new(128, 72, 1.0), 1000.0);
    let report = e.tick(t(end + 16));
    assert!(report.redrew, "resize must invalidate the displayed marker");
    assert_eq!(report.displayed, Some(75));

    let (w, h, _) = e.frame_buffer();
    assert_eq!((w, h), (128, 72));

    let report = e.tick(t(end + 32));
    assert!(!report.redrew);
    assert_eq!(e.stats().draws, before.draws + 1);
}

#[test]
fn pixel_ratio_is_capped_at_two() {
    let e = engine(EngineConfig::default(), Viewport::new(100, 50, 3.0));
    let (w, h, pixels) = e.frame_buffer();
    assert_eq!((w, h), (200, 100));
    assert_eq!(pixels.len(), 200 * 100 * 4);
}

#[test]
fn direction_reversal_mid_flight_lands_on_the_latest_target() {
    let mut e = engine(EngineConfig::default(), Viewport::new(64, 36, 1.0));
    e.on_scroll(900.0, 1000.0);
    for i in 0..10 {
        e.tick(t(i * 16));
    }
    // Interrupt the approach and scrub back up.
    e.on_scroll(100.0, 1000.0);
    let end = run_until(&mut e, 160, 600, |e| {
        e.scroll_state().smooth_frame == e.scroll_state().target_frame as f64
    });
    e.tick(t(end));
    assert_eq!(e.scroll_state().target_frame, 15); // round(0.1 * 149)
    let report = e.tick(t(end + 16));
    assert_eq!(report.displayed, Some(15));
}

#[test]
fn virtual_scroll_reports_shift_and_height_each_tick() {
    let cfg = EngineConfig {
        scroll_mode: ScrollMode::Virtual,
        ..EngineConfig::default()
    };
    let mut e = engine(cfg, Viewport::new(64, 36, 1.0));
    e.on_scroll(300.0, 3000.0);
    let mut last_shift = 0.0;
    for i in 0..120 {
        let report = e.tick(t(i * 16));
        let shift = report.content_shift.expect("virtual mode always shifts");
        assert!(shift <= 0.0 && shift >= -300.0);
        assert!(shift <= last_shift);
        last_shift = shift;
        assert_eq!(report.content_height, Some(3036.0));
    }
    assert_eq!(last_shift, -300.0);
}

#[test]
fn cursor_sway_moves_decorations_within_bounds() {
    let cfg = EngineConfig {
        decorations: vec![scrollbook::Decoration {
            name: "leaf".to_string(),
            sway: kurbo::Vec2::new(20.0, 10.0),
        }],
        ..EngineConfig::default()
    };
    let mut e = engine(cfg, Viewport::new(64, 36, 1.0));
    e.on_cursor(5.0, -5.0); // clamped to (1, -1)
    let mut last = kurbo::Vec2::ZERO;
    for i in 0..2_000 {
        let report = e.tick(t(i * 16));
        last = report.decorations[0];
        assert!(last.x <= 20.0 && last.y >= -10.0);
    }
    assert_eq!(last, kurbo::Vec2::new(20.0, -10.0));
}
