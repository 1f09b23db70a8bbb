//! Framerate-independent exponential smoothing. One update moves a value a
//! compensated fraction of the remaining distance toward its target, so a
//! single step at `dt = 2h` matches two successive steps at `dt = h`.

use crate::{config::SmoothingConfig, mapper::ScrollState};

pub const NOMINAL_DT: f64 = 1.0 / 60.0;

/// One dt-compensated smoothing step with snap-to-target. `factor` is the
/// per-nominal-frame blend fraction in `(0, 1)`.
pub fn approach(
    current: f64,
    target: f64,
    factor: f64,
    dt: f64,
    target_fps: f64,
    snap_epsilon: f64,
) -> f64 {
    let blend = 1.0 - (1.0 - factor).powf(dt * target_fps);
    let next = current + (target - current) * blend;
    if (target - next).abs() < snap_epsilon {
        target
    } else {
        next
    }
}

/// Uncompensated per-tick step, for cosmetic quantities where a refresh-rate
/// dependent settle is acceptable.
pub fn approach_fixed(current: f64, target: f64, factor: f64, snap_epsilon: f64) -> f64 {
    let next = current + (target - current) * factor;
    if (target - next).abs() < snap_epsilon {
        target
    } else {
        next
    }
}

/// Clamp a raw timestamp delta into a usable dt: bounded above so a suspended
/// process does not lurch on resume, defaulting to one nominal frame when no
/// previous timestamp exists.
pub fn clamp_dt(raw: Option<f64>, max_dt: f64) -> f64 {
    match raw {
        Some(dt) => dt.clamp(0.0, max_dt),
        None => NOMINAL_DT,
    }
}

/// Advance all smoothed scroll-state fields toward their targets. Writes only
/// the `smooth_*` fields (single-writer rule; targets belong to the mapper).
pub fn advance(state: &mut ScrollState, cfg: &SmoothingConfig, dt: f64) {
    state.smooth_offset = approach(
        state.smooth_offset,
        state.raw_offset,
        cfg.scroll_factor,
        dt,
        cfg.target_fps,
        cfg.snap_epsilon_px,
    );
    state.smooth_progress = approach(
        state.smooth_progress,
        state.target_progress,
        cfg.playback_factor,
        dt,
        cfg.target_fps,
        cfg.snap_epsilon,
    );
    state.smooth_frame = approach(
        state.smooth_frame,
        state.target_frame as f64,
        cfg.playback_factor,
        dt,
        cfg.target_fps,
        cfg.snap_epsilon,
    );
}
