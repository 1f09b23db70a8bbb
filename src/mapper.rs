//! Deterministic scroll-position → playback-target mapping. No hidden state:
//! identical offset and extent always yield identical progress and frame.

/// Shared scroll state, single writer per field: the `raw_*`/`target_*`
/// fields are written only by [`retarget`]; the `smooth_*` fields only by
/// [`crate::smoothing::advance`]. Smoothed values approach targets
/// asymptotically and never overshoot beyond the snap epsilon.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub raw_offset: f64,
    pub max_extent: f64,
    pub target_progress: f64,
    pub target_frame: usize,
    pub smooth_offset: f64,
    pub smooth_progress: f64,
    pub smooth_frame: f64,
}

/// `clamp(offset / max_extent, 0, 1)`; zero when the content fits the
/// viewport (`max_extent <= 0`).
pub fn progress_for_offset(offset: f64, max_extent: f64) -> f64 {
    if max_extent <= 0.0 {
        return 0.0;
    }
    (offset / max_extent).clamp(0.0, 1.0)
}

/// `round(progress · (N−1))`, clamped into `[0, N−1]`.
pub fn frame_for_progress(progress: f64, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let last = (frame_count - 1) as f64;
    (progress.clamp(0.0, 1.0) * last).round().clamp(0.0, last) as usize
}

/// Recompute the target fields from a scroll or resize notification.
pub fn retarget(state: &mut ScrollState, offset: f64, max_extent: f64, frame_count: usize) {
    state.raw_offset = offset;
    state.max_extent = max_extent;
    state.target_progress = progress_for_offset(offset, max_extent);
    state.target_frame = frame_for_progress(state.target_progress, frame_count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_to_unit_interval() {
        assert_eq!(progress_for_offset(-50.0, 1000.0), 0.0);
        assert_eq!(progress_for_offset(0.0, 1000.0), 0.0);
        assert_eq!(progress_for_offset(500.0, 1000.0), 0.5);
        assert_eq!(progress_for_offset(1000.0, 1000.0), 1.0);
        assert_eq!(progress_for_offset(1500.0, 1000.0), 1.0);
    }

    #[test]
    fn zero_extent_forces_progress_zero() {
        assert_eq!(progress_for_offset(300.0, 0.0), 0.0);
        assert_eq!(progress_for_offset(300.0, -10.0), 0.0);
    }

    #[test]
    fn frame_mapping_scenarios_for_150_frames() {
        assert_eq!(frame_for_progress(0.0, 150), 0);
        assert_eq!(frame_for_progress(0.5, 150), 75); // round(0.5 * 149)
        assert_eq!(frame_for_progress(1.0, 150), 149);
    }

    #[test]
    fn frame_stays_in_range_across_the_sweep() {
        for n in [1usize, 2, 150] {
            for i in 0..=100 {
                let frame = frame_for_progress(i as f64 / 100.0, n);
                assert!(frame < n, "frame {frame} out of range for n={n}");
            }
        }
    }

    #[test]
    fn retarget_writes_only_target_fields() {
        let mut state = ScrollState {
            smooth_offset: 11.0,
            smooth_progress: 0.25,
            smooth_frame: 37.0,
            ..ScrollState::default()
        };
        retarget(&mut state, 500.0, 1000.0, 150);
        assert_eq!(state.target_progress, 0.5);
        assert_eq!(state.target_frame, 75);
        assert_eq!(state.smooth_offset, 11.0);
        assert_eq!(state.smooth_progress, 0.25);
        assert_eq!(state.smooth_frame, 37.0);
    }
}
