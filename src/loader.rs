use std::time::Duration;

use tracing::debug;

use crate::{config::LoaderConfig, error::ScrollbookResult, frame_store::FrameStore};

/// Liveness signal for the page-load indicator. `fraction` counts any ready
/// frames against `min_ready`; `reveal` latches true and never unlatches.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Readiness {
    pub fraction: f64,
    pub reveal: bool,
}

/// Evenly-spaced seed indices across `[0, frame_count)`:
/// `round(i·(N−1)/(k−1))` for `i in [0, k)`. May contain duplicates when
/// `seed_count` exceeds `frame_count`; requests are idempotent anyway.
pub fn seed_indices(frame_count: usize, seed_count: usize) -> Vec<usize> {
    if frame_count == 0 || seed_count == 0 {
        return Vec::new();
    }
    if seed_count == 1 || frame_count == 1 {
        return vec![0];
    }
    let last = (frame_count - 1) as f64;
    let step = last / (seed_count - 1) as f64;
    (0..seed_count)
        .map(|i| (i as f64 * step).round().min(last) as usize)
        .collect()
}

/// Two-phase progressive loading: an immediate evenly-spaced seed, then a
/// recurring proximity window around the target frame plus a small trickle of
/// still-unrequested indices, until every slot has been requested at least
/// once. The recurring pass is a re-armed scheduled task with an explicit
/// completion state rather than an open-ended interval.
pub struct ProgressiveLoader {
    cfg: LoaderConfig,
    next_pass: Option<Duration>,
    reveal_latched: bool,
}

impl ProgressiveLoader {
    pub fn new(cfg: LoaderConfig) -> Self {
        Self {
            cfg,
            next_pass: Some(Duration::ZERO),
            reveal_latched: false,
        }
    }

    /// Phase 1: request coarse coverage before any scroll occurs.
    pub fn seed(&self, store: &mut FrameStore) -> ScrollbookResult<()> {
        for index in seed_indices(store.frame_count(), self.cfg.seed_count) {
            store.request_load(index)?;
        }
        Ok(())
    }

    /// Phase 2 pass, re-armed on the configured cadence. Re-requests the whole
    /// window around `target` every pass so close indices win races against
    /// far ones, then picks up a few unrequested stragglers in index order.
    pub fn poll(
        &mut self,
        now: Duration,
        target: usize,
        store: &mut FrameStore,
    ) -> ScrollbookResult<()> {
        let due = match self.next_pass {
            Some(due) => due,
            // A failed load can revert a slot after coverage completed; the
            // cadence re-arms so the slot stays retry-eligible.
            None if !store.all_requested() => now,
            None => return Ok(()),
        };
        if now < due {
            return Ok(());
        }
        self.next_pass = Some(now + self.cfg.cadence);

        let n = store.frame_count();
        let target = target.min(n.saturating_sub(1));
        let lo = target.saturating_sub(self.cfg.proximity_radius);
        let hi = (target + self.cfg.proximity_radius).min(n.saturating_sub(1));
        for index in lo..=hi {
            store.request_load(index)?;
        }

        let mut picked = 0;
        for index in 0..n {
            if picked >= self.cfg.trickle_batch {
                break;
            }
            if store.status(index) == crate::frame_store::FrameStatus::Unrequested {
                store.request_load(index)?;
                picked += 1;
            }
        }

        if store.all_requested() {
            self.next_pass = None;
            debug!("frame request coverage complete, proximity cadence stopped");
        }
        Ok(())
    }

    /// True once the recurring cadence has self-terminated.
    pub fn is_complete(&self) -> bool {
        self.next_pass.is_none()
    }

    pub fn readiness(&mut self, store: &FrameStore) -> Readiness {
        if store.ready_count() >= self.cfg.min_ready {
            self.reveal_latched = true;
        }
        Readiness {
            fraction: (store.ready_count() as f64 / self.cfg.min_ready as f64).min(1.0),
            reveal: self.reveal_latched,
        }
    }
}
