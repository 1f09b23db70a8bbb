use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, trace};

use crate::{
    config::SequenceSpec,
    error::{ScrollbookError, ScrollbookResult},
    fetch::{DecodedFrame, FrameFetcher, LoadOutcome},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameStatus {
    #[default]
    Unrequested,
    Loading,
    Ready,
}

/// Decode state for every index of the sequence.
///
/// Slots are write-once: a frame never leaves `Ready`. A failed load reverts
/// its slot to `Unrequested` so the loader's trickle phase can retry it.
/// Completions arrive on an internal channel and are only applied by
/// [`drain_completions`](Self::drain_completions), so all observable state
/// transitions happen synchronously within a tick.
pub struct FrameStore {
    spec: SequenceSpec,
    fetcher: Box<dyn FrameFetcher>,
    status: Vec<FrameStatus>,
    frames: Vec<Option<DecodedFrame>>,
    ready_count: usize,
    unrequested_count: usize,
    done_tx: Sender<LoadOutcome>,
    done_rx: Receiver<LoadOutcome>,
    first_ready_pending: bool,
    any_ready_seen: bool,
}

impl FrameStore {
    pub fn new(spec: SequenceSpec, fetcher: Box<dyn FrameFetcher>) -> ScrollbookResult<Self> {
        spec.validate()?;
        let n = spec.frame_count;
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            spec,
            fetcher,
            status: vec![FrameStatus::Unrequested; n],
            frames: vec![None; n],
            ready_count: 0,
            unrequested_count: n,
            done_tx,
            done_rx,
            first_ready_pending: false,
            any_ready_seen: false,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.spec.frame_count
    }

    pub fn status(&self, index: usize) -> FrameStatus {
        self.status.get(index).copied().unwrap_or_default()
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.status(index) == FrameStatus::Ready
    }

    pub fn ready_count(&self) -> usize {
        self.ready_count
    }

    /// True once no slot remains `Unrequested`. Failed loads revert slots, so
    /// this can flip back to false until the retry is issued.
    pub fn all_requested(&self) -> bool {
        self.unrequested_count == 0
    }

    /// Begin an asynchronous fetch+decode for `index`. Idempotent: a slot that
    /// is already `Loading` or `Ready` is left untouched and no duplicate
    /// network effect occurs.
    pub fn request_load(&mut self, index: usize) -> ScrollbookResult<()> {
        if index >= self.spec.frame_count {
            return Err(ScrollbookError::validation(format!(
                "frame index {index} out of range 0..{}",
                self.spec.frame_count
            )));
        }
        if self.status[index] != FrameStatus::Unrequested {
            return Ok(());
        }
        self.status[index] = FrameStatus::Loading;
        self.unrequested_count -= 1;
        let path = self.spec.frame_path(index);
        trace!(index, path = %path.display(), "frame fetch started");
        self.fetcher.begin_fetch(index, &path, self.done_tx.clone());
        Ok(())
    }

    /// Apply every completion that arrived since the previous tick. Returns
    /// the number of frames that became `Ready`.
    pub fn drain_completions(&mut self) -> usize {
        let mut landed = 0;
        while let Ok(outcome) = self.done_rx.try_recv() {
            let Some(slot) = self.status.get_mut(outcome.index) else {
                continue;
            };
            match outcome.result {
                Ok(frame) => {
                    if *slot == FrameStatus::Ready {
                        // Duplicate completion; the first write wins.
                        continue;
                    }
                    *slot = FrameStatus::Ready;
                    self.frames[outcome.index] = Some(frame);
                    self.ready_count += 1;
                    landed += 1;
                    if !self.any_ready_seen {
                        self.any_ready_seen = true;
                        self.first_ready_pending = true;
                        info!(index = outcome.index, "first frame ready");
                    }
                }
                Err(err) => {
                    if *slot == FrameStatus::Loading {
                        *slot = FrameStatus::Unrequested;
                        self.unrequested_count += 1;
                    }
                    debug!(index = outcome.index, %err, "frame load failed, retry eligible");
                }
            }
        }
        landed
    }

    /// One-shot signal consumed by the loop driver to run the initial draw.
    pub fn first_ready_just_landed(&mut self) -> bool {
        std::mem::take(&mut self.first_ready_pending)
    }

    /// The frame at `index` if `Ready`, else the closest ready neighbor by
    /// index distance, searching index−1, index+1, index−2, index+2, … so a
    /// tie deterministically prefers the lower index. `None` only while
    /// nothing at all is ready.
    pub fn nearest_ready(&self, index: usize) -> Option<(usize, &DecodedFrame)> {
        let n = self.spec.frame_count;
        let index = index.min(n.saturating_sub(1));
        if self.is_ready(index) {
            return self.frames[index].as_ref().map(|f| (index, f));
        }
        for dist in 1..n {
            if index >= dist {
                let lo = index - dist;
                if self.is_ready(lo) {
                    return self.frames[lo].as_ref().map(|f| (lo, f));
                }
            }
            let hi = index + dist;
            if hi < n && self.is_ready(hi) {
                return self.frames[hi].as_ref().map(|f| (hi, f));
            }
        }
        None
    }
}
