use std::time::Duration;

use kurbo::Vec2;
use tracing::trace;

use crate::{
    compositor::{Compositor, Viewport},
    config::{EngineConfig, ScrollMode},
    error::ScrollbookResult,
    fetch::FrameFetcher,
    frame_store::FrameStore,
    loader::{ProgressiveLoader, Readiness},
    mapper::{self, ScrollState},
    parallax::{self, LayerPlacement},
    smoothing,
};

/// Running totals across ticks. `draws_elided` counts ticks where the rounded
/// smoothed frame already matched the displayed marker, i.e. redraw work that
/// the convergence check avoided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub draws: u64,
    pub draws_elided: u64,
}

/// What one tick decided, for the host to apply and for tests to observe.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub dt: f64,
    pub redrew: bool,
    pub displayed: Option<usize>,
    /// Virtual-scroll mode only: translation for the content container.
    pub content_shift: Option<f64>,
    /// Virtual-scroll mode only: full content height to publish so native
    /// scrollbars reflect true content length.
    pub content_height: Option<f64>,
    /// Per-layer placements, parallel to `EngineConfig::layers`.
    pub layers: Vec<LayerPlacement>,
    /// Per-decoration pixel offsets, parallel to `EngineConfig::decorations`.
    pub decorations: Vec<Vec2>,
    pub readiness: Readiness,
}

/// The animation loop driver. The host owns the clock and calls [`tick`]
/// (Engine::tick) once per display refresh; nothing in the tick path blocks,
/// and inputs arriving between ticks are coalesced into the latest targets.
pub struct Engine {
    cfg: EngineConfig,
    store: FrameStore,
    loader: ProgressiveLoader,
    compositor: Compositor,
    scroll: ScrollState,
    cursor_target: Vec2,
    cursor_smooth: Vec2,
    viewport: Viewport,
    pending_resize: bool,
    last_tick: Option<Duration>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(
        cfg: EngineConfig,
        fetcher: Box<dyn FrameFetcher>,
        viewport: Viewport,
    ) -> ScrollbookResult<Self> {
        cfg.validate()?;
        let mut store = FrameStore::new(cfg.sequence.clone(), fetcher)?;
        let loader = ProgressiveLoader::new(cfg.loader);
        loader.seed(&mut store)?;
        let compositor = Compositor::new(cfg.compositor, viewport);
        Ok(Self {
            cfg,
            store,
            loader,
            compositor,
            scroll: ScrollState::default(),
            cursor_target: Vec2::ZERO,
            cursor_smooth: Vec2::ZERO,
            viewport,
            pending_resize: false,
            last_tick: None,
            stats: EngineStats::default(),
        })
    }

    /// Scroll notification. Only target fields move; the smoothed values
    /// catch up over subsequent ticks.
    pub fn on_scroll(&mut self, offset: f64, max_extent: f64) {
        mapper::retarget(
            &mut self.scroll,
            offset,
            max_extent,
            self.cfg.sequence.frame_count,
        );
    }

    /// Resize notification. The viewport snapshot is taken whole and the
    /// scroll mapping is recomputed, since the maximum extent changed too.
    pub fn on_resize(&mut self, viewport: Viewport, max_extent: f64) {
        self.viewport = viewport;
        self.pending_resize = true;
        let raw_offset = self.scroll.raw_offset;
        mapper::retarget(
            &mut self.scroll,
            raw_offset,
            max_extent,
            self.cfg.sequence.frame_count,
        );
    }

    /// Pointer notification, normalized to `[-1, 1]²` (clamped here).
    pub fn on_cursor(&mut self, x: f64, y: f64) {
        self.cursor_target = parallax::clamp_cursor(Vec2::new(x, y));
    }

    /// Scroll destination for in-page anchor navigation, resolved in the
    /// untransformed layout coordinate space.
    pub fn anchor_offset(&self, layout_top: f64) -> f64 {
        layout_top.clamp(0.0, self.scroll.max_extent.max(0.0))
    }

    pub fn tick(&mut self, now: Duration) -> TickReport {
        let raw_dt = self
            .last_tick
            .and_then(|last| now.checked_sub(last))
            .map(|d| d.as_secs_f64());
        let dt = smoothing::clamp_dt(raw_dt, self.cfg.smoothing.max_dt);
        self.last_tick = Some(now);

        // Resize before anything that depends on buffer dimensions.
        if self.pending_resize {
            self.compositor.resize(self.viewport);
            self.pending_resize = false;
        }

        self.store.drain_completions();
        if self.store.first_ready_just_landed() {
            // One-time surface initialization once there is anything to show;
            // invalidating the marker makes this tick the initial draw.
            self.compositor.resize(self.viewport);
        }

        smoothing::advance(&mut self.scroll, &self.cfg.smoothing, dt);

        let (content_shift, content_height) = match self.cfg.scroll_mode {
            ScrollMode::Native => (None, None),
            ScrollMode::Virtual => (
                Some(-self.scroll.smooth_offset),
                Some(self.scroll.max_extent.max(0.0) + self.viewport.height as f64),
            ),
        };
        let layers = self
            .cfg
            .layers
            .iter()
            .map(|layer| {
                parallax::layer_placement(
                    layer,
                    self.scroll.smooth_offset,
                    self.cfg.layer_positioning,
                )
            })
            .collect();

        let last = self.cfg.sequence.frame_count.saturating_sub(1);
        let rounded = (self.scroll.smooth_frame.round().max(0.0) as usize).min(last);
        let mut redrew = false;
        if Some(rounded) != self.compositor.displayed() {
            if self.compositor.draw(rounded, &self.store) {
                self.compositor.present();
                self.stats.draws += 1;
                redrew = true;
                trace!(frame = rounded, "presented frame");
            }
        } else {
            self.stats.draws_elided += 1;
        }

        let eps = self.cfg.smoothing.snap_epsilon;
        let f = self.cfg.smoothing.cursor_factor;
        self.cursor_smooth = Vec2::new(
            smoothing::approach_fixed(self.cursor_smooth.x, self.cursor_target.x, f, eps),
            smoothing::approach_fixed(self.cursor_smooth.y, self.cursor_target.y, f, eps),
        );
        let decorations = self
            .cfg
            .decorations
            .iter()
            .map(|d| parallax::decoration_offset(d, self.cursor_smooth))
            .collect();

        // Load failures revert slots silently; the next pass retries them.
        let _ = self
            .loader
            .poll(now, self.scroll.target_frame, &mut self.store);
        let readiness = self.loader.readiness(&self.store);

        self.stats.ticks += 1;
        TickReport {
            dt,
            redrew,
            displayed: self.compositor.displayed(),
            content_shift,
            content_height,
            layers,
            decorations,
            readiness,
        }
    }

    /// The visible surface: physical dimensions plus premultiplied RGBA8.
    pub fn frame_buffer(&self) -> (u32, u32, &[u8]) {
        let (w, h) = self.compositor.dimensions();
        (w, h, self.compositor.front())
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn loading_complete(&self) -> bool {
        self.loader.is_complete()
    }
}
