use tracing::debug;

use crate::{config::CompositorConfig, fetch::DecodedFrame, frame_store::FrameStore};

/// Coherent snapshot of the host surface: logical size plus device-pixel
/// ratio, captured together per resize event so width and height can never
/// disagree about scale.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Physical buffer dimensions with the pixel ratio capped.
    pub fn physical(&self, max_pixel_ratio: f64) -> (u32, u32) {
        let ratio = self.pixel_ratio.clamp(1.0, max_pixel_ratio.max(1.0));
        let w = ((self.width as f64) * ratio).round().max(1.0) as u32;
        let h = ((self.height as f64) * ratio).round().max(1.0) as u32;
        (w, h)
    }
}

/// Double-buffered CPU surface. `draw` renders the nearest-ready frame into
/// the back buffer; `present` copies it onto the front buffer in one
/// operation, so a partially-drawn frame is never visible.
pub struct Compositor {
    cfg: CompositorConfig,
    width: u32,
    height: u32,
    back: Vec<u8>,
    front: Vec<u8>,
    displayed: Option<usize>,
}

impl Compositor {
    pub fn new(cfg: CompositorConfig, viewport: Viewport) -> Self {
        let mut c = Self {
            cfg,
            width: 0,
            height: 0,
            back: Vec::new(),
            front: Vec::new(),
            displayed: None,
        };
        c.resize(viewport);
        c
    }

    /// Recreate both buffers at the viewport's physical size and invalidate
    /// the displayed-frame marker so the next tick force-redraws. Runs
    /// synchronously; no draw can observe a stale size.
    pub fn resize(&mut self, viewport: Viewport) {
        let (w, h) = viewport.physical(self.cfg.max_pixel_ratio);
        self.width = w;
        self.height = h;
        let len = w as usize * h as usize * 4;
        self.back = vec![0; len];
        self.front = vec![0; len];
        fill(&mut self.back, self.cfg.background_rgba);
        fill(&mut self.front, self.cfg.background_rgba);
        self.displayed = None;
        debug!(width = w, height = h, "compositor surface resized");
    }

    /// Index blitted to the visible surface, or `None` before the first draw
    /// and after every resize.
    pub fn displayed(&self) -> Option<usize> {
        self.displayed
    }

    /// Physical buffer dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The visible surface as premultiplied RGBA8.
    pub fn front(&self) -> &[u8] {
        &self.front
    }

    /// Render the nearest-ready frame for `index` into the back buffer:
    /// background fill first, then a cover-fit blit. Returns false (leaving
    /// previous visible content intact) while no frame at all is ready.
    pub fn draw(&mut self, index: usize, store: &FrameStore) -> bool {
        let Some((_, frame)) = store.nearest_ready(index) else {
            return false;
        };
        fill(&mut self.back, self.cfg.background_rgba);
        blit_cover(&mut self.back, self.width, self.height, frame);
        self.displayed = Some(index);
        true
    }

    /// Copy the whole back buffer onto the visible surface.
    pub fn present(&mut self) {
        self.front.copy_from_slice(&self.back);
    }
}

fn fill(buf: &mut [u8], rgba: [u8; 4]) {
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

/// Cover-fit: scale so the image fully fills the destination, preserving
/// aspect ratio and cropping the overflowing axis, centered. Nearest-neighbor
/// sampling; source coordinates are clamped so rounding at the edges can
/// never read out of bounds.
fn blit_cover(dst: &mut [u8], dw: u32, dh: u32, frame: &DecodedFrame) {
    if dw == 0 || dh == 0 || frame.width == 0 || frame.height == 0 {
        return;
    }
    let (iw, ih) = (frame.width as f64, frame.height as f64);
    let scale = f64::max(dw as f64 / iw, dh as f64 / ih);
    let ox = (dw as f64 - iw * scale) / 2.0;
    let oy = (dh as f64 - ih * scale) / 2.0;

    let src = frame.rgba8_premul.as_slice();
    let src_row = frame.width as usize * 4;
    for y in 0..dh {
        let sy = (((y as f64 + 0.5 - oy) / scale).floor())
            .clamp(0.0, ih - 1.0) as usize;
        let src_base = sy * src_row;
        let dst_base = y as usize * dw as usize * 4;
        for x in 0..dw {
            let sx = (((x as f64 + 0.5 - ox) / scale).floor())
                .clamp(0.0, iw - 1.0) as usize;
            let s = src_base + sx * 4;
            let d = dst_base + x as usize * 4;
            dst[d..d + 4].copy_from_slice(&src[s..s + 4]);
        }
    }
}
