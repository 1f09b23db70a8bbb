use std::{path::Path, sync::Arc};

use anyhow::Context;
use crossbeam_channel::Sender;

use crate::error::ScrollbookResult;

/// One decoded still, write-once. Pixels are premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Completion message for one fetch+decode, delivered out-of-band and
/// drained by the frame store once per tick.
#[derive(Debug)]
pub struct LoadOutcome {
    pub index: usize,
    pub result: ScrollbookResult<DecodedFrame>,
}

/// Pluggable frame transport. Implementations must not block the caller;
/// exactly one [`LoadOutcome`] per accepted request eventually arrives on
/// `done`. A dropped receiver is not an error (the send result is ignored).
pub trait FrameFetcher {
    fn begin_fetch(&self, index: usize, path: &Path, done: Sender<LoadOutcome>);
}

/// Reads frames from the filesystem, decoding on a short-lived worker thread
/// per request. Request pacing is the progressive loader's job, so the number
/// of in-flight workers stays bounded by its window sizes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsFetcher;

impl FrameFetcher for FsFetcher {
    fn begin_fetch(&self, index: usize, path: &Path, done: Sender<LoadOutcome>) {
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let result = std::fs::read(&path)
                .with_context(|| format!("read frame '{}'", path.display()))
                .map_err(Into::into)
                .and_then(|bytes| decode_frame(&bytes));
            let _ = done.send(LoadOutcome { index, result });
        });
    }
}

/// Procedurally generated frames with synchronous completion. Used by the CLI
/// when no sequence directory is available, and by tests that need
/// deterministic instant loads.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticFetcher {
    pub width: u32,
    pub height: u32,
}

impl SyntheticFetcher {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl FrameFetcher for SyntheticFetcher {
    fn begin_fetch(&self, index: usize, _path: &Path, done: Sender<LoadOutcome>) {
        let (w, h) = (self.width, self.height);
        let mut pixels = vec![0u8; w as usize * h as usize * 4];
        // Vertical gradient keyed by index so consecutive frames differ.
        let key = (index as u32).wrapping_mul(97) % 256;
        for y in 0..h {
            let shade = ((y * 255) / h.max(1)) as u8;
            for x in 0..w {
                let off = (y as usize * w as usize + x as usize) * 4;
                pixels[off] = key as u8;
                pixels[off + 1] = shade;
                pixels[off + 2] = 255 - shade;
                pixels[off + 3] = 255;
            }
        }
        let _ = done.send(LoadOutcome {
            index,
            result: Ok(DecodedFrame {
                width: w,
                height: h,
                rgba8_premul: Arc::new(pixels),
            }),
        });
    }
}

pub fn decode_frame(bytes: &[u8]) -> ScrollbookResult<DecodedFrame> {
    let dyn_img = image::load_from_memory(bytes).context("decode frame from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedFrame {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
