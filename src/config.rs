use std::{path::PathBuf, time::Duration};

use crate::{
    error::{ScrollbookError, ScrollbookResult},
    parallax::{Decoration, ParallaxLayer},
};

/// Where the frame sequence lives on disk and how its files are named.
///
/// Frame `index` (0-based in the engine) maps to a 1-based, zero-padded file
/// name: `base_dir/{prefix}{index + 1:0pad_width}.{extension}`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SequenceSpec {
    pub base_dir: PathBuf,
    pub prefix: String,
    pub pad_width: u8,
    pub extension: String,
    pub frame_count: usize,
}

impl Default for SequenceSpec {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("frames"),
            prefix: "frame_".to_string(),
            pad_width: 3,
            extension: "jpg".to_string(),
            frame_count: 150,
        }
    }
}

impl SequenceSpec {
    pub fn frame_path(&self, index: usize) -> PathBuf {
        let n = index + 1;
        let width = self.pad_width as usize;
        self.base_dir
            .join(format!("{}{:0width$}.{}", self.prefix, n, self.extension))
    }

    pub fn validate(&self) -> ScrollbookResult<()> {
        if self.frame_count == 0 {
            return Err(ScrollbookError::validation(
                "sequence frame_count must be >= 1",
            ));
        }
        if self.extension.is_empty() {
            return Err(ScrollbookError::validation(
                "sequence extension must be non-empty",
            ));
        }
        Ok(())
    }
}

/// Per-quantity exponential smoothing parameters.
///
/// Factors are the per-nominal-frame blend fraction; `target_fps` anchors the
/// dt compensation so playback speed does not depend on display refresh rate.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SmoothingConfig {
    /// Soft factor for the background scroll offset.
    pub scroll_factor: f64,
    /// Snappier factor shared by progress and the fractional frame position.
    pub playback_factor: f64,
    /// Cursor factor, applied per tick without dt compensation (cosmetic).
    pub cursor_factor: f64,
    pub target_fps: f64,
    /// Snap tolerance for normalized and frame-unit quantities.
    pub snap_epsilon: f64,
    /// Snap tolerance for pixel offsets.
    pub snap_epsilon_px: f64,
    /// Upper bound on dt, so a suspended process does not jump on resume.
    pub max_dt: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            scroll_factor: 0.09,
            playback_factor: 0.14,
            cursor_factor: 0.04,
            target_fps: 60.0,
            snap_epsilon: 1e-3,
            snap_epsilon_px: 0.5,
            max_dt: 0.1,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> ScrollbookResult<()> {
        for (name, f) in [
            ("scroll_factor", self.scroll_factor),
            ("playback_factor", self.playback_factor),
            ("cursor_factor", self.cursor_factor),
        ] {
            if !(0.0..1.0).contains(&f) || f == 0.0 {
                return Err(ScrollbookError::validation(format!(
                    "smoothing {name} must be in (0, 1)"
                )));
            }
        }
        if self.target_fps <= 0.0 {
            return Err(ScrollbookError::validation("target_fps must be > 0"));
        }
        if self.snap_epsilon <= 0.0 || self.snap_epsilon_px <= 0.0 {
            return Err(ScrollbookError::validation("snap epsilons must be > 0"));
        }
        if self.max_dt <= 0.0 {
            return Err(ScrollbookError::validation("max_dt must be > 0"));
        }
        Ok(())
    }
}

/// Progressive-loading strategy knobs (seed, proximity window, trickle).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoaderConfig {
    /// Evenly-spaced indices requested up front, before any scroll.
    pub seed_count: usize,
    /// Half-width of the window re-requested around the target frame.
    pub proximity_radius: usize,
    /// Still-unrequested indices picked up per pass, in index order.
    pub trickle_batch: usize,
    /// Interval between proximity/trickle passes.
    pub cadence: Duration,
    /// Ready-frame count at which the experience is considered revealable.
    pub min_ready: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            seed_count: 20,
            proximity_radius: 12,
            trickle_batch: 3,
            cadence: Duration::from_millis(80),
            min_ready: 25,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> ScrollbookResult<()> {
        if self.min_ready == 0 {
            return Err(ScrollbookError::validation("loader min_ready must be >= 1"));
        }
        if self.cadence.is_zero() {
            return Err(ScrollbookError::validation(
                "loader cadence must be non-zero",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompositorConfig {
    /// Device-pixel-ratio cap, bounding buffer memory on high-density displays.
    pub max_pixel_ratio: f64,
    /// Fill painted under the image, covering rounding-induced gaps.
    pub background_rgba: [u8; 4],
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            background_rgba: [18, 20, 28, 255],
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> ScrollbookResult<()> {
        if self.max_pixel_ratio < 1.0 {
            return Err(ScrollbookError::validation("max_pixel_ratio must be >= 1"));
        }
        Ok(())
    }
}

/// Who owns scroll physics: the native scrollbar, or the engine itself
/// (which then translates a content container and publishes its height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScrollMode {
    #[default]
    Native,
    Virtual,
}

/// How parallax layer displacement is expressed to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LayerPositioning {
    #[default]
    Transform,
    Margin,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub sequence: SequenceSpec,
    pub smoothing: SmoothingConfig,
    pub loader: LoaderConfig,
    pub compositor: CompositorConfig,
    pub scroll_mode: ScrollMode,
    pub layer_positioning: LayerPositioning,
    #[serde(default)]
    pub layers: Vec<ParallaxLayer>,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
}

impl EngineConfig {
    pub fn validate(&self) -> ScrollbookResult<()> {
        self.sequence.validate()?;
        self.smoothing.validate()?;
        self.loader.validate()?;
        self.compositor.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_one_indexed_and_padded() {
        let spec = SequenceSpec::default();
        assert_eq!(spec.frame_path(0), PathBuf::from("frames/frame_001.jpg"));
        assert_eq!(spec.frame_path(149), PathBuf::from("frames/frame_150.jpg"));

        let two = SequenceSpec {
            pad_width: 2,
            extension: "png".to_string(),
            ..SequenceSpec::default()
        };
        assert_eq!(two.frame_path(8), PathBuf::from("frames/frame_09.png"));
    }

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_factors_are_rejected() {
        let mut cfg = SmoothingConfig::default();
        cfg.playback_factor = 1.0;
        assert!(cfg.validate().is_err());
        cfg.playback_factor = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_frame_count_is_rejected() {
        let spec = SequenceSpec {
            frame_count: 0,
            ..SequenceSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sequence.frame_count, cfg.sequence.frame_count);
        assert_eq!(back.loader.seed_count, cfg.loader.seed_count);
    }
}
