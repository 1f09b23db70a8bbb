#![forbid(unsafe_code)]

pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod frame_store;
pub mod loader;
pub mod mapper;
pub mod parallax;
pub mod smoothing;

pub use compositor::{Compositor, Viewport};
pub use config::{
    CompositorConfig, EngineConfig, LayerPositioning, LoaderConfig, ScrollMode, SequenceSpec,
    SmoothingConfig,
};
pub use engine::{Engine, EngineStats, TickReport};
pub use error::{ScrollbookError, ScrollbookResult};
pub use fetch::{DecodedFrame, FrameFetcher, FsFetcher, LoadOutcome, SyntheticFetcher};
pub use frame_store::{FrameStatus, FrameStore};
pub use loader::{ProgressiveLoader, Readiness, seed_indices};
pub use parallax::{Decoration, LayerPlacement, ParallaxLayer};
