pub mod cell;
pub mod config;
pub mod dead_zone;
pub mod error;
pub mod feed;
pub mod grid;
pub mod interpolation;
pub mod pipeline;
pub mod session;
pub mod smoothing;
pub mod snapshot;
pub mod stats;
pub mod storage;
pub mod store;
pub mod types;

pub use cell::{CellMap, HeatmapCell};
pub use config::HeatmapConfiguration;
pub use dead_zone::{DeadZone, DeadZoneDetector};
pub use error::{HResult, HeatmapError};
pub use feed::{spawn_feed, CaptureEvent, CaptureFeed, FeedReport};
pub use grid::{GridCoordinate, GridIndex};
pub use interpolation::Interpolator;
pub use pipeline::{HeatmapPipeline, PipelineOutput};
pub use session::{HeatmapRecorder, SessionState, SharedRecorder};
pub use smoothing::CellSmoother;
pub use snapshot::{CellView, HeatmapSnapshot};
pub use stats::{HeatmapStatistics, RecordingWindow, StatisticsCalculator};
pub use store::SampleStore;
pub use types::{Sample, SampleKind, SampleLabels, SignalQuality};
