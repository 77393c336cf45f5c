pub mod backend; // Host audio abstraction (cpal, manual clock)
pub mod buffer;
pub mod config;
pub mod dsp;
pub mod engine; // Control surface: tracks, transport, capture, export
pub mod error;
pub mod graph; // Audio-thread mixing graph
pub mod io;

pub use backend::{AudioBackend, CpalBackend, ManualBackend};
pub use buffer::AudioBuffer;
pub use config::{EngineConfig, StopMode};
pub use engine::{
    mixdown::{ExportProgress, ExportStage},
    subscribe::{SubscriptionId, TransportUpdate},
    track::{Clip, TrackId, TrackKind, TrackView},
    Engine, Stem,
};
pub use error::{EngineError, Result};
pub use io::export::{BlobSink, EncodedBlob, UploadMeta, UploadPart, Uploader};

pub const MAX_BLOCK_SIZE: usize = 2048;
