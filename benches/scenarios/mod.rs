//! Real-world scenario benchmarks.
//!
//! These model an actual session: several tracks of clips through the live
//! mixer, and the full render + encode path of an export.

mod export;
mod mixer;

pub use export::bench_export;
pub use mixer::bench_mixer;
