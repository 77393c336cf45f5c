//! Benchmarks for low-level DSP primitives.

mod amplify;
mod meter;
mod pan;

pub use amplify::bench_amplify;
pub use meter::bench_meter;
pub use pan::bench_pan;
