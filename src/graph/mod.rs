//! The mixing graph: clip voices feeding per-track chains feeding a master bus.
//!
//! Every node here runs on the audio thread (or inside an offline render).
//! Control state lives in `engine`; it reaches the graph only as
//! [`mixer::MixerCommand`]s sent through a lock-free ring.

/// Per-track tap → pan → gain chain.
pub mod chain;
/// Fader node.
pub mod gain;
/// Master bus, command ring and control handle.
pub mod mixer;
/// Core traits shared by all graph nodes.
pub mod node;
/// Offline (faster than realtime) mixdown.
pub mod offline;
/// Stereo panner node.
pub mod pan;
/// One-shot clip playback voices.
pub mod source;
/// Analysis taps feeding the level meters.
pub mod tap;
