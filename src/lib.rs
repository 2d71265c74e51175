//! initseg - fragmented MP4 init segment tooling
//!
//! This library crate exposes the CLI's configuration and reporting layers
//! for integration testing. The codec itself lives in `initseg-fmp4`.

pub mod config;
pub mod summary;
