//! MPEG-4 audio (ISO/IEC 14496-3) configuration helpers

mod config;

pub use config::{AudioSpecificConfig, ObjectType, SAMPLING_FREQUENCIES};
