//! scan_pipeline - live-camera barcode scanning pipeline
//!
//! Crops each camera frame to a scanner area, enhances it with a
//! configurable filter chain, optionally isolates candidate regions, and
//! hands the result to a symbol decoder on a fixed cadence. Decoded result
//! points are projected back onto display overlays.
//!
//! The camera, decoder and display are collaborators behind traits in
//! [`source`]; the crate itself does no device IO.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Pipeline configuration and environment overrides
pub mod config;
/// Error taxonomy
pub mod error;
/// Image-enhancement filters and the filter chain
pub mod filters;
/// Core data structures (PixelBuffer, CropRect, ResultPoint, BinaryMask)
pub mod models;
/// Result point projection onto overlays
pub mod projector;
/// Region-of-interest extraction (contours, template matching)
pub mod region;
/// Scan loop state machine, crop derivation, controls and scheduling
pub mod scan;
/// Collaborator traits (camera, decoder, display)
pub mod source;
/// File IO, statistics and in-memory collaborators
pub mod tools;

pub use config::{ExtractorConfig, FilterConfig, ScanConfig, ScanMode};
pub use error::{Result, ScanError};
pub use filters::{FilterChain, FilterStage};
pub use models::{BinaryMask, CropRect, PixelBuffer, ResultPoint};
pub use projector::ResultProjector;
pub use region::{Candidate, RegionExtractor};
pub use scan::{ControlEvent, ControlHandle, FrameScheduler, LoopState, ScanLoop, TickOutcome};
pub use source::{
    BarcodeFormat, CameraSource, Decoded, DeviceInfo, DisplaySurface, SymbolDecoder,
};

/// Run the filter chain described by `config` over `buffer`.
///
/// Returns the threshold level in effect after the chain, which is the
/// Otsu-selected level when auto threshold is on.
pub fn enhance(buffer: &mut PixelBuffer, config: &FilterConfig) -> u8 {
    FilterChain::from_config(config).apply(buffer).threshold
}
