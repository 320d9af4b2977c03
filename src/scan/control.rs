//! Runtime control events
//!
//! UI handlers never touch the loop's configuration directly. They send
//! [`ControlEvent`]s through a [`ControlHandle`]; the loop drains the queue at
//! the start of each tick, so a change never lands mid-tick.

use super::crop::DisplayGeometry;
use crate::config::ScanMode;
use crate::error::{Result, ScanError};
use crate::source::BarcodeFormat;
use std::sync::mpsc::Sender;

/// A configuration change applied between ticks
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Toggle the grayscale stage
    SetGrayscale(bool),
    /// Toggle histogram equalization
    SetEqualize(bool),
    /// Toggle colour inversion
    SetInvert(bool),
    /// Toggle binary thresholding
    SetThreshold(bool),
    /// Toggle Otsu level selection before thresholding
    SetAutoThreshold(bool),
    /// Fixed threshold level
    SetThresholdValue(u8),
    /// Toggle the box blur
    SetBlur(bool),
    /// Box blur radius
    SetBlurRadius(u32),
    /// Zoom ratio; non-positive or non-finite values are ignored
    SetZoom(f64),
    /// Scanner-area shaping
    SetScanMode(ScanMode),
    /// Decoder format whitelist
    SetFormats(Vec<BarcodeFormat>),
    /// Ticks between decode attempts (at least 1)
    SetScanPeriod(u32),
    /// New display layout
    SetGeometry(DisplayGeometry),
    /// Stop streaming
    Stop,
}

/// Cloneable sender half of a scan loop's control queue
#[derive(Debug, Clone)]
pub struct ControlHandle {
    sender: Sender<ControlEvent>,
}

impl ControlHandle {
    pub(crate) fn new(sender: Sender<ControlEvent>) -> Self {
        Self { sender }
    }

    /// Queue `event` for the next tick.
    ///
    /// Fails with [`ScanError::NotStreaming`] once the loop has been dropped.
    pub fn send(&self, event: ControlEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| ScanError::NotStreaming)
    }

    /// Parse a comma-separated format list and queue it
    pub fn set_formats(&self, list: &str) -> Result<()> {
        let formats = BarcodeFormat::parse_list(list)?;
        self.send(ControlEvent::SetFormats(formats))
    }
}
