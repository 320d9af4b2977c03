//! Collaborator interfaces at the edge of the pipeline
//!
//! The pipeline never talks to hardware, a decoding engine, or a UI toolkit
//! directly. It drives three traits:
//! - [`CameraSource`] supplies frames and enumerates devices
//! - [`SymbolDecoder`] turns a bitmap into text plus result points
//! - [`DisplaySurface`] accepts overlay drawing commands

use crate::config::Color;
use crate::error::{Result, ScanError};
use crate::models::{PixelBuffer, ResultPoint};
use std::fmt;
use std::str::FromStr;

/// Kind of media device reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Camera
    VideoInput,
    /// Microphone
    AudioInput,
    /// Speaker
    AudioOutput,
}

/// An enumerated media device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Stable device identifier
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Device kind
    pub kind: DeviceKind,
}

impl DeviceInfo {
    /// Convenience constructor for a camera
    pub fn camera(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// Parameters for opening a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Exact device to open, or any camera when `None`
    pub device_id: Option<String>,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            device_id: None,
            width: 1920,
            height: 1080,
        }
    }
}

impl StreamConstraints {
    /// Same resolution request, pinned to `device`
    pub fn for_device(&self, device: &DeviceInfo) -> Self {
        Self {
            device_id: Some(device.id.clone()),
            ..self.clone()
        }
    }
}

/// Frame provider.
///
/// `close` must be idempotent: the scan loop calls it on every exit path,
/// including after a failed `open_stream`.
pub trait CameraSource {
    /// List available media devices
    fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>>;

    /// Acquire a stream; fails with [`ScanError::DeviceUnavailable`]
    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<()>;

    /// Most recent frame of the open stream, if one has arrived
    fn latest_frame(&mut self) -> Option<&PixelBuffer>;

    /// Release the stream (stop all tracks)
    fn close(&mut self);
}

/// Symbology understood by a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    Pdf417,
    QrCode,
    Rss14,
    RssExpanded,
    UpcA,
    UpcE,
    UpcEanExtension,
}

impl BarcodeFormat {
    /// Whitelist used when nothing else is configured
    pub const DEFAULT_FORMATS: [BarcodeFormat; 4] = [
        BarcodeFormat::Code128,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean13,
        BarcodeFormat::QrCode,
    ];

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aztec => "AZTEC",
            Self::Codabar => "CODABAR",
            Self::Code39 => "CODE_39",
            Self::Code93 => "CODE_93",
            Self::Code128 => "CODE_128",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Ean8 => "EAN_8",
            Self::Ean13 => "EAN_13",
            Self::Itf => "ITF",
            Self::MaxiCode => "MAXICODE",
            Self::Pdf417 => "PDF_417",
            Self::QrCode => "QR_CODE",
            Self::Rss14 => "RSS_14",
            Self::RssExpanded => "RSS_EXPANDED",
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::UpcEanExtension => "UPC_EAN_EXTENSION",
        }
    }

    /// Parse a comma-separated list of format names
    pub fn parse_list(list: &str) -> Result<Vec<BarcodeFormat>> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarcodeFormat {
    type Err = ScanError;

    /// Names are matched after trimming and upper-casing
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        const ALL: [BarcodeFormat; 17] = [
            BarcodeFormat::Aztec,
            BarcodeFormat::Codabar,
            BarcodeFormat::Code39,
            BarcodeFormat::Code93,
            BarcodeFormat::Code128,
            BarcodeFormat::DataMatrix,
            BarcodeFormat::Ean8,
            BarcodeFormat::Ean13,
            BarcodeFormat::Itf,
            BarcodeFormat::MaxiCode,
            BarcodeFormat::Pdf417,
            BarcodeFormat::QrCode,
            BarcodeFormat::Rss14,
            BarcodeFormat::RssExpanded,
            BarcodeFormat::UpcA,
            BarcodeFormat::UpcE,
            BarcodeFormat::UpcEanExtension,
        ];
        ALL.into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ScanError::InvalidFormat(s.to_string()))
    }
}

/// Opaque hints forwarded to the decoder on every call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodeHints {
    /// Allowed symbologies; empty means any
    pub formats: Vec<BarcodeFormat>,
}

/// A successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Decoded payload
    pub text: String,
    /// Located features, in the coordinates of the decoded buffer
    pub points: Vec<ResultPoint>,
}

/// Bitmap decoder.
///
/// Returning `Err(ScanError::NotFound)` is the normal "nothing this frame"
/// outcome.
pub trait SymbolDecoder {
    /// Decode a filtered buffer
    fn decode(&mut self, buffer: &PixelBuffer, hints: &DecodeHints) -> Result<Decoded>;
}

/// Overlay layer of the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// Full-frame overlay above the live video
    Display,
    /// Overlay above the cropped snapshot
    Snapshot,
}

/// Path of connected points
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// Vertices in drawing order
    pub points: Vec<ResultPoint>,
    /// Connect the last vertex back to the first
    pub closed: bool,
}

/// Sink for overlay drawing commands
pub trait DisplaySurface {
    /// Stroke a polyline on `overlay`
    fn draw_polyline(&mut self, overlay: Overlay, polyline: &Polyline, color: Color, line_width: f32);

    /// Erase everything drawn on `overlay`
    fn clear(&mut self, overlay: Overlay);

    /// Resize `overlay` to `width x height`
    fn resize(&mut self, overlay: Overlay, width: u32, height: u32);
}
