//! Pipeline configuration
//!
//! `FilterConfig` and friends are plain values. The scan loop reads them at
//! the start of each tick; runtime changes arrive as
//! [`ControlEvent`](crate::scan::ControlEvent)s applied between ticks.
//! [`ScanConfig::from_env`] overlays `SCAN_*` environment variables on the
//! defaults.

use crate::models::PixelBuffer;
use crate::source::{BarcodeFormat, StreamConstraints};
use std::time::Duration;

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

/// Which image-enhancement stages run each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Average R,G,B into a gray level
    pub grayscale: bool,
    /// Histogram equalization on the red channel
    pub equalize: bool,
    /// Invert R,G,B
    pub invert_color: bool,
    /// Binary threshold
    pub threshold: bool,
    /// Box blur
    pub blur: bool,
    /// Box blur radius in pixels
    pub blur_radius: u32,
    /// Box blur repeat count
    pub blur_quality: u32,
    /// Fixed threshold used when `auto_threshold` is off
    pub threshold_value: u8,
    /// Select the threshold with Otsu's method before thresholding
    pub auto_threshold: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            equalize: false,
            invert_color: true,
            threshold: true,
            blur: false,
            blur_radius: 10,
            blur_quality: 1,
            threshold_value: 0,
            auto_threshold: true,
        }
    }
}

/// How the region extractor binarizes its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// Otsu threshold computed per buffer
    Otsu,
    /// Fixed gray level
    Fixed(u8),
}

/// How many extracted candidates are handed to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidatePolicy {
    /// Stop at the first candidate that decodes
    #[default]
    First,
    /// Decode every candidate, drawing the last success
    All,
}

/// Region-of-interest strategy
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExtractionStrategy {
    /// Decode the whole filtered crop
    #[default]
    None,
    /// Square-ish external contours
    Contours,
    /// Best normalized cross-correlation match of a template
    Template(PixelBuffer),
}

/// Region extractor tuning
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Strategy run on scan ticks
    pub strategy: ExtractionStrategy,
    /// Binarization policy
    pub threshold: ThresholdPolicy,
    /// Dark pixels are foreground
    pub dark_foreground: bool,
    /// Candidate width and height must both exceed this
    pub min_size: u32,
    /// Maximum |width - height| for a candidate
    pub square_tolerance: u32,
    /// Border added around every returned region
    pub border_pad: u32,
    /// Minimum correlation score for a template match
    pub min_template_score: f64,
    /// Candidate hand-off policy
    pub candidates: CandidatePolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::None,
            threshold: ThresholdPolicy::Otsu,
            dark_foreground: true,
            min_size: 100,
            square_tolerance: 20,
            border_pad: 20,
            min_template_score: 0.5,
            candidates: CandidatePolicy::First,
        }
    }
}

/// Symbol family the scanner area is shaped for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Scanner area as laid out
    #[default]
    Auto,
    /// Wide strip for linear barcodes
    OneD,
    /// Square for matrix codes
    TwoD,
}

/// RGBA stroke colour
pub type Color = [u8; 4];

/// Overlay red
pub const RED: Color = [255, 0, 0, 255];

/// Top-level scan loop configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Ticks between decode attempts
    pub scan_period: u32,
    /// Delay between scheduled ticks
    pub frame_interval: Duration,
    /// Scanner-area shaping
    pub scan_mode: ScanMode,
    /// Requested stream resolution
    pub constraints: StreamConstraints,
    /// Formats passed through to the decoder
    pub formats: Vec<BarcodeFormat>,
    /// Filters applied each tick
    pub filters: FilterConfig,
    /// Region extraction on scan ticks
    pub extractor: ExtractorConfig,
    /// Overlay stroke colour
    pub overlay_color: Color,
    /// Overlay stroke width
    pub overlay_line_width: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_period: 30,
            frame_interval: Duration::from_millis(16),
            scan_mode: ScanMode::Auto,
            constraints: StreamConstraints::default(),
            formats: BarcodeFormat::DEFAULT_FORMATS.to_vec(),
            filters: FilterConfig::default(),
            extractor: ExtractorConfig::default(),
            overlay_color: RED,
            overlay_line_width: 2.0,
        }
    }
}

impl ScanConfig {
    /// Defaults with `SCAN_*` environment overrides applied.
    ///
    /// Unparseable values fall back to the default silently; an unknown
    /// format name in `SCAN_FORMATS` keeps the default whitelist.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.scan_period = parse_env_u32("SCAN_PERIOD", config.scan_period).max(1);
        config.frame_interval = Duration::from_millis(parse_env_u64(
            "SCAN_FRAME_INTERVAL_MS",
            config.frame_interval.as_millis() as u64,
        ));
        config.filters.threshold_value =
            parse_env_u8("SCAN_THRESHOLD", config.filters.threshold_value);
        config.filters.blur_radius = parse_env_u32("SCAN_BLUR_RADIUS", config.filters.blur_radius);
        config.filters.auto_threshold =
            parse_env_bool_u8("SCAN_AUTO_THRESHOLD", config.filters.auto_threshold);

        if let Ok(list) = std::env::var("SCAN_FORMATS") {
            match BarcodeFormat::parse_list(&list) {
                Ok(formats) if !formats.is_empty() => config.formats = formats,
                Ok(_) => {}
                Err(err) => log::warn!("ignoring SCAN_FORMATS: {err}"),
            }
        }
        config
    }
}
