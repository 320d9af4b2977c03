//! Cadence-driven scan loop
//!
//! Every tick crops the latest camera frame to the scanner area, applies the
//! zoom, and runs the filter chain. Every `scan_period` ticks the filtered
//! snapshot also goes through region extraction and the decoder, and the
//! result (or its absence) is reflected on the overlays.
//!
//! ```text
//! Idle --start--> Streaming --stop--> Stopped --> Idle
//!                    ^                   |
//!                    +---change_device---+
//! ```

pub mod control;
pub mod crop;
pub mod scheduler;

pub use control::{ControlEvent, ControlHandle};
pub use crop::{DisplayGeometry, crop_rect};
pub use scheduler::FrameScheduler;

use crate::config::{CandidatePolicy, FilterConfig, ScanConfig, ScanMode};
use crate::error::{Result, ScanError};
use crate::filters::FilterChain;
use crate::models::{CropRect, PixelBuffer};
use crate::projector::ResultProjector;
use crate::region::RegionExtractor;
use crate::source::{
    CameraSource, DecodeHints, Decoded, DeviceInfo, DeviceKind, DisplaySurface, Overlay,
    StreamConstraints, SymbolDecoder,
};
use std::sync::mpsc::{self, Receiver, Sender};

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No stream held
    Idle,
    /// Stream open, ticks do work
    Streaming,
    /// Teardown in progress
    Stopped,
}

/// Per-stream counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanState {
    /// Ticks since the last decode attempt
    pub frame_count: u32,
    /// Ticks between decode attempts
    pub scan_period: u32,
    /// True while streaming
    pub active: bool,
    /// Crop zoom ratio
    pub zoom_ratio: f64,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not streaming; nothing happened
    Idle,
    /// Streaming but the camera has no frame yet
    NoFrame,
    /// Crop geometry was invalid for this frame
    Skipped,
    /// Snapshot filtered; not a scan tick
    Captured,
    /// Scan tick without a decodable symbol
    NothingFound,
    /// Scan tick that decoded a symbol
    Decoded(Decoded),
}

/// The scan loop, generic over its three collaborators
pub struct ScanLoop<C: CameraSource, D: SymbolDecoder, S: DisplaySurface> {
    camera: C,
    decoder: D,
    surface: S,
    state: LoopState,
    scan: ScanState,
    filters: FilterConfig,
    extractor: RegionExtractor,
    hints: DecodeHints,
    scan_mode: ScanMode,
    constraints: StreamConstraints,
    geometry: Option<DisplayGeometry>,
    projector: ResultProjector,
    sender: Sender<ControlEvent>,
    controls: Receiver<ControlEvent>,
    device: Option<DeviceInfo>,
    frame_size: Option<(u32, u32)>,
    snapshot_size: Option<(u32, u32)>,
    last_crop: Option<CropRect>,
    last_snapshot: Option<PixelBuffer>,
    last_result: Option<Decoded>,
}

impl<C, D, S> ScanLoop<C, D, S>
where
    C: CameraSource,
    D: SymbolDecoder,
    S: DisplaySurface,
{
    /// Idle loop wired to its collaborators
    pub fn new(config: ScanConfig, camera: C, decoder: D, surface: S) -> Self {
        let (sender, controls) = mpsc::channel();
        Self {
            camera,
            decoder,
            surface,
            state: LoopState::Idle,
            scan: ScanState {
                frame_count: 0,
                scan_period: config.scan_period.max(1),
                active: false,
                zoom_ratio: 1.0,
            },
            filters: config.filters,
            extractor: RegionExtractor::new(config.extractor),
            hints: DecodeHints {
                formats: config.formats,
            },
            scan_mode: config.scan_mode,
            constraints: config.constraints,
            geometry: None,
            projector: ResultProjector::new(config.overlay_color, config.overlay_line_width),
            sender,
            controls,
            device: None,
            frame_size: None,
            snapshot_size: None,
            last_crop: None,
            last_snapshot: None,
            last_result: None,
        }
    }

    /// Use `geometry` instead of cropping to the whole frame
    pub fn with_geometry(mut self, geometry: DisplayGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Sender for runtime configuration changes
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle::new(self.sender.clone())
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// True while a stream is held
    pub fn is_streaming(&self) -> bool {
        self.state == LoopState::Streaming
    }

    /// Counters for the current stream
    pub fn scan_state(&self) -> &ScanState {
        &self.scan
    }

    /// Filter configuration as of the last drained control event
    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    /// Active scan mode
    pub fn scan_mode(&self) -> ScanMode {
        self.scan_mode
    }

    /// Hints forwarded to the decoder
    pub fn hints(&self) -> &DecodeHints {
        &self.hints
    }

    /// Device the current stream was opened for, if pinned
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Crop used by the most recent tick
    pub fn last_crop(&self) -> Option<CropRect> {
        self.last_crop
    }

    /// Filtered snapshot from the most recent tick
    pub fn last_snapshot(&self) -> Option<&PixelBuffer> {
        self.last_snapshot.as_ref()
    }

    /// Most recent successful decode
    pub fn last_result(&self) -> Option<&Decoded> {
        self.last_result.as_ref()
    }

    /// Camera collaborator
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Decoder collaborator
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Display collaborator
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Video-input devices reported by the camera
    pub fn devices(&mut self) -> Result<Vec<DeviceInfo>> {
        let devices = self.camera.enumerate_devices()?;
        Ok(devices
            .into_iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .collect())
    }

    /// Open a stream and begin streaming.
    ///
    /// An active stream is stopped first. On failure the camera is closed,
    /// the loop stays [`LoopState::Idle`], and the error is reported as
    /// [`ScanError::DeviceUnavailable`].
    pub fn start(&mut self, device: Option<&DeviceInfo>) -> Result<()> {
        if self.state != LoopState::Idle {
            self.stop();
        }
        let constraints = match device {
            Some(device) => self.constraints.for_device(device),
            None => self.constraints.clone(),
        };

        if let Err(err) = self.camera.open_stream(&constraints) {
            self.camera.close();
            self.state = LoopState::Idle;
            self.scan.active = false;
            log::warn!("failed to open camera stream: {err}");
            return Err(match err {
                ScanError::DeviceUnavailable(_) => err,
                other => ScanError::DeviceUnavailable(other.to_string()),
            });
        }

        self.device = device.cloned();
        self.scan.frame_count = 0;
        self.scan.zoom_ratio = 1.0;
        self.scan.active = true;
        self.frame_size = None;
        self.snapshot_size = None;
        self.state = LoopState::Streaming;
        log::info!(
            "streaming from {} at {}x{}",
            constraints.device_id.as_deref().unwrap_or("default camera"),
            constraints.width,
            constraints.height
        );
        Ok(())
    }

    /// Release the stream and clear the overlays; a no-op when idle
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.state = LoopState::Stopped;
        self.camera.close();
        self.projector.clear(&mut self.surface);
        self.scan.active = false;
        self.scan.frame_count = 0;
        self.state = LoopState::Idle;
        log::info!("stream stopped");
    }

    /// Restart streaming on `device`
    pub fn change_device(&mut self, device: &DeviceInfo) -> Result<()> {
        log::info!("switching to device {} ({})", device.id, device.label);
        self.start(Some(device))
    }

    fn drain_controls(&mut self) {
        while let Ok(event) = self.controls.try_recv() {
            self.apply_control(event);
        }
    }

    fn apply_control(&mut self, event: ControlEvent) {
        log::debug!("control: {event:?}");
        match event {
            ControlEvent::SetGrayscale(on) => self.filters.grayscale = on,
            ControlEvent::SetEqualize(on) => self.filters.equalize = on,
            ControlEvent::SetInvert(on) => self.filters.invert_color = on,
            ControlEvent::SetThreshold(on) => self.filters.threshold = on,
            ControlEvent::SetAutoThreshold(on) => self.filters.auto_threshold = on,
            ControlEvent::SetThresholdValue(value) => self.filters.threshold_value = value,
            ControlEvent::SetBlur(on) => self.filters.blur = on,
            ControlEvent::SetBlurRadius(radius) => self.filters.blur_radius = radius,
            ControlEvent::SetZoom(zoom) => {
                if zoom.is_finite() && zoom > 0.0 {
                    self.scan.zoom_ratio = zoom;
                } else {
                    log::warn!("ignoring zoom ratio {zoom}");
                }
            }
            ControlEvent::SetScanMode(mode) => self.scan_mode = mode,
            ControlEvent::SetFormats(formats) => self.hints.formats = formats,
            ControlEvent::SetScanPeriod(period) => self.scan.scan_period = period.max(1),
            ControlEvent::SetGeometry(geometry) => self.geometry = Some(geometry),
            ControlEvent::Stop => self.stop(),
        }
    }

    /// Run one tick
    pub fn tick(&mut self) -> TickOutcome {
        self.drain_controls();
        if self.state != LoopState::Streaming {
            return TickOutcome::Idle;
        }

        let Some(frame) = self.camera.latest_frame() else {
            return TickOutcome::NoFrame;
        };
        let (frame_w, frame_h) = (frame.width(), frame.height());
        let geometry = self
            .geometry
            .unwrap_or_else(|| DisplayGeometry::full(frame_w, frame_h));
        let zoom = self.scan.zoom_ratio;

        let crop = match crop_rect(frame_w, frame_h, &geometry, zoom, self.scan_mode) {
            Ok(crop) => crop,
            Err(err) => {
                log::warn!("skipping tick: {err}");
                return TickOutcome::Skipped;
            }
        };
        let mut snapshot = match PixelBuffer::from_region(frame, crop) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("skipping tick: {err}");
                return TickOutcome::Skipped;
            }
        };
        if zoom != 1.0 {
            let width = ((crop.width as f64 * zoom).round() as u32).max(1);
            let height = ((crop.height as f64 * zoom).round() as u32).max(1);
            snapshot = snapshot.resized(width, height);
        }

        self.resize_overlays((frame_w, frame_h), (snapshot.width(), snapshot.height()));
        FilterChain::from_config(&self.filters).apply(&mut snapshot);
        self.last_crop = Some(crop);

        self.scan.frame_count += 1;
        if self.scan.frame_count < self.scan.scan_period {
            self.last_snapshot = Some(snapshot);
            return TickOutcome::Captured;
        }
        self.scan.frame_count = 0;

        let outcome = self.scan_snapshot(&snapshot, &crop);
        self.last_snapshot = Some(snapshot);
        outcome
    }

    fn resize_overlays(&mut self, frame: (u32, u32), snapshot: (u32, u32)) {
        if self.frame_size != Some(frame) {
            self.surface.resize(Overlay::Display, frame.0, frame.1);
            self.frame_size = Some(frame);
        }
        if self.snapshot_size != Some(snapshot) {
            self.surface.resize(Overlay::Snapshot, snapshot.0, snapshot.1);
            self.snapshot_size = Some(snapshot);
        }
    }

    fn scan_snapshot(&mut self, snapshot: &PixelBuffer, crop: &CropRect) -> TickOutcome {
        let candidates = self.extractor.extract(snapshot);
        if candidates.is_empty() {
            log::trace!("{}", ScanError::ExtractionEmpty);
            self.projector.clear(&mut self.surface);
            return TickOutcome::NothingFound;
        }

        let policy = self.extractor.config().candidates;
        let mut found = None;
        for candidate in &candidates {
            match self.decoder.decode(&candidate.region, &self.hints) {
                Ok(decoded) => {
                    log::debug!(
                        "decoded {:?} with {} points at {:?}",
                        decoded.text,
                        decoded.points.len(),
                        candidate.origin
                    );
                    found = Some((decoded, candidate.origin));
                    if policy == CandidatePolicy::First {
                        break;
                    }
                }
                Err(err) if err.is_miss() => log::trace!("{err}"),
                Err(err) => log::warn!("decoder failed: {err}"),
            }
        }

        let Some((decoded, origin)) = found else {
            self.projector.clear(&mut self.surface);
            return TickOutcome::NothingFound;
        };
        if !self.projector.draw(
            &mut self.surface,
            &decoded.points,
            crop,
            self.scan.zoom_ratio,
            origin,
        ) {
            self.projector.clear(&mut self.surface);
        }
        self.last_result = Some(decoded.clone());
        TickOutcome::Decoded(decoded)
    }
}

impl<C: CameraSource, D: SymbolDecoder, S: DisplaySurface> Drop for ScanLoop<C, D, S> {
    fn drop(&mut self) {
        if self.state != LoopState::Idle {
            self.camera.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RED;
    use crate::models::ResultPoint;
    use crate::tools::{RecordingSurface, SequenceCamera, SurfaceCommand};

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[derive(Default)]
    struct FixedDecoder {
        calls: usize,
        sizes: Vec<(u32, u32)>,
        formats: Vec<Vec<crate::source::BarcodeFormat>>,
    }

    impl SymbolDecoder for FixedDecoder {
        fn decode(&mut self, buffer: &PixelBuffer, hints: &DecodeHints) -> Result<Decoded> {
            self.calls += 1;
            self.sizes.push((buffer.width(), buffer.height()));
            self.formats.push(hints.formats.clone());
            Ok(Decoded {
                text: "fixed".into(),
                points: vec![ResultPoint::new(10.0, 10.0), ResultPoint::new(20.0, 10.0)],
            })
        }
    }

    fn config(period: u32) -> ScanConfig {
        ScanConfig {
            scan_period: period,
            ..ScanConfig::default()
        }
    }

    fn scan_loop(period: u32) -> ScanLoop<SequenceCamera, FixedDecoder, RecordingSurface> {
        let camera = SequenceCamera::repeating(PixelBuffer::filled(64, 48, WHITE));
        ScanLoop::new(
            config(period),
            camera,
            FixedDecoder::default(),
            RecordingSurface::default(),
        )
    }

    #[test]
    fn test_tick_when_idle_is_noop() {
        let mut scan = scan_loop(2);
        assert_eq!(scan.tick(), TickOutcome::Idle);
        assert_eq!(scan.decoder().calls, 0);
        assert!(scan.last_snapshot().is_none());
    }

    #[test]
    fn test_decode_on_period() {
        let mut scan = scan_loop(3);
        scan.start(None).unwrap();
        assert_eq!(scan.tick(), TickOutcome::Captured);
        assert_eq!(scan.tick(), TickOutcome::Captured);
        assert!(matches!(scan.tick(), TickOutcome::Decoded(_)));
        assert_eq!(scan.decoder().calls, 1);
        assert_eq!(scan.scan_state().frame_count, 0);
        assert_eq!(scan.last_result().unwrap().text, "fixed");
    }

    #[test]
    fn test_start_resets_zoom_and_count() {
        let mut scan = scan_loop(5);
        scan.start(None).unwrap();
        scan.control_handle().send(ControlEvent::SetZoom(2.0)).unwrap();
        scan.tick();
        assert_eq!(scan.scan_state().zoom_ratio, 2.0);
        assert_eq!(scan.scan_state().frame_count, 1);

        scan.start(None).unwrap();
        assert_eq!(scan.scan_state().zoom_ratio, 1.0);
        assert_eq!(scan.scan_state().frame_count, 0);
    }

    #[test]
    fn test_zoom_rescales_snapshot_and_projection() {
        let mut scan = scan_loop(1);
        scan.start(None).unwrap();
        scan.control_handle().send(ControlEvent::SetZoom(2.0)).unwrap();
        scan.tick();

        // Crop is the centred 32x24 quarter, scaled back up to 64x48
        assert_eq!(scan.last_crop(), Some(CropRect::new(16, 12, 32, 24)));
        assert_eq!(scan.decoder().sizes, vec![(64, 48)]);

        let display = scan
            .surface()
            .polylines(Overlay::Display)
            .last()
            .cloned()
            .unwrap();
        assert_eq!(
            display.points,
            vec![ResultPoint::new(21.0, 17.0), ResultPoint::new(26.0, 17.0)]
        );
    }

    #[test]
    fn test_overlays_resized_once_per_size() {
        let mut scan = scan_loop(10);
        scan.start(None).unwrap();
        scan.tick();
        scan.tick();
        let resizes: Vec<_> = scan
            .surface()
            .commands
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::Resize { .. }))
            .cloned()
            .collect();
        assert_eq!(
            resizes,
            vec![
                SurfaceCommand::Resize {
                    overlay: Overlay::Display,
                    width: 64,
                    height: 48
                },
                SurfaceCommand::Resize {
                    overlay: Overlay::Snapshot,
                    width: 64,
                    height: 48
                },
            ]
        );
    }

    #[test]
    fn test_scan_mode_shapes_crop() {
        let mut scan = scan_loop(10);
        scan.start(None).unwrap();
        scan.control_handle()
            .send(ControlEvent::SetScanMode(ScanMode::TwoD))
            .unwrap();
        scan.tick();
        assert_eq!(scan.last_crop(), Some(CropRect::new(8, 0, 48, 48)));
        assert_eq!(scan.scan_mode(), ScanMode::TwoD);
    }

    #[test]
    fn test_formats_forwarded_as_hints() {
        let mut scan = scan_loop(1);
        scan.start(None).unwrap();
        scan.control_handle().set_formats("ean_13").unwrap();
        scan.tick();
        assert_eq!(
            scan.decoder().formats,
            vec![vec![crate::source::BarcodeFormat::Ean13]]
        );
    }

    #[test]
    fn test_stop_event_ends_stream() {
        let mut scan = scan_loop(1);
        scan.start(None).unwrap();
        scan.control_handle().send(ControlEvent::Stop).unwrap();
        assert_eq!(scan.tick(), TickOutcome::Idle);
        assert_eq!(scan.state(), LoopState::Idle);
        assert_eq!(scan.camera().active_streams(), 0);
        assert!(!scan.scan_state().active);
    }

    #[test]
    fn test_no_frame_yet() {
        let camera = SequenceCamera::new(Vec::new());
        let mut scan = ScanLoop::new(
            config(1),
            camera,
            FixedDecoder::default(),
            RecordingSurface::default(),
        );
        scan.start(None).unwrap();
        assert_eq!(scan.tick(), TickOutcome::NoFrame);
    }

    #[test]
    fn test_bad_geometry_skips_tick() {
        let geometry = DisplayGeometry {
            display_w: 0,
            display_h: 0,
            area_w: 10,
            area_h: 10,
        };
        let mut scan = scan_loop(1).with_geometry(geometry);
        scan.start(None).unwrap();
        assert_eq!(scan.tick(), TickOutcome::Skipped);
        assert_eq!(scan.decoder().calls, 0);
        assert_eq!(scan.scan_state().frame_count, 0);
    }

    #[test]
    fn test_overlay_colour_applied() {
        let mut scan = scan_loop(1);
        scan.start(None).unwrap();
        scan.tick();
        let stroke = scan.surface().commands.iter().find_map(|c| match c {
            SurfaceCommand::Polyline { color, width, .. } => Some((*color, *width)),
            _ => None,
        });
        assert_eq!(stroke, Some((RED, 2.0)));
    }
}
