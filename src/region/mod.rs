//! Region-of-interest extraction
//!
//! Locates candidate symbol regions in a filtered snapshot so the decoder
//! sees a tight, re-binarized crop instead of the whole scanner area:
//! - Contours: outermost near-square components above a minimum size
//! - Template: best normalized cross-correlation match of a reference image
//!
//! Finding nothing is a normal outcome and yields an empty candidate list.

pub mod contour;
pub mod morphology;
pub mod template;

use crate::config::{ExtractionStrategy, ExtractorConfig, ThresholdPolicy};
use crate::filters::grayscale::grayscale;
use crate::filters::threshold::{otsu_threshold, threshold};
use crate::models::{BinaryMask, CropRect, PixelBuffer};

/// A region handed to the decoder
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Pixels to decode (padded)
    pub region: PixelBuffer,
    /// Crop-space position of `region`'s top-left pixel; may be negative
    /// when the pad extends past the snapshot
    pub origin: (i32, i32),
    /// Crop-space bounds of the located symbol, without padding
    pub bounds: CropRect,
    /// Correlation score for template matches
    pub score: Option<f64>,
}

impl Candidate {
    /// The whole snapshot as a single candidate
    pub fn whole(snapshot: PixelBuffer) -> Self {
        let bounds = CropRect::new(0, 0, snapshot.width() as i32, snapshot.height() as i32);
        Self {
            region: snapshot,
            origin: (0, 0),
            bounds,
            score: None,
        }
    }
}

/// Runs the configured extraction strategy over filtered snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct RegionExtractor {
    config: ExtractorConfig,
    template_mask: Option<BinaryMask>,
}

impl RegionExtractor {
    /// Build an extractor; a template is binarized once up front
    pub fn new(config: ExtractorConfig) -> Self {
        let template_mask = match &config.strategy {
            ExtractionStrategy::Template(template) => Some(binarize(template, &config)),
            _ => None,
        };
        Self {
            config,
            template_mask,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// False when the strategy is [`ExtractionStrategy::None`]
    pub fn is_enabled(&self) -> bool {
        !matches!(self.config.strategy, ExtractionStrategy::None)
    }

    /// Locate candidates in `snapshot`.
    ///
    /// With no strategy configured the snapshot itself is the only candidate.
    pub fn extract(&self, snapshot: &PixelBuffer) -> Vec<Candidate> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        match &self.config.strategy {
            ExtractionStrategy::None => vec![Candidate::whole(snapshot.clone())],
            ExtractionStrategy::Contours => self.extract_contours(snapshot),
            ExtractionStrategy::Template(_) => self.extract_template(snapshot),
        }
    }

    fn extract_contours(&self, snapshot: &PixelBuffer) -> Vec<Candidate> {
        let mask = binarize(snapshot, &self.config);
        let rects = contour::external_bounds(&mask);
        let squares = contour::square_candidates(
            &rects,
            self.config.min_size,
            self.config.square_tolerance,
        );
        log::trace!(
            "contours: {} components, {} square candidates",
            rects.len(),
            squares.len()
        );

        let pad = self.config.border_pad;
        let fill = if self.config.dark_foreground {
            [255, 255, 255, 255]
        } else {
            [0, 0, 0, 255]
        };
        squares
            .into_iter()
            .filter_map(|rect| {
                let mut region = PixelBuffer::from_region(snapshot, rect).ok()?;
                grayscale(&mut region);
                let level = match self.config.threshold {
                    ThresholdPolicy::Otsu => otsu_threshold(&region),
                    ThresholdPolicy::Fixed(t) => t,
                };
                threshold(&mut region, level);
                Some(Candidate {
                    region: region.padded(pad, fill),
                    origin: (rect.x0 - pad as i32, rect.y0 - pad as i32),
                    bounds: rect,
                    score: None,
                })
            })
            .collect()
    }

    fn extract_template(&self, snapshot: &PixelBuffer) -> Vec<Candidate> {
        let Some(template) = &self.template_mask else {
            return Vec::new();
        };
        let mask = binarize(snapshot, &self.config);
        let Some(found) = template::best_match(&mask, template) else {
            return Vec::new();
        };
        if found.score < self.config.min_template_score {
            log::trace!("template: best score {:.3} below policy", found.score);
            return Vec::new();
        }

        let bounds = CropRect::new(
            found.x as i32,
            found.y as i32,
            template.width() as i32,
            template.height() as i32,
        );
        let padded = bounds.expand(self.config.border_pad as i32);
        let Some(area) = padded.clamp_to(snapshot.width(), snapshot.height()) else {
            return Vec::new();
        };
        match PixelBuffer::from_region(snapshot, area) {
            Ok(region) => vec![Candidate {
                region,
                origin: (area.x0, area.y0),
                bounds,
                score: Some(found.score),
            }],
            Err(_) => Vec::new(),
        }
    }
}

/// Grayscale, binarize with the configured policy, then open 3x3 / close 5x5
pub fn binarize(buffer: &PixelBuffer, config: &ExtractorConfig) -> BinaryMask {
    let mut gray = buffer.clone();
    grayscale(&mut gray);
    let level = match config.threshold {
        ThresholdPolicy::Otsu => otsu_threshold(&gray),
        ThresholdPolicy::Fixed(t) => t,
    };
    let mask = BinaryMask::from_buffer(&gray, level, config.dark_foreground);
    morphology::denoise(&mask)
}
