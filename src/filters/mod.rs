//! Image-enhancement filters
//!
//! Every filter mutates only the buffer it is handed:
//! - Grayscale and invert (per-pixel, rayon row chunks)
//! - Histogram equalization over the red channel
//! - Binary threshold and Otsu threshold selection
//! - Separable box blur
//!
//! [`FilterChain`] is an ordered list of [`FilterStage`] variants. The
//! canonical order built from a [`FilterConfig`] is
//! grayscale → equalize → invert → blur → Otsu-select → threshold.

pub mod blur;
pub mod equalize;
pub mod grayscale;
pub mod histogram;
pub mod threshold;

use crate::config::FilterConfig;
use crate::models::PixelBuffer;

/// One single-responsibility transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Average R, G, B
    Grayscale,
    /// Invert R, G, B
    Invert,
    /// Histogram equalization
    Equalize,
    /// Box blur with the given radius, repeated `quality` times
    Blur {
        /// Window radius
        radius: u32,
        /// Repeat count
        quality: u32,
    },
    /// Pick a threshold with Otsu's method for the following `Threshold`
    OtsuSelect,
    /// Binary threshold at the chain's active threshold
    Threshold,
}

/// State threaded through one chain run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    /// Threshold used by [`FilterStage::Threshold`]
    pub threshold: u8,
}

impl FilterStage {
    /// Apply this stage to `buffer`
    pub fn apply(&self, buffer: &mut PixelBuffer, ctx: &mut FilterContext) {
        match *self {
            FilterStage::Grayscale => grayscale::grayscale(buffer),
            FilterStage::Invert => grayscale::invert(buffer),
            FilterStage::Equalize => equalize::equalize(buffer),
            FilterStage::Blur { radius, quality } => blur::box_blur(buffer, radius, quality),
            FilterStage::OtsuSelect => ctx.threshold = threshold::otsu_threshold(buffer),
            FilterStage::Threshold => threshold::threshold(buffer, ctx.threshold),
        }
    }
}

/// Ordered filter pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
    threshold: u8,
}

impl FilterChain {
    /// Chain with an explicit stage order and starting threshold
    pub fn new(stages: Vec<FilterStage>, threshold: u8) -> Self {
        Self { stages, threshold }
    }

    /// Canonical chain for `config`; disabled stages are left out
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut stages = Vec::with_capacity(6);
        if config.grayscale {
            stages.push(FilterStage::Grayscale);
        }
        if config.equalize {
            stages.push(FilterStage::Equalize);
        }
        if config.invert_color {
            stages.push(FilterStage::Invert);
        }
        if config.blur {
            stages.push(FilterStage::Blur {
                radius: config.blur_radius,
                quality: config.blur_quality,
            });
        }
        if config.threshold {
            if config.auto_threshold {
                stages.push(FilterStage::OtsuSelect);
            }
            stages.push(FilterStage::Threshold);
        }
        Self::new(stages, config.threshold_value)
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Run every stage in order, returning the final context
    pub fn apply(&self, buffer: &mut PixelBuffer) -> FilterContext {
        let mut ctx = FilterContext {
            threshold: self.threshold,
        };
        for stage in &self.stages {
            stage.apply(buffer, &mut ctx);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order_from_config() {
        let config = FilterConfig {
            grayscale: true,
            equalize: true,
            invert_color: true,
            threshold: true,
            blur: true,
            blur_radius: 2,
            blur_quality: 1,
            threshold_value: 90,
            auto_threshold: true,
        };
        let chain = FilterChain::from_config(&config);
        assert_eq!(
            chain.stages(),
            &[
                FilterStage::Grayscale,
                FilterStage::Equalize,
                FilterStage::Invert,
                FilterStage::Blur {
                    radius: 2,
                    quality: 1
                },
                FilterStage::OtsuSelect,
                FilterStage::Threshold,
            ]
        );
    }

    #[test]
    fn test_disabled_stages_skipped() {
        let config = FilterConfig {
            grayscale: false,
            invert_color: false,
            threshold: true,
            auto_threshold: false,
            threshold_value: 100,
            ..FilterConfig::default()
        };
        let chain = FilterChain::from_config(&config);
        assert_eq!(chain.stages(), &[FilterStage::Threshold]);

        let mut buf = PixelBuffer::from_luma(2, 1, &[100, 101]).unwrap();
        let ctx = chain.apply(&mut buf);
        assert_eq!(ctx.threshold, 100);
        assert_eq!(buf.red_channel(), vec![0, 255]);
    }

    #[test]
    fn test_otsu_feeds_threshold() {
        let chain = FilterChain::new(vec![FilterStage::OtsuSelect, FilterStage::Threshold], 0);
        let mut luma = vec![20u8; 8];
        luma.extend(vec![220u8; 8]);
        let mut buf = PixelBuffer::from_luma(4, 4, &luma).unwrap();
        let ctx = chain.apply(&mut buf);
        assert!(ctx.threshold > 20 && ctx.threshold < 220);
        assert_eq!(buf.pixel(0, 0)[0], 0);
        assert_eq!(buf.pixel(3, 3)[0], 255);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut buf = PixelBuffer::filled(3, 3, [1, 2, 3, 4]);
        let before = buf.clone();
        FilterChain::default().apply(&mut buf);
        assert_eq!(buf, before);
    }
}
