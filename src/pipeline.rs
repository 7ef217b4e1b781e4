// THEORY:
// The `pipeline` module is the top-level API of the cue engine. It wires the stages
// into one pure function: (image, regions, config) -> feature matrix.
//
// Stages:
// 0.  Validation: regions are checked against the image shape before any work.
// 1.  Preprocessing: normalized RGB, greyscale and HSV representations.
// 2.  Filter bank: one magnitude map per texture filter (whole-image work).
// 3.  Region cues: color, HSV, histogram, texture and position blocks.
// 4.  Assembly: blocks are joined into the 31-column matrix in region order.
//
// `FeaturePipeline` runs these sequentially and is the reference implementation.
// `ParallelFeaturePipeline` runs the same stage functions concurrently and produces
// the same matrix bit for bit.

use crate::core_modules::channel_cues::channel_cues;
use crate::core_modules::feature_matrix::{CueBlocks, assemble};
use crate::core_modules::gabor::{FREQUENCIES, FilterBank};
use crate::core_modules::histogram_cues::{HistogramSettings, histogram_cues};
use crate::core_modules::position_cues::position_cues;
use crate::core_modules::preprocessor::{Preprocessed, preprocess};
use crate::core_modules::raster::{Image, Plane};
use crate::core_modules::region::validate_regions;
use crate::core_modules::texture_cues::{filter_responses, notify_observer, texture_cues};
use crate::error::FeatureError;
use std::sync::Arc;
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::feature_matrix::{
    CueBlock, FEATURE_WIDTH, FeatureMatrix, FeatureVector, column_names,
};
pub use crate::core_modules::normalization::DegeneracyPolicy;
pub use crate::core_modules::region::{Region, RegionDescriptor, grid_regions, regions_from_labels};
pub use crate::core_modules::texture_cues::ResponseObserver;

/// Configuration for feature extraction, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// What to do when a region's histogram is flat or has a zero normalized bin.
    pub degeneracy: DegeneracyPolicy,
    /// Spreads and normalized bins at or below this count as zero.
    pub epsilon: f64,
    /// Coarse and fine Gabor frequencies, in cycles per pixel.
    pub gabor_frequencies: [f64; FREQUENCIES],
    /// Gabor bandwidth in octaves.
    pub gabor_bandwidth: f64,
    /// Gabor kernels are truncated at this many envelope standard deviations.
    pub gabor_n_stds: f64,
    /// Region batches the parallel pipeline splits work into.
    pub worker_count: usize,
    /// Optional sink for every filter magnitude map.
    pub response_observer: Option<Arc<dyn ResponseObserver>>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            degeneracy: DegeneracyPolicy::default(),
            epsilon: 1e-12,
            gabor_frequencies: [0.1, 0.4],
            gabor_bandwidth: 1.0,
            gabor_n_stds: 3.0,
            worker_count: num_cpus::get(),
            response_observer: None,
        }
    }
}

impl FeatureConfig {
    pub fn histogram_settings(&self) -> HistogramSettings {
        HistogramSettings {
            policy: self.degeneracy,
            epsilon: self.epsilon,
        }
    }

    pub fn filter_bank(&self) -> FilterBank {
        FilterBank::new(self.gabor_frequencies, self.gabor_bandwidth, self.gabor_n_stds)
    }
}

/// Computes every region cue block for a contiguous run of regions.
/// `base_index` is the collection index of `regions[0]`.
pub(crate) fn region_cue_blocks<R: RegionDescriptor>(
    prepared: &Preprocessed,
    responses: &[Plane],
    regions: &[R],
    settings: &HistogramSettings,
    base_index: usize,
) -> Result<CueBlocks, FeatureError> {
    Ok(CueBlocks {
        color: channel_cues(&prepared.rgb_normalized, regions),
        hsv: channel_cues(&prepared.hsv_normalized, regions),
        histogram: histogram_cues(&prepared.grey, regions, settings, base_index)?,
        texture: texture_cues(responses, regions),
        position: position_cues(regions, prepared.shape),
    })
}

/// The sequential feature extractor.
pub struct FeaturePipeline {
    config: FeatureConfig,
    bank: FilterBank,
}

impl FeaturePipeline {
    pub fn new(config: FeatureConfig) -> Self {
        let bank = config.filter_bank();
        Self { config, bank }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn filter_bank(&self) -> &FilterBank {
        &self.bank
    }

    /// Computes the feature matrix of `regions` over `image`.
    pub fn extract<R: RegionDescriptor>(
        &self,
        image: &Image,
        regions: &[R],
    ) -> Result<FeatureMatrix, FeatureError> {
        let started = Instant::now();

        // Stage 0: Validation
        validate_regions(regions, image.shape())?;

        // Stage 1: Preprocessing
        let prepared = preprocess(image)?;

        // Stage 2: Filter Bank
        let responses = filter_responses(&prepared.grey_normalized, &self.bank);
        tracing::debug!(filters = responses.len(), "computed texture responses");
        if let Some(observer) = &self.config.response_observer {
            notify_observer(observer.as_ref(), &self.bank, &responses);
        }

        // Stage 3: Region Cues
        let blocks = region_cue_blocks(
            &prepared,
            &responses,
            regions,
            &self.config.histogram_settings(),
            0,
        )?;

        // Stage 4: Assembly
        let matrix = assemble(blocks, regions.len());
        tracing::info!(
            regions = regions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extracted region features"
        );
        Ok(matrix)
    }
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_by_four() -> Image {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        Image::from_grey(4, 4, &values).expect("valid image")
    }

    fn halves() -> Vec<Region> {
        let left = (0..4).flat_map(|r| [(r, 0), (r, 1)]).collect();
        let right = (0..4).flat_map(|r| [(r, 2), (r, 3)]).collect();
        vec![Region::from_coords(1, left), Region::from_coords(2, right)]
    }

    #[test]
    fn matrix_has_one_row_per_region() {
        let matrix = FeaturePipeline::default()
            .extract(&four_by_four(), &halves())
            .expect("valid input");
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.column_count(), FEATURE_WIDTH);
    }

    #[test]
    fn regions_are_validated_before_preprocessing() {
        // A constant image would fail preprocessing; the empty collection is reported first.
        let constant = Image::from_grey(2, 2, &[1.0; 4]).expect("valid image");
        let err = FeaturePipeline::default()
            .extract::<Region>(&constant, &[])
            .unwrap_err();
        assert!(matches!(err, FeatureError::NoRegions));
    }

    #[test]
    fn fail_fast_policy_reaches_histograms() {
        // Three distinct values per region: a flat 3-bin histogram.
        let image = Image::from_grey(1, 6, &[0.0, 1.0, 2.0, 5.0, 6.0, 7.0]).expect("valid image");
        let regions = vec![
            Region::from_coords(1, vec![(0, 0), (0, 1), (0, 2)]),
            Region::from_coords(2, vec![(0, 3), (0, 4), (0, 5)]),
        ];
        let config = FeatureConfig {
            degeneracy: DegeneracyPolicy::FailFast,
            ..FeatureConfig::default()
        };
        let err = FeaturePipeline::new(config)
            .extract(&image, &regions)
            .unwrap_err();
        assert!(matches!(err, FeatureError::DegenerateHistogram { index: 0, .. }));
    }
}
