// THEORY:
// The histogram cue describes the SHAPE of a region's intensity distribution rather
// than its level. Three steps per region and per bin resolution:
//
// 1.  **Binning over the region's own range**: the greyscale values of the region are
//     split into equal-width bins spanning `[min, max]` of that region (last bin
//     closed). This makes the cue independent of the absolute intensity scale.
// 2.  **Frequency normalization**: counts are divided by the region area, then the
//     frequency vector is z-scored across its own bins.
// 3.  **Entropy summary**: `-sum(f_i * ln(|f_i| / nbins))` over the normalized bins.
//
// Two singularities exist. A histogram whose bins are all equal has zero spread and
// cannot be z-scored; a normalized bin of exactly zero puts `ln 0` in the entropy.
// `DegeneracyPolicy` decides whether either stops the extraction or is guarded.

use crate::core_modules::normalization::{DegeneracyPolicy, ZScore};
use crate::core_modules::raster::Plane;
use crate::core_modules::region::RegionDescriptor;
use crate::error::FeatureError;

/// Bin count of the fine histogram.
pub const FINE_BINS: usize = 5;
/// Bin count of the coarse histogram.
pub const COARSE_BINS: usize = 3;
/// Fine bins plus their entropy.
pub const FINE_CUE_WIDTH: usize = FINE_BINS + 1;
/// Coarse bins plus their entropy.
pub const COARSE_CUE_WIDTH: usize = COARSE_BINS + 1;

/// How histogram singularities are resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramSettings {
    pub policy: DegeneracyPolicy,
    /// Spreads and bin magnitudes at or below this are treated as zero.
    pub epsilon: f64,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            policy: DegeneracyPolicy::default(),
            epsilon: 1e-12,
        }
    }
}

/// Both histogram cue blocks of one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramCue {
    pub fine: [f64; FINE_CUE_WIDTH],
    pub coarse: [f64; COARSE_CUE_WIDTH],
}

/// Counts `values` into `counts.len()` equal-width bins over `[min, max]`.
pub fn bin_counts(values: &[f64], counts: &mut [usize]) {
    counts.fill(0);
    let bins = counts.len();
    if values.is_empty() || bins == 0 {
        return;
    }
    let (mut low, mut high) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let span = high - low;
    for &value in values {
        let bin = (((value - low) / span) * bins as f64) as usize;
        counts[bin.min(bins - 1)] += 1;
    }
}

/// Fills `cue` with `cue.len() - 1` normalized bins followed by their entropy.
pub fn fill_histogram_cue(
    values: &[f64],
    area: usize,
    cue: &mut [f64],
    settings: &HistogramSettings,
    region_index: usize,
) -> Result<(), FeatureError> {
    let bins = cue.len() - 1;
    let mut counts = vec![0usize; bins];
    bin_counts(values, &mut counts);

    let frequencies: Vec<f64> = counts.iter().map(|&c| c as f64 / area as f64).collect();
    let stats = ZScore::fit(frequencies.iter().copied());

    if stats.is_degenerate(settings.epsilon) {
        match settings.policy {
            DegeneracyPolicy::FailFast => {
                return Err(FeatureError::DegenerateHistogram {
                    index: region_index,
                    bins,
                });
            }
            DegeneracyPolicy::Guarded => {
                tracing::warn!(region = region_index, bins, "flat histogram, cue zeroed");
                cue.fill(0.0);
                return Ok(());
            }
        }
    }

    for (slot, &frequency) in cue.iter_mut().zip(&frequencies) {
        *slot = stats.apply(frequency);
    }

    cue[bins] = entropy(&cue[..bins], settings, region_index)?;
    Ok(())
}

fn entropy(
    normalized: &[f64],
    settings: &HistogramSettings,
    region_index: usize,
) -> Result<f64, FeatureError> {
    let bins = normalized.len() as f64;
    let mut total = 0.0;
    for &f in normalized {
        if f.abs() <= settings.epsilon {
            if settings.policy == DegeneracyPolicy::FailFast {
                return Err(FeatureError::EntropySingularity {
                    index: region_index,
                    bins: normalized.len(),
                });
            }
            // lim x->0 of x ln|x| is 0
            continue;
        }
        total += f * (f.abs() / bins).ln();
    }
    Ok(-total)
}

/// Both histogram cues of one region. `region_index` only labels errors.
pub fn region_histogram_cue<R: RegionDescriptor>(
    grey: &Plane,
    region: &R,
    settings: &HistogramSettings,
    region_index: usize,
) -> Result<HistogramCue, FeatureError> {
    let values: Vec<f64> = region
        .coords()
        .iter()
        .map(|&(row, col)| grey.at(row, col))
        .collect();

    let mut cue = HistogramCue {
        fine: [0.0; FINE_CUE_WIDTH],
        coarse: [0.0; COARSE_CUE_WIDTH],
    };
    fill_histogram_cue(&values, region.area(), &mut cue.fine, settings, region_index)?;
    fill_histogram_cue(&values, region.area(), &mut cue.coarse, settings, region_index)?;
    Ok(cue)
}

/// Histogram cues for every region. `base_index` is the collection index of
/// `regions[0]`, so errors name the right region when called on a batch.
pub fn histogram_cues<R: RegionDescriptor>(
    grey: &Plane,
    regions: &[R],
    settings: &HistogramSettings,
    base_index: usize,
) -> Result<Vec<HistogramCue>, FeatureError> {
    regions
        .iter()
        .enumerate()
        .map(|(offset, region)| region_histogram_cue(grey, region, settings, base_index + offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region::Region;

    const TOLERANCE: f64 = 1e-9;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOLERANCE, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn bins_span_the_region_range() {
        let mut counts = [0usize; 5];
        bin_counts(&[0.0, 1.0, 4.0, 5.0, 8.0, 9.0, 12.0, 13.0], &mut counts);
        assert_eq!(counts, [2, 2, 0, 2, 2]);

        let mut counts = [0usize; 3];
        bin_counts(&[0.0, 1.0, 4.0, 5.0, 8.0, 9.0, 12.0, 13.0], &mut counts);
        assert_eq!(counts, [3, 2, 3]);
    }

    #[test]
    fn constant_values_land_in_the_middle_bin() {
        let mut counts = [0usize; 5];
        bin_counts(&[2.0; 4], &mut counts);
        assert_eq!(counts, [0, 0, 4, 0, 0]);
    }

    #[test]
    fn hand_computed_region() {
        let grey = Plane::from_vec(2, 4, vec![0.0, 1.0, 4.0, 5.0, 8.0, 9.0, 12.0, 13.0])
            .expect("valid plane");
        let region = Region::from_coords(1, (0..8).map(|i| (i / 4, i % 4)).collect());
        let cue = region_histogram_cue(&grey, &region, &HistogramSettings::default(), 0)
            .expect("non-degenerate histogram");

        assert_close(&cue.fine, &[0.5, 0.5, -2.0, 0.5, 0.5, 2.772_588_722_239_781]);
        let root_half = std::f64::consts::FRAC_1_SQRT_2;
        assert_close(
            &cue.coarse,
            &[root_half, -2.0 * root_half, root_half, 0.980_258_143_468_547_3],
        );
    }

    #[test]
    fn flat_histogram_fails_fast_when_asked() {
        let settings = HistogramSettings {
            policy: DegeneracyPolicy::FailFast,
            ..HistogramSettings::default()
        };
        let mut cue = [0.0; COARSE_CUE_WIDTH];
        let err = fill_histogram_cue(&[0.0, 1.0, 2.0], 3, &mut cue, &settings, 4).unwrap_err();
        assert!(matches!(err, FeatureError::DegenerateHistogram { index: 4, bins: 3 }));
    }

    #[test]
    fn flat_histogram_is_zeroed_when_guarded() {
        let mut cue = [1.0; COARSE_CUE_WIDTH];
        fill_histogram_cue(&[0.0, 1.0, 2.0], 3, &mut cue, &HistogramSettings::default(), 0)
            .expect("guarded policy never fails");
        assert_eq!(cue, [0.0; COARSE_CUE_WIDTH]);
    }

    #[test]
    fn zero_bin_entropy_is_singular_under_fail_fast() {
        // counts [3, 2, 1] -> frequencies z-score to [1.22, 0, -1.22]
        let settings = HistogramSettings {
            policy: DegeneracyPolicy::FailFast,
            ..HistogramSettings::default()
        };
        let mut cue = [0.0; COARSE_CUE_WIDTH];
        let values = [0.0, 0.0, 0.0, 1.5, 1.5, 3.0];
        let err = fill_histogram_cue(&values, 6, &mut cue, &settings, 2).unwrap_err();
        assert!(matches!(err, FeatureError::EntropySingularity { index: 2, bins: 3 }));
    }

    #[test]
    fn zero_bin_contributes_nothing_when_guarded() {
        let mut cue = [0.0; COARSE_CUE_WIDTH];
        let values = [0.0, 0.0, 0.0, 1.5, 1.5, 3.0];
        fill_histogram_cue(&values, 6, &mut cue, &HistogramSettings::default(), 0)
            .expect("guarded policy never fails");
        let z = 1.5_f64.sqrt();
        assert_close(&cue[..3], &[z, 0.0, -z]);
        let expected = -(z * (z / 3.0).ln() - z * (z / 3.0).ln());
        assert!((cue[3] - expected).abs() < TOLERANCE);
        assert!(cue[3].is_finite());
    }
}
