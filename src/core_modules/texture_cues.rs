// THEORY:
// The texture cue is the most expensive stage and is split in two so both halves can
// be parallelized independently:
//
// 1.  **Global work**: every filter of the bank is applied to the whole normalized
//     greyscale image once, producing one magnitude map per filter.
// 2.  **Region work**: for every region, the mean of each magnitude map over its
//     pixels (8 values), followed by three summaries of those 8 values: their mean,
//     their maximum, and the gap between maximum and median.
//
// Inspecting the magnitude maps is a debugging concern, not part of the computation.
// It is exposed as an optional `ResponseObserver` that sees each map once, in filter
// order, after it has been computed.

use crate::core_modules::gabor::{FILTER_COUNT, FilterBank, GaborKernel, magnitude_response};
use crate::core_modules::raster::Plane;
use crate::core_modules::region::RegionDescriptor;
use std::fmt::Debug;

/// 8 per-filter means + mean + max + (max - median).
pub const TEXTURE_CUE_WIDTH: usize = FILTER_COUNT + 3;

/// Receives every filter magnitude map, e.g. to dump it for inspection.
pub trait ResponseObserver: Debug + Send + Sync {
    fn observe(&self, filter_index: usize, kernel: &GaborKernel, response: &Plane);
}

/// Applies every filter of `bank` to `grey_normalized`, in bank order.
pub fn filter_responses(grey_normalized: &Plane, bank: &FilterBank) -> Vec<Plane> {
    bank.kernels()
        .iter()
        .map(|kernel| magnitude_response(grey_normalized, kernel))
        .collect()
}

/// Hands each response to `observer` in filter order.
pub fn notify_observer(observer: &dyn ResponseObserver, bank: &FilterBank, responses: &[Plane]) {
    for (index, (kernel, response)) in bank.kernels().iter().zip(responses).enumerate() {
        observer.observe(index, kernel, response);
    }
}

/// Texture cue of one region over precomputed magnitude maps.
pub fn region_texture_cue<R: RegionDescriptor>(
    responses: &[Plane],
    region: &R,
) -> [f64; TEXTURE_CUE_WIDTH] {
    debug_assert_eq!(responses.len(), FILTER_COUNT);
    let coords = region.coords();
    let count = coords.len() as f64;

    let mut cue = [0.0; TEXTURE_CUE_WIDTH];
    for (slot, response) in cue.iter_mut().zip(responses) {
        let sum: f64 = coords.iter().map(|&(row, col)| response.at(row, col)).sum();
        *slot = sum / count;
    }

    let filter_means = &cue[..FILTER_COUNT];
    let mean = filter_means.iter().sum::<f64>() / FILTER_COUNT as f64;
    let maximum = filter_means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let median = median(filter_means);

    cue[FILTER_COUNT] = mean;
    cue[FILTER_COUNT + 1] = maximum;
    cue[FILTER_COUNT + 2] = maximum - median;
    cue
}

/// Texture cues for every region, in region order.
pub fn texture_cues<R: RegionDescriptor>(
    responses: &[Plane],
    regions: &[R],
) -> Vec<[f64; TEXTURE_CUE_WIDTH]> {
    regions
        .iter()
        .map(|region| region_texture_cue(responses, region))
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
