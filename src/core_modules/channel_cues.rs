// THEORY:
// Color and HSV cues are the same algorithm over two different normalized images:
// the mean of each of the three channels over exactly the region's pixels. This is
// the region-level analogue of averaging a chunk of pixels: spatial pooling cancels
// per-pixel noise and leaves one summary triple per region.

use crate::core_modules::raster::{Raster, Rgb};
use crate::core_modules::region::RegionDescriptor;

/// Width of a color or HSV cue block.
pub const CHANNEL_CUE_WIDTH: usize = 3;

/// Per-channel mean of `raster` over the region's coordinates.
pub fn region_channel_mean<R: RegionDescriptor>(raster: &Raster<Rgb>, region: &R) -> Rgb {
    let coords = region.coords();
    let sums = coords.iter().fold([0.0; CHANNEL_CUE_WIDTH], |mut sums, &(row, col)| {
        let sample = raster.at(row, col);
        for channel in 0..CHANNEL_CUE_WIDTH {
            sums[channel] += sample[channel];
        }
        sums
    });
    let count = coords.len() as f64;
    sums.map(|sum| sum / count)
}

/// One channel-mean triple per region, in region order.
pub fn channel_cues<R: RegionDescriptor>(raster: &Raster<Rgb>, regions: &[R]) -> Vec<Rgb> {
    regions
        .iter()
        .map(|region| region_channel_mean(raster, region))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::raster::Image;
    use crate::core_modules::region::Region;

    #[test]
    fn mean_covers_only_region_pixels() {
        let image = Image::from_raw(
            1,
            3,
            3,
            &[1.0, 2.0, 3.0, 3.0, 4.0, 5.0, 100.0, 100.0, 100.0],
        )
        .expect("valid image");
        let region = Region::from_coords(1, vec![(0, 0), (0, 1)]);
        assert_eq!(region_channel_mean(&image, &region), [2.0, 3.0, 4.0]);
    }

    #[test]
    fn cues_keep_region_order() {
        let image = Image::from_grey(1, 2, &[1.0, 9.0]).expect("valid image");
        let regions = vec![
            Region::from_coords(1, vec![(0, 1)]),
            Region::from_coords(2, vec![(0, 0)]),
        ];
        let cues = channel_cues(&image, &regions);
        assert_eq!(cues, vec![[9.0; 3], [1.0; 3]]);
    }
}
