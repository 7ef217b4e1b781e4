// THEORY:
// Position cues place a region in the frame: its centroid and its local centroid are
// both shifted by half the image shape and divided by the shape, giving coordinates
// centred on the image middle in a roughly [-0.5, 0.5] range. Coordinates are
// `(row, col)` and the shape is `(height, width)`.

use crate::core_modules::region::RegionDescriptor;

/// Centroid row/col offsets followed by local-centroid row/col offsets.
pub const POSITION_CUE_WIDTH: usize = 4;

fn centred(point: (f64, f64), shape: (usize, usize)) -> (f64, f64) {
    let (height, width) = (shape.0 as f64, shape.1 as f64);
    (
        (point.0 - 0.5 * height) / height,
        (point.1 - 0.5 * width) / width,
    )
}

pub fn region_position_cue<R: RegionDescriptor>(
    region: &R,
    shape: (usize, usize),
) -> [f64; POSITION_CUE_WIDTH] {
    let (row, col) = centred(region.centroid(), shape);
    let (local_row, local_col) = centred(region.local_centroid(), shape);
    [row, col, local_row, local_col]
}

pub fn position_cues<R: RegionDescriptor>(
    regions: &[R],
    shape: (usize, usize),
) -> Vec<[f64; POSITION_CUE_WIDTH]> {
    regions
        .iter()
        .map(|region| region_position_cue(region, shape))
        .collect()
}
