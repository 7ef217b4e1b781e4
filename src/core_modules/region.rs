// THEORY:
// A region is one element of an upstream partition of the image (a superpixel). The
// cue pipeline never produces regions, it only consumes them, so the contract is a
// trait: anything that can hand over its pixel coordinates, its area, its centroid and
// its local centroid can be featurized.
//
// Key architectural principles:
// 1.  **Contract, not implementation**: `RegionDescriptor` is the seam to whatever
//     segmenter produced the partition. `Region` is the crate's own implementation,
//     built from coordinates or from a dense label map.
// 2.  **Identity is position**: a region's identity is its index in the ordered
//     collection handed to the pipeline, and row `i` of the feature matrix always
//     describes region `i`.
// 3.  **No partition checks**: overlaps and gaps are the segmenter's problem. Only
//     per-region sanity (non-empty, consistent area, inside the image) is validated,
//     and always before any cue is computed.

use crate::error::FeatureError;
use std::collections::BTreeMap;

/// A pixel position as `(row, col)`.
pub type PixelCoord = (usize, usize);

/// The read-only view of a region the cue extractors rely on.
pub trait RegionDescriptor {
    /// The pixels that belong to the region, in no particular order.
    fn coords(&self) -> &[PixelCoord];
    /// Pixel count; must equal `coords().len()`.
    fn area(&self) -> usize;
    /// Mean `(row, col)` in the image frame.
    fn centroid(&self) -> (f64, f64);
    /// Mean `(row, col)` relative to the region's bounding box.
    fn local_centroid(&self) -> (f64, f64);
}

/// Axis-aligned bounds of a region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

/// A region with its geometry computed once from its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// The segmenter's label for this region.
    pub label: u32,
    coords: Vec<PixelCoord>,
    centroid: (f64, f64),
    local_centroid: (f64, f64),
    bounding_box: Option<BoundingBox>,
}

impl Region {
    /// Computes area, centroid, bounding box and local centroid from `coords`.
    /// An empty coordinate list yields a zero-area region that the pipeline rejects.
    pub fn from_coords(label: u32, coords: Vec<PixelCoord>) -> Self {
        let bounding_box = bounding_box(&coords);
        let (centroid, local_centroid) = match bounding_box {
            Some(bounds) => {
                let count = coords.len() as f64;
                let (row_sum, col_sum) = coords
                    .iter()
                    .fold((0.0, 0.0), |(r, c), &(row, col)| (r + row as f64, c + col as f64));
                let centroid = (row_sum / count, col_sum / count);
                let local = (
                    centroid.0 - bounds.min_row as f64,
                    centroid.1 - bounds.min_col as f64,
                );
                (centroid, local)
            }
            None => ((0.0, 0.0), (0.0, 0.0)),
        };
        Self {
            label,
            coords,
            centroid,
            local_centroid,
            bounding_box,
        }
    }

    /// Uses geometry supplied by an external segmenter instead of recomputing it.
    pub fn with_geometry(
        label: u32,
        coords: Vec<PixelCoord>,
        centroid: (f64, f64),
        local_centroid: (f64, f64),
    ) -> Self {
        let bounding_box = bounding_box(&coords);
        Self {
            label,
            coords,
            centroid,
            local_centroid,
            bounding_box,
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }
}

impl RegionDescriptor for Region {
    fn coords(&self) -> &[PixelCoord] {
        &self.coords
    }

    fn area(&self) -> usize {
        self.coords.len()
    }

    fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    fn local_centroid(&self) -> (f64, f64) {
        self.local_centroid
    }
}

fn bounding_box(coords: &[PixelCoord]) -> Option<BoundingBox> {
    let (&(first_row, first_col), rest) = coords.split_first()?;
    Some(rest.iter().fold(
        BoundingBox {
            min_row: first_row,
            min_col: first_col,
            max_row: first_row,
            max_col: first_col,
        },
        |bounds, &(row, col)| BoundingBox {
            min_row: bounds.min_row.min(row),
            min_col: bounds.min_col.min(col),
            max_row: bounds.max_row.max(row),
            max_col: bounds.max_col.max(col),
        },
    ))
}

/// Builds one region per non-zero label of a row-major label map, ordered by label.
/// Label 0 marks background and produces no region.
pub fn regions_from_labels(
    labels: &[u32],
    height: usize,
    width: usize,
) -> Result<Vec<Region>, FeatureError> {
    let expected = height * width;
    if labels.len() != expected {
        return Err(FeatureError::LabelCount {
            expected,
            actual: labels.len(),
        });
    }

    let mut grouped: BTreeMap<u32, Vec<PixelCoord>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        if label == 0 {
            continue;
        }
        grouped
            .entry(label)
            .or_default()
            .push((index / width, index % width));
    }

    Ok(grouped
        .into_iter()
        .map(|(label, coords)| Region::from_coords(label, coords))
        .collect())
}

/// Partitions the image into `block_rows` x `block_cols` tiles (edge tiles may be
/// smaller), labelled 1.. in row-major tile order.
pub fn grid_regions(
    height: usize,
    width: usize,
    block_rows: usize,
    block_cols: usize,
) -> Result<Vec<Region>, FeatureError> {
    if block_rows == 0 || block_cols == 0 {
        return Err(FeatureError::InvalidBlockSize {
            rows: block_rows,
            cols: block_cols,
        });
    }
    let tiles_per_row = width.div_ceil(block_cols);
    let labels: Vec<u32> = (0..height * width)
        .map(|index| {
            let (row, col) = (index / width, index % width);
            let tile = (row / block_rows) * tiles_per_row + col / block_cols;
            tile as u32 + 1
        })
        .collect();
    regions_from_labels(&labels, height, width)
}

/// Rejects region collections the cue extractors cannot process.
pub fn validate_regions<R: RegionDescriptor>(
    regions: &[R],
    shape: (usize, usize),
) -> Result<(), FeatureError> {
    if regions.is_empty() {
        return Err(FeatureError::NoRegions);
    }
    let (height, width) = shape;
    for (index, region) in regions.iter().enumerate() {
        let coords = region.coords();
        if region.area() == 0 || coords.is_empty() {
            return Err(FeatureError::EmptyRegion { index });
        }
        if region.area() != coords.len() {
            return Err(FeatureError::AreaMismatch {
                index,
                area: region.area(),
                coords: coords.len(),
            });
        }
        if let Some(&(row, col)) = coords
            .iter()
            .find(|&&(row, col)| row >= height || col >= width)
        {
            return Err(FeatureError::RegionOutOfBounds {
                index,
                row,
                col,
                height,
                width,
            });
        }
    }
    Ok(())
}
