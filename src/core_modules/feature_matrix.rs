// THEORY:
// The feature matrix is the only artifact the pipeline hands downstream, so its layout
// is written down as a schema instead of being implied by concatenation order.
//
// Key architectural principles:
// 1.  **Named blocks**: `CueBlock` enumerates the six column blocks in their fixed
//     order and knows each block's width and column range. Adding or reordering a cue
//     means editing one table, not hunting for offsets.
// 2.  **Struct of blocks per row**: `FeatureVector` keeps each cue in its own typed
//     array; the flat 31-column view is derived from it.
// 3.  **Assembly checks row counts**: every cue block must produce exactly one row per
//     region. A mismatch is a bug in the pipeline, not bad input, and aborts with the
//     name of the offending block.

use crate::core_modules::channel_cues::CHANNEL_CUE_WIDTH;
use crate::core_modules::histogram_cues::{COARSE_CUE_WIDTH, FINE_CUE_WIDTH, HistogramCue};
use crate::core_modules::position_cues::POSITION_CUE_WIDTH;
use crate::core_modules::raster::Rgb;
use crate::core_modules::texture_cues::TEXTURE_CUE_WIDTH;
use std::ops::Range;

/// Total number of columns in a feature row.
pub const FEATURE_WIDTH: usize = CHANNEL_CUE_WIDTH
    + CHANNEL_CUE_WIDTH
    + FINE_CUE_WIDTH
    + COARSE_CUE_WIDTH
    + TEXTURE_CUE_WIDTH
    + POSITION_CUE_WIDTH;

/// The column blocks of a feature row, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueBlock {
    Color,
    Hsv,
    Histogram5,
    Histogram3,
    Texture,
    Position,
}

impl CueBlock {
    pub const ALL: [CueBlock; 6] = [
        CueBlock::Color,
        CueBlock::Hsv,
        CueBlock::Histogram5,
        CueBlock::Histogram3,
        CueBlock::Texture,
        CueBlock::Position,
    ];

    pub fn width(self) -> usize {
        match self {
            CueBlock::Color | CueBlock::Hsv => CHANNEL_CUE_WIDTH,
            CueBlock::Histogram5 => FINE_CUE_WIDTH,
            CueBlock::Histogram3 => COARSE_CUE_WIDTH,
            CueBlock::Texture => TEXTURE_CUE_WIDTH,
            CueBlock::Position => POSITION_CUE_WIDTH,
        }
    }

    /// First column of the block.
    pub fn offset(self) -> usize {
        CueBlock::ALL
            .iter()
            .take_while(|&&block| block != self)
            .map(|block| block.width())
            .sum()
    }

    /// The block that owns column `col`, if it is inside the layout.
    pub fn containing(col: usize) -> Option<CueBlock> {
        CueBlock::ALL
            .into_iter()
            .find(|block| block.columns().contains(&col))
    }

    pub fn columns(self) -> Range<usize> {
        let start = self.offset();
        start..start + self.width()
    }

    pub fn name(self) -> &'static str {
        match self {
            CueBlock::Color => "color",
            CueBlock::Hsv => "hsv",
            CueBlock::Histogram5 => "hist5",
            CueBlock::Histogram3 => "hist3",
            CueBlock::Texture => "texture",
            CueBlock::Position => "position",
        }
    }

    pub fn column_names(self) -> &'static [&'static str] {
        match self {
            CueBlock::Color => &["color_r", "color_g", "color_b"],
            CueBlock::Hsv => &["hsv_h", "hsv_s", "hsv_v"],
            CueBlock::Histogram5 => &[
                "hist5_bin0",
                "hist5_bin1",
                "hist5_bin2",
                "hist5_bin3",
                "hist5_bin4",
                "hist5_entropy",
            ],
            CueBlock::Histogram3 => &["hist3_bin0", "hist3_bin1", "hist3_bin2", "hist3_entropy"],
            CueBlock::Texture => &[
                "gabor_0_coarse",
                "gabor_0_fine",
                "gabor_45_coarse",
                "gabor_45_fine",
                "gabor_90_coarse",
                "gabor_90_fine",
                "gabor_135_coarse",
                "gabor_135_fine",
                "gabor_mean",
                "gabor_max",
                "gabor_max_minus_median",
            ],
            CueBlock::Position => &["centroid_row", "centroid_col", "local_row", "local_col"],
        }
    }
}

/// Names of all columns, in layout order.
pub fn column_names() -> Vec<&'static str> {
    CueBlock::ALL
        .iter()
        .flat_map(|block| block.column_names().iter().copied())
        .collect()
}

/// The features of one region, one typed array per cue block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub color: [f64; CHANNEL_CUE_WIDTH],
    pub hsv: [f64; CHANNEL_CUE_WIDTH],
    pub histogram5: [f64; FINE_CUE_WIDTH],
    pub histogram3: [f64; COARSE_CUE_WIDTH],
    pub texture: [f64; TEXTURE_CUE_WIDTH],
    pub position: [f64; POSITION_CUE_WIDTH],
}

impl FeatureVector {
    pub fn block(&self, block: CueBlock) -> &[f64] {
        match block {
            CueBlock::Color => &self.color,
            CueBlock::Hsv => &self.hsv,
            CueBlock::Histogram5 => &self.histogram5,
            CueBlock::Histogram3 => &self.histogram3,
            CueBlock::Texture => &self.texture,
            CueBlock::Position => &self.position,
        }
    }

    /// The flat row in column order.
    pub fn to_row(&self) -> [f64; FEATURE_WIDTH] {
        let mut row = [0.0; FEATURE_WIDTH];
        for block in CueBlock::ALL {
            row[block.columns()].copy_from_slice(self.block(block));
        }
        row
    }
}

/// Region-by-feature table; row `i` describes region `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        FEATURE_WIDTH
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&FeatureVector> {
        self.rows.get(index)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let features = self.rows.get(row)?;
        let block = CueBlock::containing(col)?;
        Some(features.block(block)[col - block.offset()])
    }

    pub fn to_dense(&self) -> Vec<[f64; FEATURE_WIDTH]> {
        self.rows.iter().map(FeatureVector::to_row).collect()
    }

    /// Row-major flat buffer of `row_count() * 31` values.
    pub fn to_flat(&self) -> Vec<f64> {
        self.rows.iter().flat_map(|features| features.to_row()).collect()
    }
}

/// Per-cue outputs for a run of regions, before assembly.
#[derive(Debug, Clone, Default)]
pub struct CueBlocks {
    pub color: Vec<Rgb>,
    pub hsv: Vec<Rgb>,
    pub histogram: Vec<HistogramCue>,
    pub texture: Vec<[f64; TEXTURE_CUE_WIDTH]>,
    pub position: Vec<[f64; POSITION_CUE_WIDTH]>,
}

impl CueBlocks {
    pub fn with_capacity(regions: usize) -> Self {
        Self {
            color: Vec::with_capacity(regions),
            hsv: Vec::with_capacity(regions),
            histogram: Vec::with_capacity(regions),
            texture: Vec::with_capacity(regions),
            position: Vec::with_capacity(regions),
        }
    }

    /// Appends a later run of regions after this one.
    pub fn append(&mut self, mut later: CueBlocks) {
        self.color.append(&mut later.color);
        self.hsv.append(&mut later.hsv);
        self.histogram.append(&mut later.histogram);
        self.texture.append(&mut later.texture);
        self.position.append(&mut later.position);
    }

    /// Rows produced for `block`. Both histogram blocks come from one extractor.
    pub fn row_count(&self, block: CueBlock) -> usize {
        match block {
            CueBlock::Color => self.color.len(),
            CueBlock::Hsv => self.hsv.len(),
            CueBlock::Histogram5 | CueBlock::Histogram3 => self.histogram.len(),
            CueBlock::Texture => self.texture.len(),
            CueBlock::Position => self.position.len(),
        }
    }
}

/// Joins the cue blocks into the feature matrix.
///
/// # Panics
/// If any block does not hold exactly `region_count` rows.
pub fn assemble(blocks: CueBlocks, region_count: usize) -> FeatureMatrix {
    for block in CueBlock::ALL {
        let rows = blocks.row_count(block);
        assert_eq!(
            rows,
            region_count,
            "{} cue block produced {} rows for {} regions",
            block.name(),
            rows,
            region_count
        );
    }

    let rows = (0..region_count)
        .map(|i| FeatureVector {
            color: blocks.color[i],
            hsv: blocks.hsv[i],
            histogram5: blocks.histogram[i].fine,
            histogram3: blocks.histogram[i].coarse,
            texture: blocks.texture[i],
            position: blocks.position[i],
        })
        .collect();
    FeatureMatrix { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_blocks(regions: usize) -> CueBlocks {
        let mut blocks = CueBlocks::with_capacity(regions);
        for r in 0..regions {
            let base = (r * 100) as f64;
            let mut next = base;
            let mut fill = |slot: &mut [f64]| {
                for v in slot.iter_mut() {
                    *v = next;
                    next += 1.0;
                }
            };
            let mut color = [0.0; 3];
            let mut hsv = [0.0; 3];
            let mut histogram = HistogramCue {
                fine: [0.0; FINE_CUE_WIDTH],
                coarse: [0.0; COARSE_CUE_WIDTH],
            };
            let mut texture = [0.0; TEXTURE_CUE_WIDTH];
            let mut position = [0.0; POSITION_CUE_WIDTH];
            fill(&mut color);
            fill(&mut hsv);
            fill(&mut histogram.fine);
            fill(&mut histogram.coarse);
            fill(&mut texture);
            fill(&mut position);
            blocks.color.push(color);
            blocks.hsv.push(hsv);
            blocks.histogram.push(histogram);
            blocks.texture.push(texture);
            blocks.position.push(position);
        }
        blocks
    }

    #[test]
    fn layout_is_thirty_one_columns_in_fixed_blocks() {
        assert_eq!(FEATURE_WIDTH, 31);
        assert_eq!(CueBlock::Color.columns(), 0..3);
        assert_eq!(CueBlock::Hsv.columns(), 3..6);
        assert_eq!(CueBlock::Histogram5.columns(), 6..12);
        assert_eq!(CueBlock::Histogram3.columns(), 12..16);
        assert_eq!(CueBlock::Texture.columns(), 16..27);
        assert_eq!(CueBlock::Position.columns(), 27..31);
        assert_eq!(column_names().len(), FEATURE_WIDTH);
    }

    #[test]
    fn assembled_rows_are_contiguous_in_block_order() {
        let matrix = assemble(numbered_blocks(2), 2);
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.column_count(), 31);
        let dense = matrix.to_dense();
        for (r, row) in dense.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                assert_eq!(value, (r * 100 + c) as f64);
            }
        }
        assert_eq!(matrix.get(1, 30), Some(130.0));
        assert_eq!(matrix.get(1, 31), None);
        assert_eq!(matrix.get(2, 0), None);
        for (r, row) in dense.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                assert_eq!(matrix.get(r, c), Some(value));
            }
        }
        assert_eq!(matrix.to_flat().len(), 62);
    }

    #[test]
    fn every_column_has_one_owning_block() {
        assert_eq!(CueBlock::containing(0), Some(CueBlock::Color));
        assert_eq!(CueBlock::containing(11), Some(CueBlock::Histogram5));
        assert_eq!(CueBlock::containing(12), Some(CueBlock::Histogram3));
        assert_eq!(CueBlock::containing(26), Some(CueBlock::Texture));
        assert_eq!(CueBlock::containing(30), Some(CueBlock::Position));
        assert_eq!(CueBlock::containing(FEATURE_WIDTH), None);
    }

    #[test]
    fn append_keeps_batch_order() {
        let mut first = numbered_blocks(1);
        let second = numbered_blocks(2);
        first.append(second);
        assert_eq!(first.row_count(CueBlock::Texture), 3);
        assert_eq!(first.color[1], [0.0, 1.0, 2.0]);
        assert_eq!(first.color[2], [100.0, 101.0, 102.0]);
    }

    #[test]
    #[should_panic(expected = "texture cue block produced 1 rows for 2 regions")]
    fn short_block_is_fatal() {
        let mut blocks = numbered_blocks(2);
        blocks.texture.pop();
        assemble(blocks, 2);
    }
}
