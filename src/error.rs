// THEORY:
// Every way a feature extraction can be refused lives in one enum. The pipeline is a
// pure function, so there is nothing to retry: an error means the caller has to fix
// the input (or pick a different degeneracy policy) and call again.
//
// Errors fall into three groups:
// 1.  **Malformed input**: wrong channel count, wrong buffer length, empty regions,
//     pixels outside the image. These are caught before any cue is computed.
// 2.  **Numeric degeneracy**: a representation with zero variance cannot be z-scored,
//     and a zero histogram bin makes the entropy logarithm singular.
// 3.  **Worker failures**: a blocking task in the parallel pipeline panicked or was
//     cancelled.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("image must have 3 channels, found {found}")]
    ChannelCount { found: usize },

    #[error(
        "image buffer holds {actual} samples, expected {expected} for a {height}x{width}x3 raster"
    )]
    SampleCount {
        height: usize,
        width: usize,
        expected: usize,
        actual: usize,
    },

    #[error("image is empty ({height}x{width})")]
    EmptyImage { height: usize, width: usize },

    #[error("non-finite sample at pixel ({row}, {col})")]
    NonFiniteSample { row: usize, col: usize },

    #[error("{representation} representation has zero variance and cannot be normalized")]
    DegenerateImage { representation: &'static str },

    #[error("region collection is empty")]
    NoRegions,

    #[error("region {index} has zero area")]
    EmptyRegion { index: usize },

    #[error("region {index} reports area {area} but holds {coords} pixel coordinates")]
    AreaMismatch {
        index: usize,
        area: usize,
        coords: usize,
    },

    #[error("region {index} contains pixel ({row}, {col}) outside the {height}x{width} image")]
    RegionOutOfBounds {
        index: usize,
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("label map holds {actual} labels, expected {expected}")]
    LabelCount { expected: usize, actual: usize },

    #[error("grid block size must be non-zero, got {rows}x{cols}")]
    InvalidBlockSize { rows: usize, cols: usize },

    #[error("region {index}: {bins}-bin histogram has zero variance across its bins")]
    DegenerateHistogram { index: usize, bins: usize },

    #[error("region {index}: {bins}-bin histogram entropy is singular (a normalized bin is zero)")]
    EntropySingularity { index: usize, bins: usize },

    #[error("could not decode image {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("feature worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
