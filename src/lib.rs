// THEORY:
// This file is the main entry point for the `region_cues` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (a classifier, a ranking model, or
// the `region_cues` binary).
//
// The primary goal is to export `FeaturePipeline`, `ParallelFeaturePipeline` and their
// associated data structures (`FeatureConfig`, `FeatureMatrix`, `Region`, etc.) as the
// high-level interface for the whole cue engine. The individual stages live in
// `core_modules` and stay usable on their own for callers that need a single cue.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::raster::Image;
pub use core_modules::utils::image_helper::image_helper::ResponsePngWriter;
pub use error::FeatureError;
pub use parallel_pipeline::ParallelFeaturePipeline;
pub use pipeline::{
    CueBlock, DegeneracyPolicy, FEATURE_WIDTH, FeatureConfig, FeatureMatrix, FeaturePipeline,
    FeatureVector, Region, RegionDescriptor, ResponseObserver, column_names, grid_regions,
    regions_from_labels,
};
