pub mod channel_cues;
pub mod feature_matrix;
pub mod gabor;
pub mod histogram_cues;
pub mod normalization;
pub mod pixel;
pub mod position_cues;
pub mod preprocessor;
pub mod raster;
pub mod region;
pub mod texture_cues;

pub mod utils {
    pub mod image_helper;
}
