// THEORY:
// The preprocessor runs once per image and derives every representation the cue
// extractors read. It is the only stage that touches the whole image before region
// aggregation, so it is also where whole-image degeneracy is detected.
//
// Representations:
// - `rgb_normalized`: all three channels z-scored with ONE global mean/std pair
//   taken over every sample of every channel.
// - `grey`: luminance reduction, left unnormalized (histograms bin it per region).
// - `grey_normalized`: `grey` z-scored, the input of the texture filter bank.
// - `hsv_normalized`: HSV computed on peak-scaled samples, then z-scored jointly
//   across its three channels.
//
// Because every output is a z-score (or, for `grey`, only ever binned over the
// region's own range), multiplying the input by a positive constant leaves every
// color, HSV and histogram cue unchanged.

use crate::core_modules::normalization::ZScore;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::raster::{Image, Plane, Raster, Rgb};
use crate::error::FeatureError;

/// All image-wide representations derived from one input image.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// `(height, width)` of the source image.
    pub shape: (usize, usize),
    pub rgb_normalized: Raster<Rgb>,
    pub grey: Plane,
    pub grey_normalized: Plane,
    pub hsv_normalized: Raster<Rgb>,
}

/// Derives the normalized representations of `image`.
pub fn preprocess(image: &Image) -> Result<Preprocessed, FeatureError> {
    check_finite(image)?;

    let rgb_normalized = normalize_channels(image, "rgb")?;

    let grey = image.map(|rgb| Pixel::from(rgb).luminance());
    let grey_normalized = normalize_plane(&grey, "greyscale")?;

    // A zero peak means an all-black image, which the rgb check above already rejected.
    let inverse_peak = 1.0 / image.peak();
    let hsv = image.map(|rgb| Pixel::scaled(rgb, inverse_peak).to_hsv());
    let hsv_normalized = normalize_channels(&hsv, "hsv")?;

    tracing::debug!(
        height = image.height(),
        width = image.width(),
        "preprocessed image representations"
    );

    Ok(Preprocessed {
        shape: image.shape(),
        rgb_normalized,
        grey,
        grey_normalized,
        hsv_normalized,
    })
}

fn check_finite(image: &Image) -> Result<(), FeatureError> {
    match image
        .samples()
        .iter()
        .position(|px| px.iter().any(|sample| !sample.is_finite()))
    {
        Some(index) => Err(FeatureError::NonFiniteSample {
            row: index / image.width(),
            col: index % image.width(),
        }),
        None => Ok(()),
    }
}

fn normalize_channels(
    raster: &Raster<Rgb>,
    representation: &'static str,
) -> Result<Raster<Rgb>, FeatureError> {
    let stats = ZScore::fit(raster.samples().iter().flat_map(|px| px.iter().copied()));
    if stats.is_degenerate(0.0) {
        return Err(FeatureError::DegenerateImage { representation });
    }
    Ok(raster.map(|[a, b, c]| [stats.apply(a), stats.apply(b), stats.apply(c)]))
}

fn normalize_plane(plane: &Plane, representation: &'static str) -> Result<Plane, FeatureError> {
    let stats = ZScore::fit(plane.samples().iter().copied());
    if stats.is_degenerate(0.0) {
        return Err(FeatureError::DegenerateImage { representation });
    }
    Ok(plane.map(|v| stats.apply(v)))
}
