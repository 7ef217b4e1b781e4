// THEORY:
// The `Raster` is the single data container every stage of the cue pipeline reads.
// It is a "dumb" row-major grid: it knows its shape and how to index itself, and
// nothing about normalization or regions.
//
// Key architectural principles:
// 1.  **One layout for every representation**: the input image, the normalized RGB
//     and HSV images, the greyscale planes and the filter responses are all rasters,
//     so region aggregation code indexes all of them the same way: `(row, col)`.
// 2.  **Immutable input**: nothing in the pipeline mutates an `Image`; every derived
//     representation is a fresh raster produced by `map`.
// 3.  **Format-agnostic**: decoding is done by the `image` crate outside the core. The
//     constructors here only adapt already-decoded buffers into `f64` samples.

use crate::error::FeatureError;
use image::{DynamicImage, Rgb32FImage, RgbImage};

/// Number of channels an input image must carry.
pub const CHANNELS: usize = 3;

/// One red/green/blue (or hue/saturation/value) sample triple.
pub type Rgb = [f64; CHANNELS];

/// A row-major height x width grid of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    height: usize,
    width: usize,
    data: Vec<T>,
}

/// A three-channel input image.
pub type Image = Raster<Rgb>;

/// A single-channel plane (greyscale image or filter response).
pub type Plane = Raster<f64>;

impl<T: Copy> Raster<T> {
    /// Wraps a row-major buffer. The buffer must hold exactly `height * width` samples.
    pub fn from_vec(height: usize, width: usize, data: Vec<T>) -> Result<Self, FeatureError> {
        if height == 0 || width == 0 {
            return Err(FeatureError::EmptyImage { height, width });
        }
        let expected = height * width;
        if data.len() != expected {
            return Err(FeatureError::SampleCount {
                height,
                width,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { height, width, data })
    }

    /// Wraps a buffer whose length the caller already guarantees.
    pub(crate) fn from_shape(height: usize, width: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), height * width);
        Self { height, width, data }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`, the order position cues use.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    pub fn samples(&self) -> &[T] {
        &self.data
    }

    /// Applies `f` to every sample, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        F: Fn(T) -> U,
    {
        Raster {
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&sample| f(sample)).collect(),
        }
    }
}

impl Image {
    /// Builds an image from interleaved samples (`[r, g, b, r, g, b, ...]`, row-major).
    pub fn from_raw(
        height: usize,
        width: usize,
        channels: usize,
        samples: &[f64],
    ) -> Result<Self, FeatureError> {
        if channels != CHANNELS {
            return Err(FeatureError::ChannelCount { found: channels });
        }
        if samples.len() != height * width * CHANNELS {
            return Err(FeatureError::SampleCount {
                height,
                width,
                expected: height * width * CHANNELS,
                actual: samples.len(),
            });
        }
        let pixels = samples
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2]])
            .collect();
        Self::from_vec(height, width, pixels)
    }

    /// Builds an image where every channel carries the same grey value.
    pub fn from_grey(height: usize, width: usize, values: &[f64]) -> Result<Self, FeatureError> {
        Self::from_vec(height, width, values.iter().map(|&v| [v, v, v]).collect())
    }

    /// 8-bit samples are kept in their native 0..255 range.
    pub fn from_rgb8(buffer: &RgbImage) -> Result<Self, FeatureError> {
        let pixels = buffer
            .pixels()
            .map(|px| [px[0] as f64, px[1] as f64, px[2] as f64])
            .collect();
        Self::from_vec(buffer.height() as usize, buffer.width() as usize, pixels)
    }

    pub fn from_rgb32f(buffer: &Rgb32FImage) -> Result<Self, FeatureError> {
        let pixels = buffer
            .pixels()
            .map(|px| [px[0] as f64, px[1] as f64, px[2] as f64])
            .collect();
        Self::from_vec(buffer.height() as usize, buffer.width() as usize, pixels)
    }

    /// Accepts any decoded image with exactly three channels. Luma and alpha-carrying
    /// images are rejected rather than silently converted.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, FeatureError> {
        match image {
            DynamicImage::ImageRgb8(buffer) => Self::from_rgb8(buffer),
            DynamicImage::ImageRgb32F(buffer) => Self::from_rgb32f(buffer),
            other => {
                let found = other.color().channel_count() as usize;
                if found != CHANNELS {
                    return Err(FeatureError::ChannelCount { found });
                }
                Self::from_rgb32f(&other.to_rgb32f())
            }
        }
    }

    /// Largest absolute sample over all channels.
    pub fn peak(&self) -> f64 {
        self.data
            .iter()
            .flat_map(|px| px.iter())
            .fold(0.0_f64, |peak, sample| peak.max(sample.abs()))
    }

    /// Multiplies every sample by `factor`.
    pub fn scaled(&self, factor: f64) -> Image {
        self.map(|[r, g, b]| [r * factor, g * factor, b * factor])
    }
}
