// THEORY (single-pixel color transforms):
// The `Pixel` module holds the per-pixel heuristics the preprocessor needs. Every
// function here looks at one RGB triple and nothing else: no neighbors, no image-wide
// statistics. Anything that needs more than one pixel (normalization, histograms,
// filtering) lives in the higher-level cue modules.
//
// What lives here:
// - Luminance: the Rec. 709 style weighted sum used to reduce RGB to greyscale.
// - HSV: the hexcone model. Value is the largest channel, saturation is chroma over
//   value, hue is the angle on the color wheel expressed as a fraction of a full turn
//   in [0, 1) so it sits on the same scale as saturation and value.
//
// Samples are `f64` and range-agnostic. The preprocessor divides by the image's peak
// sample before calling `to_hsv`, so HSV is computed on a [0, 1]-style scale regardless
// of whether the source image was 8-bit, 16-bit or floating point.

pub mod pixel {
    use crate::core_modules::raster::Rgb;

    pub type Channel = f64;
    pub type Luminance = f64;
    pub type Hue = f64;
    pub type SaturationHSV = f64;
    pub type ValueHSV = f64;
    pub type Chroma = f64;

    // Luminance weights (ITU-R BT.709 primaries).
    const RED_WEIGHT: f64 = 0.2125;
    const GREEN_WEIGHT: f64 = 0.7154;
    const BLUE_WEIGHT: f64 = 0.0721;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Builds a pixel with every channel multiplied by `factor`.
        pub fn scaled(rgb: Rgb, factor: f64) -> Self {
            Self::new(rgb[0] * factor, rgb[1] * factor, rgb[2] * factor)
        }

        /// Greyscale reduction of the three channels.
        pub fn luminance(&self) -> Luminance {
            RED_WEIGHT * self.red + GREEN_WEIGHT * self.green + BLUE_WEIGHT * self.blue
        }

        /// HSV Value (V): brightness defined as max(R, G, B).
        pub fn value_hsv(&self) -> ValueHSV {
            self.red.max(self.green.max(self.blue))
        }

        /// Chroma (C): max(R,G,B) - min(R,G,B).
        pub fn chroma(&self) -> Chroma {
            self.value_hsv() - self.red.min(self.green.min(self.blue))
        }

        /// Saturation (HSV): S = chroma / value, zero for black.
        pub fn saturation_hsv(&self) -> SaturationHSV {
            let value = self.value_hsv();
            if value == 0.0 {
                return 0.0;
            }
            self.chroma() / value
        }

        /// Hue as a fraction of a full turn, in [0, 1). Grey pixels have hue 0.
        pub fn hue(&self) -> Hue {
            let maximum_channel = self.value_hsv();
            let chroma = self.chroma();

            if chroma <= 0.0 {
                return 0.0;
            }

            let inverse_chroma = 1.0 / chroma;

            let (base_difference, sector_offset) = if maximum_channel == self.red {
                (self.green - self.blue, 0.0)
            } else if maximum_channel == self.green {
                (self.blue - self.red, 2.0)
            } else {
                (self.red - self.green, 4.0)
            };

            ((base_difference * inverse_chroma + sector_offset) / 6.0).rem_euclid(1.0)
        }

        /// `[hue, saturation, value]`.
        pub fn to_hsv(&self) -> Rgb {
            [self.hue(), self.saturation_hsv(), self.value_hsv()]
        }
    }

    impl From<Rgb> for Pixel {
        fn from(rgb: Rgb) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2])
        }
    }

    impl From<Pixel> for Rgb {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue]
        }
    }
}
