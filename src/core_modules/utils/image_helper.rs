// Image file I/O at the edge of the pipeline: decoding input images from disk and
// writing filter magnitude maps as greyscale PNGs for offline inspection.

pub mod image_helper {
    use crate::core_modules::gabor::GaborKernel;
    use crate::core_modules::raster::{Image, Plane};
    use crate::core_modules::texture_cues::ResponseObserver;
    use crate::error::FeatureError;
    use image::ImageEncoder;
    use std::path::{Path, PathBuf};

    /// Decodes the file at `path`. Only three-channel images are accepted; luma and
    /// alpha-carrying files fail with `ChannelCount` instead of being converted.
    pub fn load(path: &Path) -> Result<Image, FeatureError> {
        let decoded = image::open(path).map_err(|source| FeatureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Image::from_dynamic(&decoded)
    }

    /// Min-max scales `plane` into 8-bit grey levels. A constant plane maps to black.
    pub fn to_grey_bytes(plane: &Plane) -> Vec<u8> {
        let (low, high) = plane
            .samples()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = high - low;
        plane
            .samples()
            .iter()
            .map(|&v| {
                if span > 0.0 {
                    ((v - low) / span * 255.0).round() as u8
                } else {
                    0
                }
            })
            .collect()
    }

    pub fn save(path: &Path, plane: &Plane) -> Result<(), image::error::ImageError> {
        let buffer = to_grey_bytes(plane);
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            &buffer,
            plane.width() as u32,
            plane.height() as u32,
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }

    /// A `ResponseObserver` that saves every magnitude map into one directory.
    #[derive(Debug, Clone)]
    pub struct ResponsePngWriter {
        directory: PathBuf,
    }

    impl ResponsePngWriter {
        pub fn new(directory: impl Into<PathBuf>) -> Self {
            Self {
                directory: directory.into(),
            }
        }

        /// e.g. `response_03_theta45_f0.40.png`
        pub fn path_for(&self, filter_index: usize, kernel: &GaborKernel) -> PathBuf {
            self.directory.join(format!(
                "response_{:02}_theta{}_f{:.2}.png",
                filter_index,
                kernel.theta_degrees(),
                kernel.frequency
            ))
        }
    }

    impl ResponseObserver for ResponsePngWriter {
        fn observe(&self, filter_index: usize, kernel: &GaborKernel, response: &Plane) {
            let path = self.path_for(filter_index, kernel);
            let result = std::fs::create_dir_all(&self.directory)
                .map_err(image::error::ImageError::from)
                .and_then(|_| save(&path, response));
            match result {
                Ok(()) => tracing::debug!(path = %path.display(), "saved filter response"),
                Err(err) => tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "could not save filter response"
                ),
            }
        }
    }
}
