// THEORY:
// The texture cue is built on a small bank of complex Gabor filters. Each filter is a
// Gaussian envelope modulated by a complex sinusoid along one orientation; the
// magnitude of its response is high where the image has texture at that orientation
// and spatial frequency.
//
// Key architectural principles:
// 1.  **Fixed bank**: 4 orientations (0, 45, 90, 135 degrees) x 2 frequencies. The bank
//     shape is fixed so the texture block always has 8 + 3 columns; only the two
//     frequencies and the envelope parameters are tunable.
// 2.  **Envelope from bandwidth**: the Gaussian sigma is derived from a bandwidth in
//     octaves and the frequency, and the kernel is truncated at `n_stds` sigmas of the
//     rotated envelope, so coarse filters get large kernels and fine filters small ones.
// 3.  **Periodic convolution**: the image is treated as a torus. Real and imaginary
//     parts are convolved independently and only combined into the magnitude at the end.

use crate::core_modules::raster::{Plane, Raster};
use std::f64::consts::PI;

/// Orientations in the bank.
pub const ORIENTATIONS: usize = 4;
/// Spatial frequencies per orientation.
pub const FREQUENCIES: usize = 2;
/// Filters in the bank.
pub const FILTER_COUNT: usize = ORIENTATIONS * FREQUENCIES;

/// Converts a bandwidth in octaves into the factor `sigma * frequency`.
pub fn sigma_prefactor(bandwidth: f64) -> f64 {
    let b = 2f64.powf(bandwidth);
    (2f64.ln() / 2.0).sqrt() / PI * (b + 1.0) / (b - 1.0)
}

/// One complex Gabor kernel, stored row-major as separate real and imaginary parts.
#[derive(Debug, Clone, PartialEq)]
pub struct GaborKernel {
    /// Cycles per pixel.
    pub frequency: f64,
    /// Orientation in radians.
    pub theta: f64,
    rows: usize,
    cols: usize,
    real: Vec<f64>,
    imaginary: Vec<f64>,
}

impl GaborKernel {
    pub fn new(frequency: f64, theta: f64, bandwidth: f64, n_stds: f64) -> Self {
        let sigma = sigma_prefactor(bandwidth) / frequency;
        let (sin_theta, cos_theta) = theta.sin_cos();

        // Isotropic envelope: the truncation half-width is the same along both axes.
        let half = (n_stds * sigma * cos_theta)
            .abs()
            .max((n_stds * sigma * sin_theta).abs())
            .max(1.0)
            .ceil() as isize;

        let rows = (2 * half + 1) as usize;
        let cols = rows;
        let norm = 2.0 * PI * sigma * sigma;
        let mut real = Vec::with_capacity(rows * cols);
        let mut imaginary = Vec::with_capacity(rows * cols);

        for y in -half..=half {
            for x in -half..=half {
                let (x, y) = (x as f64, y as f64);
                let rot_x = x * cos_theta + y * sin_theta;
                let rot_y = -x * sin_theta + y * cos_theta;
                let envelope =
                    (-0.5 * (rot_x * rot_x + rot_y * rot_y) / (sigma * sigma)).exp() / norm;
                let phase = 2.0 * PI * frequency * rot_x;
                real.push(envelope * phase.cos());
                imaginary.push(envelope * phase.sin());
            }
        }

        Self {
            frequency,
            theta,
            rows,
            cols,
            real,
            imaginary,
        }
    }

    /// `(rows, cols)`; both are always odd.
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn imaginary(&self) -> &[f64] {
        &self.imaginary
    }

    /// Orientation in whole degrees, for labelling.
    pub fn theta_degrees(&self) -> f64 {
        self.theta.to_degrees().round()
    }
}

/// The fixed texture filter bank, ordered orientation-major:
/// `[(0deg, f0), (0deg, f1), (45deg, f0), ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    kernels: Vec<GaborKernel>,
}

impl FilterBank {
    pub fn new(frequencies: [f64; FREQUENCIES], bandwidth: f64, n_stds: f64) -> Self {
        let kernels = (0..ORIENTATIONS)
            .flat_map(|orientation| {
                let theta = orientation as f64 * PI / ORIENTATIONS as f64;
                frequencies
                    .into_iter()
                    .map(move |frequency| GaborKernel::new(frequency, theta, bandwidth, n_stds))
            })
            .collect();
        Self { kernels }
    }

    pub fn kernels(&self) -> &[GaborKernel] {
        &self.kernels
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

/// Convolves `plane` with an odd-sized kernel, wrapping around the image edges.
pub fn convolve_wrap(plane: &Plane, weights: &[f64], rows: usize, cols: usize) -> Plane {
    let (height, width) = plane.shape();
    let (center_row, center_col) = ((rows / 2) as isize, (cols / 2) as isize);
    let mut out = Vec::with_capacity(height * width);

    for row in 0..height {
        for col in 0..width {
            let mut acc = 0.0;
            for k_row in 0..rows {
                let src_row = (row as isize + center_row - k_row as isize)
                    .rem_euclid(height as isize) as usize;
                let weight_row = &weights[k_row * cols..(k_row + 1) * cols];
                for (k_col, &weight) in weight_row.iter().enumerate() {
                    let src_col = (col as isize + center_col - k_col as isize)
                        .rem_euclid(width as isize) as usize;
                    acc += weight * plane.at(src_row, src_col);
                }
            }
            out.push(acc);
        }
    }

    Raster::from_shape(height, width, out)
}

/// Per-pixel magnitude of the complex response of `kernel` over `plane`.
pub fn magnitude_response(plane: &Plane, kernel: &GaborKernel) -> Plane {
    let (rows, cols) = kernel.size();
    let real = convolve_wrap(plane, kernel.real(), rows, cols);
    let imaginary = convolve_wrap(plane, kernel.imaginary(), rows, cols);
    let magnitudes = real
        .samples()
        .iter()
        .zip(imaginary.samples())
        .map(|(re, im)| re.hypot(*im))
        .collect();
    Raster::from_shape(plane.height(), plane.width(), magnitudes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefactor_for_one_octave() {
        assert!((sigma_prefactor(1.0) - 0.562_171_9).abs() < 1e-6);
    }

    #[test]
    fn kernel_size_tracks_frequency() {
        let coarse = GaborKernel::new(0.1, 0.0, 1.0, 3.0);
        let fine = GaborKernel::new(0.4, 0.0, 1.0, 3.0);
        assert_eq!(coarse.size(), (35, 35));
        assert_eq!(fine.size(), (11, 11));
    }

    #[test]
    fn bank_is_orientation_major() {
        let bank = FilterBank::new([0.1, 0.4], 1.0, 3.0);
        assert_eq!(bank.len(), FILTER_COUNT);
        let labels: Vec<(f64, f64)> = bank
            .kernels()
            .iter()
            .map(|k| (k.theta_degrees(), k.frequency))
            .collect();
        assert_eq!(
            labels,
            vec![
                (0.0, 0.1),
                (0.0, 0.4),
                (45.0, 0.1),
                (45.0, 0.4),
                (90.0, 0.1),
                (90.0, 0.4),
                (135.0, 0.1),
                (135.0, 0.4),
            ]
        );
    }

    #[test]
    fn kernel_real_part_peaks_at_center() {
        let kernel = GaborKernel::new(0.4, 0.0, 1.0, 3.0);
        let (rows, cols) = kernel.size();
        let center = (rows / 2) * cols + cols / 2;
        let peak = kernel
            .real()
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        assert_eq!(kernel.real()[center], peak);
        assert_eq!(kernel.imaginary()[center], 0.0);
    }

    #[test]
    fn wrap_convolution_shifts_periodically() {
        // A kernel that picks the left neighbour: out[r][c] = in[r][c - 1].
        let plane = Plane::from_vec(1, 3, vec![1.0, 2.0, 3.0]).expect("valid plane");
        let shifted = convolve_wrap(&plane, &[0.0, 0.0, 1.0], 1, 3);
        assert_eq!(shifted.samples(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn constant_plane_has_constant_response() {
        let plane = Plane::from_vec(4, 5, vec![1.0; 20]).expect("valid plane");
        let kernel = GaborKernel::new(0.4, PI / 4.0, 1.0, 3.0);
        let response = magnitude_response(&plane, &kernel);
        let first = response.samples()[0];
        assert!(response.samples().iter().all(|v| (v - first).abs() < 1e-12));
    }

    /// Mean magnitude of every bank filter over a 20x20 cosine grating.
    fn bank_means(frequency: f64, along_rows: bool) -> Vec<f64> {
        let values = (0..20)
            .flat_map(|row| (0..20).map(move |col| if along_rows { row } else { col }))
            .map(|t| (2.0 * PI * frequency * t as f64).cos())
            .collect();
        let plane = Plane::from_vec(20, 20, values).expect("valid plane");
        FilterBank::new([0.1, 0.4], 1.0, 3.0)
            .kernels()
            .iter()
            .map(|kernel| {
                let response = magnitude_response(&plane, kernel);
                response.samples().iter().sum::<f64>() / 400.0
            })
            .collect()
    }

    fn assert_selective(means: &[f64], expected: usize) {
        assert!((means[expected] - 0.5).abs() < 0.02, "{means:?}");
        for (index, &mean) in means.iter().enumerate() {
            if index != expected {
                assert!(mean < 0.05, "filter {index} leaked: {means:?}");
            }
        }
    }

    #[test]
    fn horizontal_grating_excites_the_zero_degree_coarse_filter() {
        assert_selective(&bank_means(0.1, false), 0);
    }

    #[test]
    fn vertical_grating_excites_the_ninety_degree_coarse_filter() {
        assert_selective(&bank_means(0.1, true), 4);
    }

    #[test]
    fn fine_grating_excites_the_fine_filter() {
        assert_selective(&bank_means(0.4, false), 1);
    }
}
