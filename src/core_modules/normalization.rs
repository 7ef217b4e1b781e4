// THEORY:
// Z-score normalization is used at two very different scales in the cue pipeline:
// once per image (the RGB, greyscale and HSV representations each get one global
// mean/std pair) and once per region (each histogram is normalized across its own
// bins). Both go through `ZScore`.
//
// The population standard deviation (divide by N) is used throughout. A population
// with zero spread cannot be normalized; what happens then is decided by the caller:
// whole-image degeneracy is always an error, per-region degeneracy follows the
// configured `DegeneracyPolicy`.

/// How per-region numeric singularities are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneracyPolicy {
    /// Stop the whole extraction with a descriptive error.
    FailFast,
    /// Zero-variance histograms become all-zero bins and `0 * ln 0` counts as 0.
    #[default]
    Guarded,
}

/// A fitted mean/standard-deviation pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScore {
    pub mean: f64,
    pub std_dev: f64,
}

impl ZScore {
    /// Fits mean and population standard deviation over `values`.
    /// An empty population yields `NaN` for both.
    pub fn fit<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64> + Clone,
    {
        let (count, sum) = values
            .clone()
            .into_iter()
            .fold((0usize, 0.0), |(count, sum), v| (count + 1, sum + v));
        let mean = sum / count as f64;
        let variance = values
            .into_iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// True when the spread is too small (or not finite) to divide by.
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        !(self.std_dev.is_finite() && self.std_dev > epsilon)
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}
