use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::error::Result;

/// Named weight initialization schemes.
///
/// Each variant describes a distribution whose parameters are derived from the
/// fan of the weight tensor it fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
    /// Truncated normal with `std_dev = sqrt(scale / fan_in)`.
    VarianceScaling { scale: f32 },
    /// Uniform over `±sqrt(6 / (fan_in + fan_out))`.
    GlorotUniform,
    /// Normal with an explicit mean and standard deviation.
    RandomNormal { mean: f32, std_dev: f32 },
}

impl Initializer {
    /// Fills `out` with samples for a weight tensor of the given fans.
    ///
    /// # Arguments
    /// * `out` - The raw weight slice to fill.
    /// * `fan_in` - The number of input units feeding each output unit.
    /// * `fan_out` - The number of output units.
    /// * `rng` - The random number generator to sample from.
    ///
    /// # Returns
    /// An error if the derived distribution parameters are invalid.
    pub fn fill<R: Rng>(
        &self,
        out: &mut [f32],
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<()> {
        match *self {
            Initializer::VarianceScaling { scale } => {
                let std_dev = (scale / fan_in as f32).sqrt();
                let normal = Normal::new(0., std_dev)?;
                for w in out.iter_mut() {
                    // samples beyond two standard deviations are redrawn
                    *w = loop {
                        let sample = normal.sample(rng);
                        if sample.abs() <= 2. * std_dev {
                            break sample;
                        }
                    };
                }
            }
            Initializer::GlorotUniform => {
                let range = (6. / (fan_in + fan_out) as f32).sqrt();
                let uniform = Uniform::new_inclusive(-range, range)?;
                for w in out.iter_mut() {
                    *w = uniform.sample(rng);
                }
            }
            Initializer::RandomNormal { mean, std_dev } => {
                let normal = Normal::new(mean, std_dev)?;
                for w in out.iter_mut() {
                    *w = normal.sample(rng);
                }
            }
        }

        Ok(())
    }
}
