use ndarray::{Array4, ArrayView4, s};

use crate::{
    arch::Shape,
    error::{ModelErr, Result},
};

const EPSILON: f32 = 1e-3;

/// Batch normalization in inference mode: a per-channel affine transform
/// driven by the stored moving statistics.
///
/// Parameter layout: `gamma`, `beta`, moving mean, moving variance, each one
/// value per channel. A freshly initialized layer (1, 0, 0, 1) is a
/// near-identity map.
#[derive(Debug, Clone)]
pub struct BatchNorm {
    channels: usize,
}

impl BatchNorm {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    pub fn size(&self) -> usize {
        4 * self.channels
    }

    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        self.check_channels(input.2)?;
        Ok(input)
    }

    pub fn init_params(&self, params: &mut [f32]) {
        let (gamma, rest) = params.split_at_mut(self.channels);
        let (beta, stats) = rest.split_at_mut(self.channels);
        let (mean, var) = stats.split_at_mut(self.channels);
        gamma.fill(1.);
        beta.fill(0.);
        mean.fill(0.);
        var.fill(1.);
    }

    pub fn forward(&self, params: &[f32], x: ArrayView4<f32>) -> Result<Array4<f32>> {
        self.check_channels(x.dim().3)?;

        let (gamma, rest) = params.split_at(self.channels);
        let (beta, stats) = rest.split_at(self.channels);
        let (mean, var) = stats.split_at(self.channels);

        let mut out = x.to_owned();
        for c in 0..self.channels {
            let scale = gamma[c] / (var[c] + EPSILON).sqrt();
            let shift = beta[c] - mean[c] * scale;
            out.slice_mut(s![.., .., .., c])
                .mapv_inplace(|z| z * scale + shift);
        }

        Ok(out)
    }

    fn check_channels(&self, got: usize) -> Result<()> {
        if got != self.channels {
            return Err(ModelErr::ChannelMismatch {
                got,
                expected: self.channels,
            });
        }
        Ok(())
    }
}
