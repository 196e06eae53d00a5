use ndarray::{Array4, ArrayView4, s};

use crate::{
    arch::Shape,
    error::{ModelErr, Result},
};

/// Parametric ReLU with one learned slope per channel, shared across the
/// spatial axes. Slopes start at zero, so a freshly initialized layer behaves
/// like a plain ReLU.
#[derive(Debug, Clone)]
pub struct PRelu {
    channels: usize,
}

impl PRelu {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    pub fn size(&self) -> usize {
        self.channels
    }

    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        self.check_channels(input.2)?;
        Ok(input)
    }

    pub fn init_params(&self, params: &mut [f32]) {
        params.fill(0.);
    }

    pub fn forward(&self, params: &[f32], x: ArrayView4<f32>) -> Result<Array4<f32>> {
        self.check_channels(x.dim().3)?;

        let mut out = x.to_owned();
        for (c, &alpha) in params.iter().enumerate() {
            out.slice_mut(s![.., .., .., c])
                .mapv_inplace(|z| if z < 0. { alpha * z } else { z });
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
