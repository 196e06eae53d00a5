use ndarray::{Array4, ArrayView4};
use rand::Rng;

use super::{Activation, BatchNorm, Conv2D, ConvConfig, ConvTranspose2D, PRelu};
use crate::{
    arch::{Shape, activations::ActFn},
    error::Result,
    init::Initializer,
};

/// The layer kinds a model can be composed of.
#[derive(Debug, Clone)]
pub enum Layer {
    Conv2D(Conv2D),
    ConvTranspose2D(ConvTranspose2D),
    PRelu(PRelu),
    BatchNorm(BatchNorm),
    Activation(Activation),
}
use Layer::*;

impl Layer {
    pub fn conv2d(
        in_channels: usize,
        filters: usize,
        kernel: usize,
        cfg: ConvConfig,
    ) -> Result<Self> {
        Ok(Self::Conv2D(Conv2D::new(in_channels, filters, kernel, cfg)?))
    }

    pub fn conv_transpose2d(
        in_channels: usize,
        filters: usize,
        kernel: usize,
        stride: usize,
        init: Initializer,
    ) -> Result<Self> {
        Ok(Self::ConvTranspose2D(ConvTranspose2D::new(
            in_channels,
            filters,
            kernel,
            stride,
            init,
        )?))
    }

    pub fn prelu(channels: usize) -> Self {
        Self::PRelu(PRelu::new(channels))
    }

    pub fn batch_norm(channels: usize) -> Self {
        Self::BatchNorm(BatchNorm::new(channels))
    }

    pub fn activation(act_fn: ActFn) -> Self {
        Self::Activation(Activation::new(act_fn))
    }

    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        match self {
            Conv2D(l) => l.size(),
            ConvTranspose2D(l) => l.size(),
            PRelu(l) => l.size(),
            BatchNorm(l) => l.size(),
            Activation(_) => 0,
        }
    }

    /// The shape this layer produces for the given input shape.
    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        match self {
            Conv2D(l) => l.output_shape(input),
            ConvTranspose2D(l) => l.output_shape(input),
            PRelu(l) => l.output_shape(input),
            BatchNorm(l) => l.output_shape(input),
            Activation(_) => Ok(input),
        }
    }

    /// Writes this layer's initial parameter values into `params`.
    pub fn init_params<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        match self {
            Conv2D(l) => l.init_params(params, rng),
            ConvTranspose2D(l) => l.init_params(params, rng),
            PRelu(l) => {
                l.init_params(params);
                Ok(())
            }
            BatchNorm(l) => {
                l.init_params(params);
                Ok(())
            }
            Activation(_) => Ok(()),
        }
    }

    pub fn forward(&self, params: &[f32], x: ArrayView4<f32>) -> Result<Array4<f32>> {
        match self {
            Conv2D(l) => l.forward(params, x),
            ConvTranspose2D(l) => l.forward(params, x),
            PRelu(l) => l.forward(params, x),
            BatchNorm(l) => l.forward(params, x),
            Activation(l) => Ok(l.forward(x)),
        }
    }

    /// The regularization penalty of this layer under the given parameters.
    pub fn penalty(&self, params: &[f32]) -> f32 {
        match self {
            Conv2D(l) => l.penalty(params),
            _ => 0.,
        }
    }
}
