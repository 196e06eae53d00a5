use ndarray::{Array4, ArrayView4};
use rand::Rng;

use super::{Shape, layers::Layer};
use crate::error::{ModelErr, Result};

/// A sequential model: an immutable stack of layers applied in order over a
/// flat, externally owned parameter buffer.
#[derive(Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    /// The layers of this model, in forward order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Propagates an input shape through every layer.
    ///
    /// # Returns
    /// The model's output shape, or an error if some layer rejects its input.
    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        self.layers
            .iter()
            .try_fold(input, |shape, layer| layer.output_shape(shape))
    }

    /// Draws a fresh parameter buffer for this model.
    ///
    /// # Arguments
    /// * `rng` - The random number generator the initializers sample from.
    ///
    /// # Returns
    /// A buffer of `self.size()` initial parameter values.
    pub fn init_params<R: Rng>(&self, rng: &mut R) -> Result<Vec<f32>> {
        let mut params = vec![0.; self.size()];

        let mut rest = params.as_mut_slice();
        for layer in &self.layers {
            let (chunk, tail) = rest.split_at_mut(layer.size());
            layer.init_params(chunk, rng)?;
            rest = tail;
        }

        Ok(params)
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - A batch of channels-last images.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(&self, params: &[f32], x: ArrayView4<f32>) -> Result<Array4<f32>> {
        self.check_params(params)?;

        let mut rest = params;
        let mut x = x.to_owned();
        for layer in &self.layers {
            let (chunk, tail) = rest.split_at(layer.size());
            let y = layer.forward(chunk, x.view())?;
            x = y;
            rest = tail;
        }

        Ok(x)
    }

    /// The total regularization penalty of the model under the given parameters.
    pub fn penalty(&self, params: &[f32]) -> Result<f32> {
        self.check_params(params)?;

        let mut rest = params;
        let mut total = 0.;
        for layer in &self.layers {
            let (chunk, tail) = rest.split_at(layer.size());
            total += layer.penalty(chunk);
            rest = tail;
        }

        Ok(total)
    }

    fn check_params(&self, params: &[f32]) -> Result<()> {
        if params.len() != self.size() {
            return Err(ModelErr::SizeMismatch {
                what: "params",
                got: params.len(),
                expected: self.size(),
            });
        }
        Ok(())
    }
}
