use ndarray::{Array4, ArrayView4};

use crate::arch::activations::ActFn;

/// Parameterless layer applying a fixed activation function elementwise.
#[derive(Debug, Clone)]
pub struct Activation {
    act_fn: ActFn,
}

impl Activation {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn }
    }

    pub fn forward(&self, x: ArrayView4<f32>) -> Array4<f32> {
        x.mapv(|z| self.act_fn.f(z))
    }
}
