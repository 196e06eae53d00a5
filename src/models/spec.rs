use serde::{Deserialize, Serialize};

use super::{fsrcnn, ircnn};
use crate::{
    arch::{Sequential, Shape},
    error::Result,
};

/// Model selection and configuration.
///
/// Every architecture hyperparameter is carried explicitly, so assembling a
/// model from a stored spec is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    /// Super-resolution network with a learned upsampling stage.
    Fsrcnn { input_shape: Shape, upscale: usize },
    /// Dilated-convolution denoising network.
    Ircnn { input_shape: Shape },
}

impl ModelSpec {
    /// Assembles the model this spec describes.
    pub fn build(&self) -> Result<Sequential> {
        match *self {
            ModelSpec::Fsrcnn {
                input_shape,
                upscale,
            } => fsrcnn(input_shape, upscale),
            ModelSpec::Ircnn { input_shape } => ircnn(input_shape),
        }
    }

    /// The input shape the model expects.
    pub fn input_shape(&self) -> Shape {
        match *self {
            ModelSpec::Fsrcnn { input_shape, .. } | ModelSpec::Ircnn { input_shape } => input_shape,
        }
    }

    /// Total number of parameters in the flat buffer for this model.
    pub fn num_params(&self) -> Result<usize> {
        Ok(self.build()?.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let spec = ModelSpec::Fsrcnn {
            input_shape: (32, 32, 1),
            upscale: 3,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("fsrcnn"));

        let back: ModelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.input_shape(), (32, 32, 1));
        assert_eq!(back.num_params().unwrap(), spec.num_params().unwrap());
    }

    #[test]
    fn builds_the_selected_architecture() {
        let spec = ModelSpec::Ircnn {
            input_shape: (64, 64, 3),
        };
        let model = spec.build().unwrap();
        assert_eq!(model.output_shape(spec.input_shape()).unwrap(), (64, 64, 3));
    }
}
