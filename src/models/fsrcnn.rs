use log::debug;

use crate::{
    arch::{
        Sequential, Shape,
        layers::{ConvConfig, Layer},
    },
    error::Result,
    init::Initializer,
};

/// Channels of the feature extraction and expansion stages.
const FEATURE_DIM: usize = 48;
/// Channels of the shrinking and mapping stages.
const SHRINK_DIM: usize = 16;
/// Number of mapping convolutions.
const MAPPING_DEPTH: usize = 4;

/// Builds the FSRCNN super-resolution network.
///
/// Five stages: feature extraction, shrinking, a stack of mapping
/// convolutions, expansion, and a transposed convolution that upsamples the
/// spatial dimensions by `upscale`. Every convolution keeps "same" padding
/// and a bias; each stage except the last is followed by a per-channel
/// parametric ReLU.
///
/// # Arguments
/// * `input_shape` - Channels-last shape of the expected input images.
/// * `upscale` - Spatial upscale factor of the output.
///
/// # Returns
/// The assembled model, or an error if `upscale` is zero.
pub fn fsrcnn(input_shape: Shape, upscale: usize) -> Result<Sequential> {
    let (.., channels) = input_shape;
    let mut layers = Vec::with_capacity(2 * MAPPING_DEPTH + 7);

    // Feature extraction
    layers.push(Layer::conv2d(
        channels,
        FEATURE_DIM,
        5,
        ConvConfig {
            init: Initializer::VarianceScaling { scale: 0.01 },
            ..ConvConfig::default()
        },
    )?);
    layers.push(Layer::prelu(FEATURE_DIM));

    // Shrinking
    layers.push(Layer::conv2d(
        FEATURE_DIM,
        SHRINK_DIM,
        1,
        ConvConfig {
            init: Initializer::VarianceScaling { scale: 2. },
            ..ConvConfig::default()
        },
    )?);
    layers.push(Layer::prelu(SHRINK_DIM));

    // Mapping
    for _ in 0..MAPPING_DEPTH {
        layers.push(Layer::conv2d(
            SHRINK_DIM,
            SHRINK_DIM,
            3,
            ConvConfig {
                init: Initializer::VarianceScaling { scale: 2. },
                ..ConvConfig::default()
            },
        )?);
        layers.push(Layer::prelu(SHRINK_DIM));
    }

    // Expansion
    layers.push(Layer::conv2d(
        SHRINK_DIM,
        FEATURE_DIM,
        1,
        ConvConfig {
            init: Initializer::VarianceScaling { scale: 2. },
            ..ConvConfig::default()
        },
    )?);
    layers.push(Layer::prelu(FEATURE_DIM));

    // Upsampling
    layers.push(Layer::conv_transpose2d(
        FEATURE_DIM,
        1,
        9,
        upscale,
        Initializer::RandomNormal {
            mean: 0.,
            std_dev: 0.001,
        },
    )?);

    let model = Sequential::new(layers);
    debug!(
        "assembled fsrcnn: {} layers, {} parameters",
        model.layers().len(),
        model.size()
    );
    Ok(model)
}
