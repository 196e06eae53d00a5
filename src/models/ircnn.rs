use log::debug;

use crate::{
    arch::{
        Sequential, Shape,
        activations::ActFn,
        layers::{ConvConfig, Layer},
    },
    error::Result,
    regularizer::L2,
};

const FILTERS: usize = 64;
const OUT_CHANNELS: usize = 3;
const WEIGHT_DECAY: f32 = 1e-4;
/// One rate per convolution; the receptive field grows and then contracts
/// without ever pooling, so spatial resolution is preserved throughout.
const DILATION_SCHEDULE: [usize; 7] = [1, 2, 3, 4, 3, 2, 1];

/// Builds the IRCNN denoising network.
///
/// Seven dilated 3x3 convolutions. The first fuses a ReLU, the middle five
/// are each followed by batch normalization and a separate ReLU, and the last
/// maps back to 3 channels with no activation so the output can carry a
/// residual. All kernels use the Glorot-uniform initializer and L2 weight
/// decay.
///
/// # Arguments
/// * `input_shape` - Channels-last shape of the expected input images.
///
/// # Returns
/// The assembled model.
pub fn ircnn(input_shape: Shape) -> Result<Sequential> {
    let (.., channels) = input_shape;
    let base = ConvConfig {
        regularizer: Some(L2::new(WEIGHT_DECAY)),
        ..ConvConfig::default()
    };
    let mut layers = Vec::with_capacity(3 * DILATION_SCHEDULE.len());

    layers.push(Layer::conv2d(
        channels,
        FILTERS,
        3,
        ConvConfig {
            dilation: DILATION_SCHEDULE[0],
            activation: Some(ActFn::relu()),
            ..base
        },
    )?);

    for &dilation in &DILATION_SCHEDULE[1..DILATION_SCHEDULE.len() - 1] {
        layers.push(Layer::conv2d(
            FILTERS,
            FILTERS,
            3,
            ConvConfig { dilation, ..base },
        )?);
        layers.push(Layer::batch_norm(FILTERS));
        layers.push(Layer::activation(ActFn::relu()));
    }

    layers.push(Layer::conv2d(
        FILTERS,
        OUT_CHANNELS,
        3,
        ConvConfig {
            dilation: DILATION_SCHEDULE[6],
            ..base
        },
    )?);

    let model = Sequential::new(layers);
    debug!(
        "assembled ircnn: {} layers, {} parameters",
        model.layers().len(),
        model.size()
    );
    Ok(model)
}
