#![cfg(test)]

use ndarray::Array4;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::layers::Layer,
    error::ModelErr,
    models::{ModelSpec, fsrcnn, ircnn},
};

fn rng() -> StdRng {
    StdRng::seed_from_u64(0xBEEF)
}

#[test]
fn fsrcnn_upscales_spatial_dims() {
    let model = fsrcnn((32, 32, 1), 3).unwrap();
    assert_eq!(model.output_shape((32, 32, 1)).unwrap(), (96, 96, 1));

    let params = model.init_params(&mut rng()).unwrap();
    let x = Array4::zeros((1, 32, 32, 1));
    let y = model.forward(&params, x.view()).unwrap();
    assert_eq!(y.dim(), (1, 96, 96, 1));
}

#[test]
fn fsrcnn_scales_with_any_positive_factor() {
    for upscale in 1..=4 {
        let model = fsrcnn((8, 10, 1), upscale).unwrap();
        assert_eq!(
            model.output_shape((8, 10, 1)).unwrap(),
            (8 * upscale, 10 * upscale, 1)
        );
    }
}

#[test]
fn fsrcnn_has_exactly_four_mapping_blocks() {
    let model = fsrcnn((32, 32, 1), 2).unwrap();
    let mapping = model
        .layers()
        .iter()
        .filter(|layer| matches!(layer, Layer::Conv2D(c) if c.filters() == 16 && c.kernel() == 3))
        .count();
    assert_eq!(mapping, 4);
}

#[test]
fn fsrcnn_pairs_every_convolution_with_a_prelu() {
    let model = fsrcnn((32, 32, 1), 2).unwrap();
    let layers = model.layers();

    // conv/prelu pairs throughout, a lone transposed convolution at the end
    assert_eq!(layers.len(), 15);
    for pair in layers[..14].chunks(2) {
        assert!(matches!(pair[0], Layer::Conv2D(_)));
        assert!(matches!(pair[1], Layer::PRelu(_)));
    }
    assert!(matches!(layers[14], Layer::ConvTranspose2D(_)));
}

#[test]
fn fsrcnn_rejects_a_zero_upscale_factor() {
    assert!(matches!(
        fsrcnn((32, 32, 1), 0),
        Err(ModelErr::InvalidHyperParam { what: "stride", .. })
    ));
}

#[test]
fn ircnn_preserves_spatial_dims() {
    let model = ircnn((64, 64, 3)).unwrap();
    assert_eq!(model.output_shape((64, 64, 3)).unwrap(), (64, 64, 3));
}

#[test]
fn ircnn_forward_keeps_input_shape() {
    let model = ircnn((16, 16, 3)).unwrap();
    let params = model.init_params(&mut rng()).unwrap();
    let x = Array4::from_elem((2, 16, 16, 3), 0.5);
    let y = model.forward(&params, x.view()).unwrap();
    assert_eq!(y.dim(), (2, 16, 16, 3));
}

#[test]
fn ircnn_applies_the_symmetric_dilation_schedule() {
    let model = ircnn((64, 64, 3)).unwrap();
    let dilations: Vec<usize> = model
        .layers()
        .iter()
        .filter_map(|layer| match layer {
            Layer::Conv2D(c) => Some(c.dilation()),
            _ => None,
        })
        .collect();
    assert_eq!(dilations, [1, 2, 3, 4, 3, 2, 1]);
}

#[test]
fn ircnn_normalizes_the_middle_convolutions_only() {
    let model = ircnn((64, 64, 3)).unwrap();
    let layers = model.layers();

    assert_eq!(layers.len(), 17);
    assert!(matches!(layers[0], Layer::Conv2D(_)));
    assert!(matches!(layers[16], Layer::Conv2D(_)));
    // five conv -> batch norm -> relu triplets in between
    for block in layers[1..16].chunks(3) {
        assert!(matches!(block[0], Layer::Conv2D(_)));
        assert!(matches!(block[1], Layer::BatchNorm(_)));
        assert!(matches!(block[2], Layer::Activation(_)));
    }
}

#[test]
fn ircnn_penalizes_every_kernel() {
    let model = ircnn((8, 8, 3)).unwrap();
    let params = vec![1.; model.size()];

    // 9 * (3*64 + 5*64*64 + 64*3) kernel weights, all ones, decayed at 1e-4
    let expected = 1e-4 * 187_776.;
    assert!((model.penalty(&params).unwrap() - expected).abs() < 1e-3);
}

#[test]
fn fsrcnn_carries_no_regularizer() {
    let model = fsrcnn((8, 8, 1), 2).unwrap();
    let params = vec![1.; model.size()];
    assert_eq!(model.penalty(&params).unwrap(), 0.);
}

#[test]
fn forward_rejects_channel_mismatches() {
    let model = ircnn((8, 8, 3)).unwrap();
    let params = model.init_params(&mut rng()).unwrap();
    let x = Array4::zeros((1, 8, 8, 4));
    assert!(matches!(
        model.forward(&params, x.view()),
        Err(ModelErr::ChannelMismatch {
            got: 4,
            expected: 3
        })
    ));
}

#[test]
fn model_specs_build_what_they_describe() {
    let fs = ModelSpec::Fsrcnn {
        input_shape: (32, 32, 1),
        upscale: 3,
    };
    assert_eq!(
        fs.build().unwrap().output_shape(fs.input_shape()).unwrap(),
        (96, 96, 1)
    );

    let ir = ModelSpec::Ircnn {
        input_shape: (64, 64, 3),
    };
    assert_eq!(
        ir.build().unwrap().output_shape(ir.input_shape()).unwrap(),
        (64, 64, 3)
    );
}
