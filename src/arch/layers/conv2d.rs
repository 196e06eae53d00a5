use ndarray::{Array4, ArrayView1, ArrayView4, Axis, linalg, s};
use ndarray::parallel::prelude::*;
use rand::Rng;

use crate::{
    arch::{Shape, activations::ActFn},
    error::{ModelErr, Result},
    init::Initializer,
    regularizer::L2,
};

/// Per-call options for [`Conv2D`]. The defaults cover the common case; call
/// sites override only the fields they care about.
#[derive(Debug, Clone, Copy)]
pub struct ConvConfig {
    pub stride: usize,
    pub dilation: usize,
    pub use_bias: bool,
    pub activation: Option<ActFn>,
    pub init: Initializer,
    pub regularizer: Option<L2>,
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            stride: 1,
            dilation: 1,
            use_bias: true,
            activation: None,
            init: Initializer::GlorotUniform,
            regularizer: None,
        }
    }
}

/// 2D convolution over channels-last images with "same" padding.
///
/// Parameters live in an external flat buffer, laid out as the kernel
/// `(kernel, kernel, in_channels, filters)` followed by the bias.
#[derive(Debug, Clone)]
pub struct Conv2D {
    in_channels: usize,
    filters: usize,
    kernel: usize,
    cfg: ConvConfig,
    size: usize,
}

impl Conv2D {
    /// Creates a new `Conv2D`.
    ///
    /// # Arguments
    /// * `in_channels` - Channels of the incoming tensor.
    /// * `filters` - Number of output channels.
    /// * `kernel` - Side of the square kernel.
    /// * `cfg` - Stride, dilation, bias, activation, initializer and regularizer.
    ///
    /// # Returns
    /// An error if any dimension hyperparameter is zero.
    pub fn new(in_channels: usize, filters: usize, kernel: usize, cfg: ConvConfig) -> Result<Self> {
        for (what, got) in [
            ("in_channels", in_channels),
            ("filters", filters),
            ("kernel", kernel),
            ("stride", cfg.stride),
            ("dilation", cfg.dilation),
        ] {
            if got == 0 {
                return Err(ModelErr::InvalidHyperParam { what, got });
            }
        }

        let mut size = kernel * kernel * in_channels * filters;
        if cfg.use_bias {
            size += filters;
        }

        Ok(Self {
            in_channels,
            filters,
            kernel,
            cfg,
            size,
        })
    }

    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn kernel(&self) -> usize {
        self.kernel
    }

    pub fn dilation(&self) -> usize {
        self.cfg.dilation
    }

    /// The shape this layer produces for the given input shape.
    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        let (h, w, c) = input;
        if c != self.in_channels {
            return Err(ModelErr::ChannelMismatch {
                got: c,
                expected: self.in_channels,
            });
        }

        Ok((
            h.div_ceil(self.cfg.stride),
            w.div_ceil(self.cfg.stride),
            self.filters,
        ))
    }

    /// Draws the kernel from the configured initializer and zeroes the bias.
    pub fn init_params<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        let (kernel, bias) = params.split_at_mut(self.kernel_len());
        let fan_in = self.kernel * self.kernel * self.in_channels;
        let fan_out = self.kernel * self.kernel * self.filters;
        self.cfg.init.fill(kernel, fan_in, fan_out, rng)?;
        bias.fill(0.);
        Ok(())
    }

    /// The regularization penalty of this layer's kernel, bias excluded.
    pub fn penalty(&self, params: &[f32]) -> f32 {
        match self.cfg.regularizer {
            Some(l2) => l2.penalty(&params[..self.kernel_len()]),
            None => 0.,
        }
    }

    /// Convolves a batch of channels-last images.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of the parameter buffer.
    /// * `x` - Input of shape `(batch, height, width, in_channels)`.
    ///
    /// # Returns
    /// The convolved batch, or an error on a channel mismatch.
    pub fn forward(&self, params: &[f32], x: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (batch, in_h, in_w, c) = x.dim();
        if c != self.in_channels {
            return Err(ModelErr::ChannelMismatch {
                got: c,
                expected: self.in_channels,
            });
        }

        let (out_h, out_w, _) = self.output_shape((in_h, in_w, c))?;
        let mut out = Array4::zeros((batch, out_h, out_w, self.filters));
        if out_h == 0 || out_w == 0 {
            return Ok(out);
        }

        let (weights, bias) = self.view_params(params);
        let (stride, dilation) = (self.cfg.stride, self.cfg.dilation);
        let eff_k = (self.kernel - 1) * dilation + 1;
        let pad_top = pad_before(in_h, out_h, stride, eff_k);
        let pad_left = pad_before(in_w, out_w, stride, eff_k);

        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(x.axis_iter(Axis(0)))
            .for_each(|(mut out_img, img)| {
                for oy in 0..out_h {
                    for ox in 0..out_w {
                        let mut pixel = out_img.slice_mut(s![oy, ox, ..]);
                        if !bias.is_empty() {
                            pixel.assign(&ArrayView1::from(bias));
                        }

                        for ky in 0..self.kernel {
                            let Some(iy) = (oy * stride + ky * dilation).checked_sub(pad_top)
                            else {
                                continue;
                            };
                            if iy >= in_h {
                                continue;
                            }

                            for kx in 0..self.kernel {
                                let Some(ix) = (ox * stride + kx * dilation).checked_sub(pad_left)
                                else {
                                    continue;
                                };
                                if ix >= in_w {
                                    continue;
                                }

                                let taps = weights.slice(s![ky, kx, .., ..]);
                                linalg::general_mat_vec_mul(
                                    1.,
                                    &taps.t(),
                                    &img.slice(s![iy, ix, ..]),
                                    1.,
                                    &mut pixel,
                                );
                            }
                        }
                    }
                }

                if let Some(act) = &self.cfg.activation {
                    out_img.mapv_inplace(|z| act.f(z));
                }
            });

        Ok(out)
    }

    fn kernel_len(&self) -> usize {
        self.kernel * self.kernel * self.in_channels * self.filters
    }

    /// Gives a view of the raw parameter slice as the kernel and bias of this layer.
    fn view_params<'a>(&self, params: &'a [f32]) -> (ArrayView4<'a, f32>, &'a [f32]) {
        let (kernel_raw, bias) = params.split_at(self.kernel_len());
        let kernel = ArrayView4::from_shape(
            (self.kernel, self.kernel, self.in_channels, self.filters),
            kernel_raw,
        )
        .unwrap();
        (kernel, bias)
    }
}

/// Leading "same" padding: the smaller half of the total, remainder trailing.
fn pad_before(input: usize, output: usize, stride: usize, eff_k: usize) -> usize {
    ((output - 1) * stride + eff_k).saturating_sub(input) / 2
}

#[cfg(test)]
mod tests {
    use ndarray::Array4;

    use super::*;

    #[test]
    fn same_padding_preserves_spatial_dims() {
        let conv = Conv2D::new(2, 3, 5, ConvConfig::default()).unwrap();
        let params = vec![0.; conv.size()];
        let x = Array4::zeros((1, 11, 7, 2));
        let y = conv.forward(&params, x.view()).unwrap();
        assert_eq!(y.dim(), (1, 11, 7, 3));
    }

    #[test]
    fn identity_kernel_copies_input() {
        let conv = Conv2D::new(1, 1, 3, ConvConfig::default()).unwrap();
        let mut params = vec![0.; conv.size()];
        params[4] = 1.; // center tap

        let x = Array4::from_shape_fn((1, 4, 4, 1), |(_, y, x, _)| (y * 4 + x) as f32);
        let y = conv.forward(&params, x.view()).unwrap();
        assert_eq!(y, x);
    }

    #[test]
    fn dilation_widens_receptive_field() {
        let conv = Conv2D::new(
            1,
            1,
            3,
            ConvConfig {
                dilation: 2,
                ..ConvConfig::default()
            },
        )
        .unwrap();
        let mut params = vec![1.; conv.size()];
        params[conv.size() - 1] = 0.; // bias

        // a unit impulse at the center spreads to the 9 taps two pixels apart
        let mut x = Array4::zeros((1, 5, 5, 1));
        x[[0, 2, 2, 0]] = 1.;
        let y = conv.forward(&params, x.view()).unwrap();

        assert_eq!(y.sum(), 9.);
        assert_eq!(y[[0, 0, 0, 0]], 1.);
        assert_eq!(y[[0, 2, 4, 0]], 1.);
        assert_eq!(y[[0, 1, 1, 0]], 0.);
    }

    #[test]
    fn stride_two_rounds_output_up() {
        let conv = Conv2D::new(
            1,
            4,
            3,
            ConvConfig {
                stride: 2,
                ..ConvConfig::default()
            },
        )
        .unwrap();
        let params = vec![0.; conv.size()];
        let x = Array4::zeros((2, 5, 5, 1));
        let y = conv.forward(&params, x.view()).unwrap();
        assert_eq!(y.dim(), (2, 3, 3, 4));
    }

    #[test]
    fn fused_activation_clamps_negatives() {
        let conv = Conv2D::new(
            1,
            1,
            1,
            ConvConfig {
                activation: Some(ActFn::relu()),
                ..ConvConfig::default()
            },
        )
        .unwrap();
        let params = vec![-1., 0.]; // negating kernel, zero bias

        let x = Array4::from_elem((1, 2, 2, 1), 3.);
        let y = conv.forward(&params, x.view()).unwrap();
        assert_eq!(y.sum(), 0.);
    }

    #[test]
    fn rejects_zero_hyperparams() {
        assert!(matches!(
            Conv2D::new(1, 0, 3, ConvConfig::default()),
            Err(ModelErr::InvalidHyperParam { what: "filters", .. })
        ));
        let cfg = ConvConfig {
            dilation: 0,
            ..ConvConfig::default()
        };
        assert!(Conv2D::new(1, 1, 3, cfg).is_err());
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let conv = Conv2D::new(3, 1, 3, ConvConfig::default()).unwrap();
        let params = vec![0.; conv.size()];
        let x = Array4::zeros((1, 4, 4, 2));
        assert!(matches!(
            conv.forward(&params, x.view()),
            Err(ModelErr::ChannelMismatch {
                got: 2,
                expected: 3
            })
        ));
    }
}
