use ndarray::{Array4, ArrayView4, Axis, linalg, s};
use ndarray::parallel::prelude::*;
use rand::Rng;

use crate::{
    arch::Shape,
    error::{ModelErr, Result},
    init::Initializer,
};

/// Transposed 2D convolution with "same" padding: every input pixel scatters
/// a weighted kernel patch into the output, and the output spatial dimensions
/// are the input's multiplied by the stride.
///
/// Parameter layout matches [`super::Conv2D`]: kernel
/// `(kernel, kernel, in_channels, filters)`, then the bias.
#[derive(Debug, Clone)]
pub struct ConvTranspose2D {
    in_channels: usize,
    filters: usize,
    kernel: usize,
    stride: usize,
    init: Initializer,
    size: usize,
}

impl ConvTranspose2D {
    /// Creates a new `ConvTranspose2D`.
    ///
    /// # Arguments
    /// * `in_channels` - Channels of the incoming tensor.
    /// * `filters` - Number of output channels.
    /// * `kernel` - Side of the square kernel.
    /// * `stride` - Upsampling factor of the output.
    /// * `init` - Kernel initializer.
    ///
    /// # Returns
    /// An error if any dimension hyperparameter is zero.
    pub fn new(
        in_channels: usize,
        filters: usize,
        kernel: usize,
        stride: usize,
        init: Initializer,
    ) -> Result<Self> {
        for (what, got) in [
            ("in_channels", in_channels),
            ("filters", filters),
            ("kernel", kernel),
            ("stride", stride),
        ] {
            if got == 0 {
                return Err(ModelErr::InvalidHyperParam { what, got });
            }
        }

        Ok(Self {
            in_channels,
            filters,
            kernel,
            stride,
            init,
            size: kernel * kernel * in_channels * filters + filters,
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

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn output_shape(&self, input: Shape) -> Result<Shape> {
        let (h, w, c) = input;
        if c != self.in_channels {
            return Err(ModelErr::ChannelMismatch {
                got: c,
                expected: self.in_channels,
            });
        }

        Ok((h * self.stride, w * self.stride, self.filters))
    }

    pub fn init_params<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        let (kernel, bias) = params.split_at_mut(self.kernel_len());
        let fan_in = self.kernel * self.kernel * self.in_channels;
        let fan_out = self.kernel * self.kernel * self.filters;
        self.init.fill(kernel, fan_in, fan_out, rng)?;
        bias.fill(0.);
        Ok(())
    }

    /// Upsamples a batch of channels-last images.
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
        let pad = self.kernel.saturating_sub(self.stride) / 2;

        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(x.axis_iter(Axis(0)))
            .for_each(|(mut out_img, img)| {
                for (co, b) in bias.iter().enumerate() {
                    out_img.slice_mut(s![.., .., co]).fill(*b);
                }

                for iy in 0..in_h {
                    for ix in 0..in_w {
                        let src = img.slice(s![iy, ix, ..]);
                        for ky in 0..self.kernel {
                            let Some(oy) = (iy * self.stride + ky).checked_sub(pad) else {
                                continue;
                            };
                            if oy >= out_h {
                                continue;
                            }

                            for kx in 0..self.kernel {
                                let Some(ox) = (ix * self.stride + kx).checked_sub(pad) else {
                                    continue;
                                };
                                if ox >= out_w {
                                    continue;
                                }

                                let taps = weights.slice(s![ky, kx, .., ..]);
                                let mut pixel = out_img.slice_mut(s![oy, ox, ..]);
                                linalg::general_mat_vec_mul(1., &taps.t(), &src, 1., &mut pixel);
                            }
                        }
                    }
                }
            });

        Ok(out)
    }

    fn kernel_len(&self) -> usize {
        self.kernel * self.kernel * self.in_channels * self.filters
    }

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

#[cfg(test)]
mod tests {
    use ndarray::{Array4, array};

    use super::*;

    #[test]
    fn stride_two_copies_each_pixel_into_a_block() {
        let deconv =
            ConvTranspose2D::new(1, 1, 2, 2, Initializer::RandomNormal { mean: 0., std_dev: 1. })
                .unwrap();
        let params = vec![1., 1., 1., 1., 0.]; // all-ones kernel, zero bias

        let x = array![[1., 2.], [3., 4.]]
            .into_shape_with_order((1, 2, 2, 1))
            .unwrap();
        let y = deconv.forward(&params, x.view()).unwrap();

        let expected = array![
            [1., 1., 2., 2.],
            [1., 1., 2., 2.],
            [3., 3., 4., 4.],
            [3., 3., 4., 4.]
        ]
        .into_shape_with_order((1, 4, 4, 1))
        .unwrap();
        assert_eq!(y, expected);
    }

    #[test]
    fn wide_kernel_output_stays_aligned() {
        let deconv = ConvTranspose2D::new(2, 3, 9, 3, Initializer::GlorotUniform).unwrap();
        let params = vec![0.; deconv.size()];
        let x = Array4::zeros((1, 5, 5, 2));
        let y = deconv.forward(&params, x.view()).unwrap();
        assert_eq!(y.dim(), (1, 15, 15, 3));
    }

    #[test]
    fn rejects_zero_stride() {
        assert!(matches!(
            ConvTranspose2D::new(1, 1, 9, 0, Initializer::GlorotUniform),
            Err(ModelErr::InvalidHyperParam { what: "stride", .. })
        ));
    }
}
