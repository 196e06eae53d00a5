mod activation;
mod batch_norm;
mod conv2d;
mod conv_transpose2d;
mod layer;
mod prelu;

pub use activation::Activation;
pub use batch_norm::BatchNorm;
pub use conv2d::{Conv2D, ConvConfig};
pub use conv_transpose2d::ConvTranspose2D;
pub use layer::Layer;
pub use prelu::PRelu;
