pub mod activations;
pub mod layers;
mod sequential;

pub use sequential::Sequential;

/// Channels-last image shape: `(height, width, channels)`.
pub type Shape = (usize, usize, usize);
