use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, ModelErr>;

/// Model construction and evaluation failures.
#[derive(Debug)]
pub enum ModelErr {
    /// A layer was configured with a zero-valued dimension hyperparameter.
    InvalidHyperParam {
        what: &'static str,
        got: usize,
    },
    /// The channel count of an input tensor does not match what a layer expects.
    ChannelMismatch {
        got: usize,
        expected: usize,
    },
    /// A flat buffer has the wrong length for the model it is used with.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// An initializer distribution could not be constructed.
    Distribution(String),
}

impl Display for ModelErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelErr::InvalidHyperParam { what, got } => {
                write!(f, "invalid {what}: got {got}, expected a positive value")
            }
            ModelErr::ChannelMismatch { got, expected } => {
                write!(
                    f,
                    "channel mismatch: got {got} input channels, the layer expects {expected}"
                )
            }
            ModelErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "{what} length mismatch: got {got}, expected {expected}"),
            ModelErr::Distribution(msg) => f.write_str(msg),
        }
    }
}

impl Error for ModelErr {}

impl From<NormalError> for ModelErr {
    fn from(value: NormalError) -> Self {
        Self::Distribution(value.to_string())
    }
}

impl From<UniformError> for ModelErr {
    fn from(value: UniformError) -> Self {
        Self::Distribution(value.to_string())
    }
}
