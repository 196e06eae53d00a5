mod fsrcnn;
mod ircnn;
mod spec;

pub use fsrcnn::fsrcnn;
pub use ircnn::ircnn;
pub use spec::ModelSpec;
