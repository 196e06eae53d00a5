use super::Relu;

/// A fixed elementwise activation function.
#[derive(Debug, Clone, Copy)]
pub enum ActFn {
    Relu(Relu),
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu::new())
    }

    pub fn f(&self, z: f32) -> f32 {
        match self {
            Self::Relu(a) => a.f(z),
        }
    }
}
