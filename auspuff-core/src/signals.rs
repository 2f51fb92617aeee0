mod sweep;

pub use sweep::{generate_sweep, ExponentialSweep};

pub trait FiniteSignal: Send + Sync + ExactSizeIterator<Item = f32> {}

impl<T> FiniteSignal for T where T: Send + Sync + ExactSizeIterator<Item = f32> {}
