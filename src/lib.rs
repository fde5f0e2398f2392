pub mod activation;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use error::{NnError, Result};
pub use layers::{Activation, Layer, LayerKind, Linear};
pub use loss::{CrossEntropyLoss, Loss, MaeLoss, MseLoss};
pub use math::tensor::Tensor;
pub use network::network::Network;
