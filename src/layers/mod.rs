pub mod activation;
pub mod linear;

pub use activation::Activation;
pub use linear::Linear;

use crate::error::Result;
use crate::math::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// A differentiable transform in a layer chain.
///
/// A layer is stateful across one forward/backward pair: `forward` caches
/// the input it was given, `backward` consumes that cache to produce the
/// gradient with respect to the input (and, for layers with parameters,
/// parameter gradients as a side effect). Calling `backward` without a
/// preceding `forward` is an `InvalidState` error.
pub trait Layer {
    /// Produces this layer's output for `inputs`, caching the input for the
    /// next `backward` call.
    fn forward(&mut self, inputs: &Tensor) -> Result<Tensor>;

    /// Backpropagates `grad` (the gradient of the loss with respect to this
    /// layer's output) through the layer, returning the gradient with
    /// respect to its input. Consumes the cached forward input.
    fn backward(&mut self, grad: &Tensor) -> Result<Tensor>;

    /// The layer's (parameter, gradient) pairs, one per parameter whose
    /// gradient has been populated by `backward`. Empty until then; always
    /// empty for parameterless layers. An external optimizer iterates these
    /// pairs to apply its update rule.
    fn params_and_grads(&mut self) -> Vec<(&mut Tensor, &Tensor)>;
}

/// The closed set of layer kinds a `Network` can hold.
///
/// A serializable tagged enum rather than a trait object, so a whole network
/// round-trips through JSON.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerKind {
    Linear(Linear),
    Activation(Activation),
}

impl Layer for LayerKind {
    fn forward(&mut self, inputs: &Tensor) -> Result<Tensor> {
        match self {
            LayerKind::Linear(layer) => layer.forward(inputs),
            LayerKind::Activation(layer) => layer.forward(inputs),
        }
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor> {
        match self {
            LayerKind::Linear(layer) => layer.backward(grad),
            LayerKind::Activation(layer) => layer.backward(grad),
        }
    }

    fn params_and_grads(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        match self {
            LayerKind::Linear(layer) => layer.params_and_grads(),
            LayerKind::Activation(layer) => layer.params_and_grads(),
        }
    }
}

impl From<Linear> for LayerKind {
    fn from(layer: Linear) -> LayerKind {
        LayerKind::Linear(layer)
    }
}

impl From<Activation> for LayerKind {
    fn from(layer: Activation) -> LayerKind {
        LayerKind::Activation(layer)
    }
}
