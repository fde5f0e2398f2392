use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::Layer;
use crate::math::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Element-wise nonlinearity layer. Has no learnable parameters.
///
/// The chain rule for a pointwise `f` is `grad ⊙ f′(inputs)`, so `backward`
/// only needs the cached forward input and the derivative supplied by the
/// `ActivationFunction` variant.
#[derive(Debug, Serialize, Deserialize)]
pub struct Activation {
    function: ActivationFunction,
    /// Cached forward input; set by `forward`, consumed by `backward`.
    #[serde(skip)]
    inputs: Option<Tensor>,
}

impl Activation {
    pub fn new(function: ActivationFunction) -> Activation {
        Activation {
            function,
            inputs: None,
        }
    }

    pub fn function(&self) -> &ActivationFunction {
        &self.function
    }
}

impl Layer for Activation {
    fn forward(&mut self, inputs: &Tensor) -> Result<Tensor> {
        let out = inputs.map(|x| self.function.function(x));
        self.inputs = Some(inputs.clone());
        Ok(out)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor> {
        let inputs = self
            .inputs
            .take()
            .ok_or(NnError::InvalidState("backward called before forward"))?;
        if grad.shape() != inputs.shape() {
            return Err(NnError::shape(
                "backward",
                format!(
                    "activation layer cached input shape {:?} but received gradient shape {:?}",
                    inputs.shape(),
                    grad.shape()
                ),
            ));
        }
        grad.mul(&inputs.map(|x| self.function.derivative(x)))
    }

    fn params_and_grads(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        Vec::new()
    }
}
