use crate::error::{NnError, Result};
use crate::layers::Layer;
use crate::math::tensor::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Affine transform `y = x·W + b` with learnable weight and bias.
///
/// The weight is shaped (input_size, output_size) and the bias
/// (output_size); the bias broadcasts over the batch dimension. Gradients
/// land in `weight_grad`/`bias_grad` when `backward` runs and stay there
/// until the next `backward` overwrites them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Linear {
    input_size: usize,
    output_size: usize,
    pub weight: Tensor,
    pub bias: Tensor,
    #[serde(skip)]
    pub weight_grad: Option<Tensor>,
    #[serde(skip)]
    pub bias_grad: Option<Tensor>,
    /// Cached forward input; set by `forward`, consumed by `backward`.
    #[serde(skip)]
    inputs: Option<Tensor>,
}

impl Linear {
    /// Creates a layer with Xavier-initialized weights and zero biases.
    ///
    /// The random source is injected so callers (and tests) control
    /// reproducibility with a seeded generator.
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Linear {
        Linear {
            input_size,
            output_size,
            weight: Tensor::xavier(input_size, output_size, rng),
            bias: Tensor::zeros(&[output_size]),
            weight_grad: None,
            bias_grad: None,
            inputs: None,
        }
    }

    /// Builds a layer from explicit parameter tensors.
    pub fn from_params(weight: Tensor, bias: Tensor) -> Result<Linear> {
        if weight.rank() != 2 || bias.shape() != [weight.shape()[1]] {
            return Err(NnError::shape(
                "from_params",
                format!(
                    "weight {:?} and bias {:?} do not describe an affine transform",
                    weight.shape(),
                    bias.shape()
                ),
            ));
        }
        Ok(Linear {
            input_size: weight.shape()[0],
            output_size: weight.shape()[1],
            weight,
            bias,
            weight_grad: None,
            bias_grad: None,
            inputs: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}

impl Layer for Linear {
    fn forward(&mut self, inputs: &Tensor) -> Result<Tensor> {
        if inputs.shape().last() != Some(&self.input_size) {
            return Err(NnError::shape(
                "forward",
                format!(
                    "linear layer expects trailing dimension {}, got input shape {:?}",
                    self.input_size,
                    inputs.shape()
                ),
            ));
        }
        let out = inputs.dot(&self.weight)?.add(&self.bias)?;
        self.inputs = Some(inputs.clone());
        Ok(out)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor> {
        if self.inputs.is_none() {
            return Err(NnError::InvalidState("backward called before forward"));
        }
        if grad.shape().last() != Some(&self.output_size) {
            return Err(NnError::shape(
                "backward",
                format!(
                    "linear layer expects gradient with trailing dimension {}, got {:?}",
                    self.output_size,
                    grad.shape()
                ),
            ));
        }
        let inputs = self.inputs.take().unwrap();

        // Bias gradient sums the upstream gradient over the batch axis;
        // weight gradient is inputsᵀ·grad. The returned input gradient uses
        // the weight as it stands now, before any optimizer update.
        self.bias_grad = Some(grad.sum(Some(0))?);
        self.weight_grad = Some(inputs.transpose().dot(grad)?);
        grad.dot(&self.weight.transpose())
    }

    fn params_and_grads(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        let mut pairs = Vec::new();
        if let Some(ref weight_grad) = self.weight_grad {
            pairs.push((&mut self.weight, weight_grad));
        }
        if let Some(ref bias_grad) = self.bias_grad {
            pairs.push((&mut self.bias, bias_grad));
        }
        pairs
    }
}
