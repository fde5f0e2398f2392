use crate::error::Result;
use crate::layers::{Layer, LayerKind};
use crate::math::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// An ordered chain of layers.
///
/// `forward` feeds each layer's output into the next; `backward` walks the
/// chain in reverse, leaving parameter gradients inside each layer for an
/// external optimizer to consume via `params_and_grads`. The network itself
/// never applies updates.
#[derive(Debug, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<LayerKind>,
}

impl Network {
    pub fn new(layers: Vec<LayerKind>) -> Network {
        Network { layers }
    }

    /// Forward pass; each layer caches its input for the backward pass.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Backward pass in reverse layer order, starting from the gradient of
    /// the loss with respect to the network output. Returns the gradient
    /// with respect to the network input.
    pub fn backward(&mut self, grad: &Tensor) -> Result<Tensor> {
        let mut current = grad.clone();
        for layer in self.layers.iter_mut().rev() {
            current = layer.backward(&current)?;
        }
        Ok(current)
    }

    /// All (parameter, gradient) pairs across the chain, in layer order.
    pub fn params_and_grads(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        self.layers
            .iter_mut()
            .flat_map(|layer| layer.params_and_grads())
            .collect()
    }

    /// Serializes the network (architecture and parameter values) to a
    /// pretty-printed JSON file. Cached inputs and gradients are transient
    /// and are not written; a reloaded network starts idle.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
