use crate::error::Result;
use crate::loss::{check_shapes, Loss};
use crate::math::tensor::Tensor;

/// Mean squared error.
pub struct MseLoss;

impl Loss for MseLoss {
    /// Scalar MSE: mean((predicted - actual)²)
    fn loss(&self, predicted: &Tensor, actual: &Tensor) -> Result<f64> {
        check_shapes("mse loss", predicted, actual)?;
        let diff = predicted.sub(actual)?;
        let mean = diff.mul(&diff)?.mean(None)?;
        Ok(mean.item().unwrap_or(0.0))
    }

    /// Gradient: 2·(predicted - actual) / N, N the element count of `actual`.
    fn grad(&self, predicted: &Tensor, actual: &Tensor) -> Result<Tensor> {
        check_shapes("mse grad", predicted, actual)?;
        let diff = predicted.sub(actual)?;
        Ok(&diff * (2.0 / actual.len() as f64))
    }
}
