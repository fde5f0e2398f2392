use crate::error::Result;
use crate::loss::{check_shapes, Loss};
use crate::math::tensor::Tensor;

/// Mean absolute error.
pub struct MaeLoss;

impl Loss for MaeLoss {
    /// Scalar MAE: mean(|predicted - actual|)
    fn loss(&self, predicted: &Tensor, actual: &Tensor) -> Result<f64> {
        check_shapes("mae loss", predicted, actual)?;
        let mean = predicted.sub(actual)?.map(f64::abs).mean(None)?;
        Ok(mean.item().unwrap_or(0.0))
    }

    /// Subgradient: sign(predicted - actual) / N, where sign is +1 when
    /// predicted > actual and -1 otherwise, ties included.
    fn grad(&self, predicted: &Tensor, actual: &Tensor) -> Result<Tensor> {
        check_shapes("mae grad", predicted, actual)?;
        let n = actual.len() as f64;
        Ok(predicted
            .sub(actual)?
            .map(|d| if d > 0.0 { 1.0 / n } else { -1.0 / n }))
    }
}
