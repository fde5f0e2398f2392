pub mod cross_entropy;
pub mod mae;
pub mod mse;

pub use cross_entropy::CrossEntropyLoss;
pub use mae::MaeLoss;
pub use mse::MseLoss;

use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

/// A scalar discrepancy measure between predicted and actual tensors,
/// paired with its gradient with respect to the predictions.
pub trait Loss {
    /// The scalar loss value.
    fn loss(&self, predicted: &Tensor, actual: &Tensor) -> Result<f64>;

    /// The gradient of `loss` with respect to `predicted`, shaped exactly
    /// like `predicted`.
    fn grad(&self, predicted: &Tensor, actual: &Tensor) -> Result<Tensor>;
}

/// Predicted and actual must agree exactly; losses never broadcast.
fn check_shapes(op: &'static str, predicted: &Tensor, actual: &Tensor) -> Result<()> {
    if predicted.shape() != actual.shape() {
        return Err(NnError::shape(
            op,
            format!(
                "predicted shape {:?} does not match actual shape {:?}",
                predicted.shape(),
                actual.shape()
            ),
        ));
    }
    Ok(())
}
