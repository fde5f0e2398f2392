use crate::error::{NnError, Result};
use crate::loss::{check_shapes, Loss};
use crate::math::tensor::Tensor;

/// Categorical cross-entropy over probability predictions.
///
/// Predictions are clamped into [EPS, 1 - EPS] before any log or division,
/// so the loss stays finite even when a prediction sits at or beyond the
/// [0, 1] bounds.
pub struct CrossEntropyLoss;

/// Clamp bound guarding log/division singularities.
const EPS: f64 = 1e-12;

/// Additive stabilizer applied inside log() in `loss` only. `grad` divides
/// by the bare clamped probabilities, so the two are analytic pairs only up
/// to this term; the asymmetry is intentional and kept as-is.
const LOG_EPS: f64 = 1e-9;

impl Loss for CrossEntropyLoss {
    /// Scalar cross-entropy:
    ///   L = -(1/B)·Σ actual · ln(clamp(predicted) + 1e-9)
    /// with B the batch size (first dimension of `predicted`).
    fn loss(&self, predicted: &Tensor, actual: &Tensor) -> Result<f64> {
        check_shapes("cross-entropy loss", predicted, actual)?;
        if predicted.rank() == 0 {
            return Err(NnError::shape(
                "cross-entropy loss",
                "a batch dimension is required, got a rank-0 tensor",
            ));
        }
        let batch = predicted.shape()[0] as f64;
        let log_p = predicted.clamp(EPS, 1.0 - EPS).map(|p| (p + LOG_EPS).ln());
        let total = actual.mul(&log_p)?.sum(None)?;
        Ok(-total.item().unwrap_or(0.0) / batch)
    }

    /// Gradient: -actual / clamp(predicted).
    fn grad(&self, predicted: &Tensor, actual: &Tensor) -> Result<Tensor> {
        check_shapes("cross-entropy grad", predicted, actual)?;
        let inv_p = predicted.clamp(EPS, 1.0 - EPS).map(|p| -1.0 / p);
        actual.mul(&inv_p)
    }
}
