use crate::error::{NnError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

/// An n-dimensional array of `f64` values with row-major storage.
///
/// A `Tensor` is a plain value: every operation returns a fresh `Tensor`
/// and never mutates its operands, so a layer's cached forward input stays
/// valid and unaliased when it is read again during the backward pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Builds a tensor from flat row-major data and an explicit shape.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NnError::shape(
                "new",
                format!(
                    "shape {:?} holds {} elements but {} were given",
                    shape,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Tensor { shape, data })
    }

    /// A rank-0 tensor holding a single value.
    pub fn scalar(value: f64) -> Tensor {
        Tensor {
            shape: vec![],
            data: vec![value],
        }
    }

    /// A rank-1 tensor from a flat vector.
    pub fn from_vec(data: Vec<f64>) -> Tensor {
        Tensor {
            shape: vec![data.len()],
            data,
        }
    }

    /// A rank-2 tensor from nested rows. Rows of unequal length are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Tensor> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(NnError::shape(
                    "from_rows",
                    format!("row 0 has {} columns but row {} has {}", n_cols, i, row.len()),
                ));
            }
            data.extend(row);
        }
        Ok(Tensor {
            shape: vec![n_rows, n_cols],
            data,
        })
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Uniform random values in [-1, 1).
    pub fn random<R: Rng>(shape: &[usize], rng: &mut R) -> Tensor {
        let data = (0..shape.iter().product())
            .map(|_| rng.gen::<f64>() * 2.0 - 1.0)
            .collect();
        Tensor {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / fan_in)).
    ///
    /// Keeps the variance of activations and gradients roughly equal across
    /// layers; suited to Sigmoid/Tanh/Identity layers.
    ///
    /// Shape: (fan_in, fan_out). `fan_in` is the number of input connections.
    pub fn xavier<R: Rng>(fan_in: usize, fan_out: usize, rng: &mut R) -> Tensor {
        let std_dev = (1.0 / fan_in as f64).sqrt();
        let data = (0..fan_in * fan_out)
            .map(|_| Tensor::sample_standard_normal(rng) * std_dev)
            .collect();
        Tensor {
            shape: vec![fan_in, fan_out],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major view of the values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The single value of a one-element tensor, if it is one.
    pub fn item(&self) -> Option<f64> {
        if self.data.len() == 1 {
            Some(self.data[0])
        } else {
            None
        }
    }

    /// Applies `functor` to every element, returning a new tensor.
    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Clamps every element into [lo, hi].
    pub fn clamp(&self, lo: f64, hi: f64) -> Tensor {
        self.map(|x| x.max(lo).min(hi))
    }

    /// Element-wise addition with trailing-dimension broadcasting.
    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    /// Element-wise subtraction with trailing-dimension broadcasting.
    pub fn sub(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product with trailing-dimension broadcasting.
    pub fn mul(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, "mul", |a, b| a * b)
    }

    /// Matrix product. Both operands must be matrices (rank-2 tensors) and
    /// the inner dimensions must agree.
    pub fn dot(&self, rhs: &Tensor) -> Result<Tensor> {
        if self.rank() != 2 {
            return Err(NnError::TypeConflict {
                op: "dot",
                expected: "a matrix (rank-2 tensor)",
                got: format!("a rank-{} tensor", self.rank()),
            });
        }
        if rhs.rank() != 2 {
            return Err(NnError::TypeConflict {
                op: "dot",
                expected: "a matrix (rank-2 tensor)",
                got: format!("a rank-{} tensor", rhs.rank()),
            });
        }
        let (m, k) = (self.shape[0], self.shape[1]);
        let (k2, n) = (rhs.shape[0], rhs.shape[1]);
        if k != k2 {
            return Err(NnError::shape(
                "dot",
                format!("({m}, {k}) x ({k2}, {n}): inner dimensions differ"),
            ));
        }

        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for l in 0..k {
                    sum += self.data[i * k + l] * rhs.data[l * n + j];
                }
                data[i * n + j] = sum;
            }
        }
        Ok(Tensor {
            shape: vec![m, n],
            data,
        })
    }

    /// Swaps the last two axes. Tensors of rank 0 or 1 are returned as-is.
    pub fn transpose(&self) -> Tensor {
        if self.rank() < 2 {
            return self.clone();
        }
        let mut out_shape = self.shape.clone();
        let r = out_shape.len();
        out_shape.swap(r - 1, r - 2);

        let in_strides = strides(&self.shape);
        let out_strides = strides(&out_shape);
        let mut data = vec![0.0; self.data.len()];
        for (flat, slot) in data.iter_mut().enumerate() {
            // Decompose the output index, swap the last two coordinates and
            // read from the corresponding input offset.
            let mut rem = flat;
            let mut src = 0;
            for d in 0..r {
                let idx = rem / out_strides[d];
                rem %= out_strides[d];
                let in_dim = if d == r - 1 {
                    r - 2
                } else if d == r - 2 {
                    r - 1
                } else {
                    d
                };
                src += idx * in_strides[in_dim];
            }
            *slot = self.data[src];
        }
        Tensor {
            shape: out_shape,
            data,
        }
    }

    /// Sum over `axis`, or over all elements when `axis` is `None`.
    pub fn sum(&self, axis: Option<usize>) -> Result<Tensor> {
        self.fold(axis, "sum", |acc, x| acc + x)
    }

    /// Mean over `axis`, or over all elements when `axis` is `None`.
    pub fn mean(&self, axis: Option<usize>) -> Result<Tensor> {
        let count = match axis {
            None => self.data.len(),
            Some(ax) if ax < self.rank() => self.shape[ax],
            _ => 0, // fold reports the axis error
        };
        let total = self.fold(axis, "mean", |acc, x| acc + x)?;
        Ok(total.map(|x| x / count as f64))
    }

    /// Maximum over `axis`, or over all elements when `axis` is `None`.
    pub fn max(&self, axis: Option<usize>) -> Result<Tensor> {
        self.fold(axis, "max", f64::max)
    }

    /// Minimum over `axis`, or over all elements when `axis` is `None`.
    pub fn min(&self, axis: Option<usize>) -> Result<Tensor> {
        self.fold(axis, "min", f64::min)
    }

    /// Reduces over one axis (removing it) or over all elements (yielding a
    /// rank-0 tensor). The first reduced element seeds the accumulator.
    fn fold<F>(&self, axis: Option<usize>, op: &'static str, combine: F) -> Result<Tensor>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.data.is_empty() {
            return Err(NnError::shape(op, "cannot reduce an empty tensor"));
        }
        let ax = match axis {
            None => {
                let value = self.data[1..]
                    .iter()
                    .fold(self.data[0], |acc, &x| combine(acc, x));
                return Ok(Tensor::scalar(value));
            }
            Some(ax) => ax,
        };
        if ax >= self.rank() {
            return Err(NnError::shape(
                op,
                format!("axis {} out of range for shape {:?}", ax, self.shape),
            ));
        }

        let outer: usize = self.shape[..ax].iter().product();
        let axis_len = self.shape[ax];
        let inner: usize = self.shape[ax + 1..].iter().product();
        let mut out_shape = self.shape.clone();
        out_shape.remove(ax);

        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            for i in 0..inner {
                let mut acc = self.data[o * axis_len * inner + i];
                for k in 1..axis_len {
                    acc = combine(acc, self.data[(o * axis_len + k) * inner + i]);
                }
                data.push(acc);
            }
        }
        Ok(Tensor {
            shape: out_shape,
            data,
        })
    }

    fn zip_with<F>(&self, rhs: &Tensor, op: &'static str, f: F) -> Result<Tensor>
    where
        F: Fn(f64, f64) -> f64,
    {
        let out_shape = broadcast_shape(op, &self.shape, &rhs.shape)?;
        let out_strides = strides(&out_shape);
        let ls = broadcast_strides(&self.shape, &out_shape);
        let rs = broadcast_strides(&rhs.shape, &out_shape);
        let out_len = out_shape.iter().product();

        let mut data = Vec::with_capacity(out_len);
        for flat in 0..out_len {
            let mut rem = flat;
            let mut li = 0;
            let mut ri = 0;
            for d in 0..out_shape.len() {
                let idx = rem / out_strides[d];
                rem %= out_strides[d];
                li += idx * ls[d];
                ri += idx * rs[d];
            }
            data.push(f(self.data[li], rhs.data[ri]));
        }
        Ok(Tensor {
            shape: out_shape,
            data,
        })
    }
}

/// Row-major strides for `shape`.
fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// The broadcast result shape of `a` and `b`: dimensions align from the
/// trailing end, and a size-1 dimension stretches to match the other side.
fn broadcast_shape(op: &'static str, a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = vec![0; rank];
    for d in 0..rank {
        let da = if d < rank - a.len() { 1 } else { a[d - (rank - a.len())] };
        let db = if d < rank - b.len() { 1 } else { b[d - (rank - b.len())] };
        out[d] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(NnError::shape(
                op,
                format!("cannot broadcast {:?} with {:?}", a, b),
            ));
        };
    }
    Ok(out)
}

/// Per-dimension strides of an operand as seen through the broadcast output
/// shape; stretched and missing leading dimensions get stride 0.
fn broadcast_strides(shape: &[usize], out_shape: &[usize]) -> Vec<usize> {
    let own = strides(shape);
    let offset = out_shape.len() - shape.len();
    let mut out = vec![0; out_shape.len()];
    for d in 0..shape.len() {
        if shape[d] != 1 {
            out[offset + d] = own[d];
        }
    }
    out
}

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        self.map(|x| -x)
    }
}

// Scalar operands broadcast over every element and work on either side of
// the operator; `f64 - &Tensor` is the negation of `&Tensor - f64`.

impl Add<f64> for &Tensor {
    type Output = Tensor;

    fn add(self, rhs: f64) -> Tensor {
        self.map(|x| x + rhs)
    }
}

impl Add<&Tensor> for f64 {
    type Output = Tensor;

    fn add(self, rhs: &Tensor) -> Tensor {
        rhs.map(|x| self + x)
    }
}

impl Sub<f64> for &Tensor {
    type Output = Tensor;

    fn sub(self, rhs: f64) -> Tensor {
        self.map(|x| x - rhs)
    }
}

impl Sub<&Tensor> for f64 {
    type Output = Tensor;

    fn sub(self, rhs: &Tensor) -> Tensor {
        rhs.map(|x| self - x)
    }
}

impl Mul<f64> for &Tensor {
    type Output = Tensor;

    fn mul(self, rhs: f64) -> Tensor {
        self.map(|x| x * rhs)
    }
}

impl Mul<&Tensor> for f64 {
    type Output = Tensor;

    fn mul(self, rhs: &Tensor) -> Tensor {
        rhs.map(|x| self * x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t2(rows: Vec<Vec<f64>>) -> Tensor {
        Tensor::from_rows(rows).unwrap()
    }

    #[test]
    fn add_is_commutative() {
        let a = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = t2(vec![vec![0.5, -1.0], vec![2.0, 8.0]]);
        assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    }

    #[test]
    fn sub_equals_add_of_negation() {
        let a = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = t2(vec![vec![0.5, -1.0], vec![2.0, 8.0]]);
        assert_eq!(a.sub(&b).unwrap(), a.add(&-&b).unwrap());
    }

    #[test]
    fn scalar_operands_work_on_either_side() {
        let a = Tensor::from_vec(vec![1.0, -2.0, 3.0]);
        assert_eq!((&a + 2.0).data(), (2.0 + &a).data());
        assert_eq!((&a * 3.0).data(), (3.0 * &a).data());
        let forward = &a - 1.0;
        let reverse = 1.0 - &a;
        for (f, r) in forward.data().iter().zip(reverse.data()) {
            assert_eq!(*f, -r);
        }
    }

    #[test]
    fn broadcasting_stretches_size_one_dimensions() {
        let batch = t2(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let row = Tensor::from_vec(vec![10.0, 20.0, 30.0]);
        let out = batch.add(&row).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out.data(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn unbroadcastable_shapes_are_rejected() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
        let b = Tensor::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            a.add(&b),
            Err(NnError::ShapeMismatch { op: "add", .. })
        ));
    }

    #[test]
    fn dot_computes_the_matrix_product() {
        let a = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = t2(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = a.dot(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn dot_rejects_mismatched_inner_dimensions() {
        let a = t2(vec![vec![1.0, 2.0, 3.0]]);
        let b = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(matches!(
            a.dot(&b),
            Err(NnError::ShapeMismatch { op: "dot", .. })
        ));
    }

    #[test]
    fn dot_rejects_non_matrix_operands() {
        let a = t2(vec![vec![1.0, 2.0]]);
        let v = Tensor::from_vec(vec![1.0, 2.0]);
        assert!(matches!(a.dot(&v), Err(NnError::TypeConflict { .. })));
        assert!(matches!(
            Tensor::scalar(3.0).dot(&a),
            Err(NnError::TypeConflict { .. })
        ));
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let a = t2(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn transpose_is_identity_below_rank_two() {
        let v = Tensor::from_vec(vec![1.0, 2.0]);
        assert_eq!(v.transpose(), v);
    }

    #[test]
    fn reductions_over_all_elements_yield_rank_zero() {
        let a = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(a.sum(None).unwrap(), Tensor::scalar(10.0));
        assert_eq!(a.mean(None).unwrap(), Tensor::scalar(2.5));
        assert_eq!(a.max(None).unwrap(), Tensor::scalar(4.0));
        assert_eq!(a.min(None).unwrap(), Tensor::scalar(1.0));
    }

    #[test]
    fn axis_reductions_remove_the_reduced_axis() {
        let a = t2(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let col_sum = a.sum(Some(0)).unwrap();
        assert_eq!(col_sum.shape(), &[3]);
        assert_eq!(col_sum.data(), &[5.0, 7.0, 9.0]);
        let row_mean = a.mean(Some(1)).unwrap();
        assert_eq!(row_mean.shape(), &[2]);
        assert_eq!(row_mean.data(), &[2.0, 5.0]);
    }

    #[test]
    fn out_of_range_axis_is_rejected() {
        let a = t2(vec![vec![1.0, 2.0]]);
        assert!(matches!(
            a.sum(Some(2)),
            Err(NnError::ShapeMismatch { op: "sum", .. })
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Tensor::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(err, Err(NnError::ShapeMismatch { .. })));
    }

    #[test]
    fn operations_never_mutate_their_operands() {
        let a = t2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let snapshot = a.clone();
        let _ = a.add(&a).unwrap();
        let _ = a.mul(&a).unwrap();
        let _ = a.transpose();
        let _ = a.sum(Some(0)).unwrap();
        assert_eq!(a, snapshot);
    }

    #[test]
    fn clamp_bounds_every_element() {
        let a = Tensor::from_vec(vec![-1.0, 0.5, 2.0]);
        assert_eq!(a.clamp(0.0, 1.0).data(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn xavier_init_is_deterministic_under_a_seeded_rng() {
        use rand::{rngs::StdRng, SeedableRng};
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(Tensor::xavier(3, 2, &mut a), Tensor::xavier(3, 2, &mut b));
    }
}
