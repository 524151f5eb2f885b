//! # Tensors
//!
//! A [`Tensor`] is a shape-checked N-dimensional array of `f32` values,
//! stored flat in row-major order. Construction from nested literals
//! goes through [`Value`], which derives the shape recursively and
//! rejects ragged input; after that, every operation re-derives nothing
//! and trusts the shape invariant.
//!
//! All operations are value-producing — each result owns freshly
//! allocated storage, so no two tensors ever alias. The only in-place
//! mutation is [`Tensor::set`], which writes a single scalar and can
//! never change the shape.
//!
//! ## Example
//!
//! ```rust
//! use tensorgate_core::Tensor;
//!
//! let a = Tensor::vector(vec![1.0, 2.0, 3.0]);
//! let b = Tensor::vector(vec![1.0, 1.0, 1.0]);
//! let c = a.add(&b).unwrap();
//! assert_eq!(c, Tensor::vector(vec![2.0, 3.0, 4.0]));
//!
//! // Nested literals are shape-derived and checked for rectangularity.
//! let m = Tensor::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(m.shape().dims(), &[2, 2]);
//! assert!(Tensor::new(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
//! ```

use std::fmt;

use crate::error::Error;
use crate::shape::Shape;

/// A nested literal: the input form of tensor construction.
///
/// Lists may nest arbitrarily deep and may contain already-built
/// tensors, whose shapes are spliced into the derived shape
/// (tensors-of-tensors flatten into one rectangular block).
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(f32),
    List(Vec<Value>),
    Tensor(Tensor),
}

impl Value {
    /// Derive the shape of this literal.
    ///
    /// Measures depth and per-level sizes, stopping at scalar leaves
    /// and splicing in the shapes of embedded tensors. Siblings with
    /// differing shapes make the literal ragged, which is an error.
    pub fn shape(&self) -> Result<Shape, Error> {
        self.shape_at(0)
    }

    fn shape_at(&self, depth: usize) -> Result<Shape, Error> {
        match self {
            Value::Scalar(_) => Ok(Shape::new(vec![])),
            Value::Tensor(t) => Ok(t.shape().clone()),
            Value::List(items) => {
                let Some(first) = items.first() else {
                    return Ok(Shape::vector(0));
                };
                let inner = first.shape_at(depth + 1)?;
                for item in &items[1..] {
                    let other = item.shape_at(depth + 1)?;
                    if other != inner {
                        return Err(Error::Ragged {
                            depth: depth + 1,
                            left: inner,
                            right: other,
                        });
                    }
                }
                let mut dims = vec![items.len()];
                dims.extend_from_slice(inner.dims());
                Ok(Shape::new(dims))
            }
        }
    }

    fn flatten_into(&self, out: &mut Vec<f32>) {
        match self {
            Value::Scalar(v) => out.push(*v),
            Value::Tensor(t) => out.extend_from_slice(&t.data),
            Value::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v)
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Tensor(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A shape-checked N-dimensional array with flat row-major storage.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Build a tensor from a nested literal, deriving and validating
    /// its shape. Ragged input fails with [`Error::Ragged`].
    pub fn new(value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        let shape = value.shape()?;
        let mut data = Vec::with_capacity(shape.numel());
        value.flatten_into(&mut data);
        Ok(Self { shape, data })
    }

    /// A rank-1 tensor of shape `[1]` holding one value.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// A rank-1 tensor from raw values.
    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: Shape::vector(data.len()),
            data,
        }
    }

    /// A tensor full of one value.
    pub fn fill(value: f32, shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![value; shape.numel()];
        Self { shape, data }
    }

    /// A tensor full of zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::fill(0.0, shape)
    }

    /// A tensor full of ones.
    pub fn ones(shape: impl Into<Shape>) -> Self {
        Self::fill(1.0, shape)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Size of the first dimension (1 for a rank-0 tensor).
    pub fn len(&self) -> usize {
        self.shape.dims().first().copied().unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The flat row-major storage.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn offset(&self, index: &[usize]) -> Result<usize, Error> {
        if index.len() != self.rank() {
            return Err(self.bad_index(index));
        }
        let strides = self.shape.strides();
        let mut offset = 0;
        for ((&i, &dim), &stride) in index.iter().zip(self.shape.dims()).zip(&strides) {
            if i >= dim {
                return Err(self.bad_index(index));
            }
            offset += i * stride;
        }
        Ok(offset)
    }

    fn bad_index(&self, index: &[usize]) -> Error {
        Error::IndexOutOfBounds {
            index: index.to_vec(),
            shape: self.shape.clone(),
        }
    }

    /// Read the scalar at a full-rank index tuple.
    pub fn get(&self, index: &[usize]) -> Result<f32, Error> {
        Ok(self.data[self.offset(index)?])
    }

    /// Write the scalar at a full-rank index tuple. Never changes the
    /// shape.
    pub fn set(&mut self, index: &[usize], value: f32) -> Result<(), Error> {
        let offset = self.offset(index)?;
        self.data[offset] = value;
        Ok(())
    }

    /// The sub-tensor addressed by an index prefix of at most `rank`
    /// entries. An empty prefix clones the whole tensor; a full-rank
    /// prefix yields a rank-0 tensor holding one value.
    pub fn at(&self, prefix: &[usize]) -> Result<Tensor, Error> {
        if prefix.len() > self.rank() {
            return Err(self.bad_index(prefix));
        }
        let strides = self.shape.strides();
        let mut start = 0;
        for ((&i, &dim), &stride) in prefix.iter().zip(self.shape.dims()).zip(&strides) {
            if i >= dim {
                return Err(self.bad_index(prefix));
            }
            start += i * stride;
        }
        let shape = Shape::new(self.shape.dims()[prefix.len()..].to_vec());
        let data = self.data[start..start + shape.numel()].to_vec();
        Ok(Tensor { shape, data })
    }

    /// The tensor with its shape reversed: the value at `(i0, ..., ik)`
    /// moves to `(ik, ..., i0)`. Rank-1 tensors are their own
    /// transpose.
    pub fn transpose(&self) -> Tensor {
        let out_shape = self.shape.reversed();
        let out_strides = out_shape.strides();
        let rank = self.rank();
        let mut data = vec![0.0; self.data.len()];
        for (flat, index) in self.shape.indices().enumerate() {
            let mut out_offset = 0;
            for (axis, &i) in index.iter().enumerate() {
                out_offset += i * out_strides[rank - 1 - axis];
            }
            data[out_offset] = self.data[flat];
        }
        Tensor {
            shape: out_shape,
            data,
        }
    }

    /// A new tensor of identical shape with `f` applied to every entry.
    pub fn apply(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Sum of all entries, as a scalar-shaped tensor.
    pub fn sum(&self) -> Tensor {
        Tensor::scalar(self.data.iter().sum())
    }

    fn same_shape(&self, other: &Tensor) -> Result<(), Error> {
        if self.shape != other.shape {
            return Err(Error::ShapeMismatch {
                left: self.shape.clone(),
                right: other.shape.clone(),
            });
        }
        Ok(())
    }

    /// Elementwise sum; shapes must match exactly.
    pub fn add(&self, other: &Tensor) -> Result<Tensor, Error> {
        self.same_shape(other)?;
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Elementwise difference; shapes must match exactly.
    pub fn sub(&self, other: &Tensor) -> Result<Tensor, Error> {
        self.same_shape(other)?;
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a - b)
                .collect(),
        })
    }

    /// Elementwise product with scalar broadcasting: a shape-`[1]`
    /// operand is replicated across the other operand's shape first.
    /// Any other shape difference is an error.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, Error> {
        let mut left = self.clone();
        let mut right = other.clone();
        if left.shape.is_scalar() {
            left = Tensor::fill(self.data[0], other.shape.clone());
        }
        if right.shape.is_scalar() {
            right = Tensor::fill(other.data[0], left.shape.clone());
        }
        left.same_shape(&right)?;
        Ok(Tensor {
            shape: left.shape,
            data: left
                .data
                .iter()
                .zip(&right.data)
                .map(|(a, b)| a * b)
                .collect(),
        })
    }

    /// Matrix product.
    ///
    /// Two rank-1 operands of equal length reduce to their dot product
    /// (a scalar-shaped result). Otherwise a rank-1 left operand is
    /// treated as a single row, a rank-1 right operand as a single
    /// column, and the inner dimensions must agree. A result whose
    /// trailing dimension is 1 is squeezed back down to rank 1.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor, Error> {
        let mismatch = || Error::DimensionMismatch {
            left: self.shape.clone(),
            right: other.shape.clone(),
        };

        if self.rank() == 1 && other.rank() == 1 {
            if self.shape != other.shape {
                return Err(mismatch());
            }
            let dot = self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum();
            return Ok(Tensor::scalar(dot));
        }

        let (m, inner_left) = match *self.shape.dims() {
            [n] => (1, n),
            [m, k] => (m, k),
            _ => return Err(mismatch()),
        };
        let (inner_right, p) = match *other.shape.dims() {
            [n] => (n, 1),
            [k, p] => (k, p),
            _ => return Err(mismatch()),
        };
        if inner_left != inner_right {
            return Err(mismatch());
        }

        let mut data = vec![0.0; m * p];
        for i in 0..m {
            for j in 0..p {
                let mut sum = 0.0;
                for k in 0..inner_left {
                    sum += self.data[i * inner_left + k] * other.data[k * p + j];
                }
                data[i * p + j] = sum;
            }
        }

        let shape = if p == 1 {
            Shape::vector(m)
        } else {
            Shape::matrix(m, p)
        };
        Ok(Tensor { shape, data })
    }

    /// Extend the trailing dimension by one, appending one entry of
    /// `x` per leading row (used to fold a bias column into an input).
    ///
    /// `x` must be rank 1 with length equal to this tensor's first
    /// dimension. Defined for rank-1 and rank-2 tensors.
    pub fn v_append(&self, x: &Tensor) -> Result<Tensor, Error> {
        let mismatch = || Error::ShapeMismatch {
            left: self.shape.clone(),
            right: x.shape.clone(),
        };
        if x.rank() != 1 || self.rank() == 0 || self.rank() > 2 {
            return Err(mismatch());
        }
        let rows = self.shape.dims()[0];
        if rows != x.shape.dims()[0] {
            return Err(mismatch());
        }

        if self.rank() == 1 {
            let mut data = self.data.clone();
            data.push(x.data[0]);
            Ok(Tensor {
                shape: Shape::vector(rows + 1),
                data,
            })
        } else {
            let cols = self.shape.dims()[1];
            let mut data = Vec::with_capacity(rows * (cols + 1));
            for i in 0..rows {
                data.extend_from_slice(&self.data[i * cols..(i + 1) * cols]);
                data.push(x.data[i]);
            }
            Ok(Tensor {
                shape: Shape::matrix(rows, cols + 1),
                data,
            })
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_scalar() {
            write!(f, "Tensor(scalar={})", self.data[0])
        } else if self.rank() == 1 {
            write!(f, "Tensor(vec{:?})", self.data)
        } else {
            write!(f, "Tensor(shape={}, data={:?})", self.shape, self.data)
        }
    }
}
