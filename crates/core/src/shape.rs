//! # Shapes
//!
//! A [`Shape`] is the ordered list of dimension sizes of a tensor. It is
//! the contract every tensor operation checks before touching data:
//! elementwise ops demand identical shapes, the matrix product demands
//! matching inner dimensions, and indexing demands one index per
//! dimension.
//!
//! Shapes are plain runtime values (`Vec<usize>`) rather than type-level
//! dimensions; the graph layer wires gates together dynamically, so the
//! checks happen at construction and evaluation time.

use std::fmt;

/// The dimension sizes of a tensor, outermost first.
///
/// Empty dims are legal (a rank-0 value); a scalar in the broadcast
/// sense is the rank-1 shape `[1]`.
///
/// # Example
///
/// ```rust
/// use tensorgate_core::Shape;
///
/// let m = Shape::matrix(3, 4);
/// assert_eq!(m.rank(), 2);
/// assert_eq!(m.numel(), 12);
/// assert_eq!(m.reversed(), Shape::matrix(4, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a shape from explicit dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// The rank-1 shape `[1]`, the broadcastable scalar.
    pub fn scalar() -> Self {
        Self { dims: vec![1] }
    }

    /// A rank-1 shape of the given length.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// A rank-2 shape.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Dimension sizes, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether this is the broadcastable scalar shape `[1]`.
    pub fn is_scalar(&self) -> bool {
        self.dims == [1]
    }

    /// The shape with its dimensions in reverse order (the shape of a
    /// transposed tensor).
    pub fn reversed(&self) -> Shape {
        let mut dims = self.dims.clone();
        dims.reverse();
        Shape { dims }
    }

    /// Row-major strides: the flat-offset step for each dimension.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dims.len()];
        for axis in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.dims[axis + 1];
        }
        strides
    }

    /// Iterate over every valid index tuple in row-major order.
    ///
    /// A rank-0 shape yields a single empty tuple; any zero-sized
    /// dimension yields nothing.
    pub fn indices(&self) -> IndexIter {
        let start = if self.dims.iter().any(|&d| d == 0) {
            None
        } else {
            Some(vec![0; self.dims.len()])
        };
        IndexIter {
            dims: self.dims.clone(),
            next: start,
        }
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.dims
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Odometer-style iterator over all index tuples of a shape.
pub struct IndexIter {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;

        let mut advanced = current.clone();
        let mut rolled_over = true;
        for axis in (0..advanced.len()).rev() {
            advanced[axis] += 1;
            if advanced[axis] < self.dims[axis] {
                rolled_over = false;
                break;
            }
            advanced[axis] = 0;
        }
        if !rolled_over {
            self.next = Some(advanced);
        }

        Some(current)
    }
}
