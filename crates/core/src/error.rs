//! # Error Types
//!
//! Every failure in this workspace is a validation failure: an attempt
//! to combine tensors or gates whose shapes or arities do not line up.
//! Operations are pure and deterministic, so nothing is retried — the
//! error propagates straight to the caller, which aborts the current
//! forward/backward pass.

use thiserror::Error;

use crate::shape::Shape;

/// Validation failures shared by the tensor and graph crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A nested literal was not rectangular: two siblings at the same
    /// depth had different shapes.
    #[error("ragged literal at depth {depth}: sibling shapes {left} and {right}")]
    Ragged {
        depth: usize,
        left: Shape,
        right: Shape,
    },

    /// An elementwise operation was given tensors of different shapes.
    #[error("tensors do not have the same shape: left has {left} and right has {right}")]
    ShapeMismatch { left: Shape, right: Shape },

    /// Matrix-product inner dimensions disagree.
    #[error("cannot take the matrix product of shapes {left} and {right}")]
    DimensionMismatch { left: Shape, right: Shape },

    /// An index tuple was out of range, or had the wrong number of
    /// entries for the tensor's rank.
    #[error("index {index:?} is out of range for shape {shape}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Shape },

    /// A name was looked up in a closed registry and not found.
    #[error("{value} is not a supported {category}")]
    UnsupportedParameter {
        value: String,
        category: &'static str,
    },

    /// A gate was scheduled with the wrong number of available inputs.
    #[error("gate expected {expected} inputs but {found} were available")]
    ArityMismatch { expected: usize, found: usize },

    /// `backward` was called on a gate that has not seen a `forward`.
    #[error("backward called before forward")]
    PrematureBackward,

    /// An edge or slot referenced a gate id the graph does not hold.
    #[error("gate {id} is not part of this graph")]
    UnknownGate { id: usize },

    /// A consumer input slot outside the gate's fan-in, or one that is
    /// already wired.
    #[error("slot {slot} is not free on a gate with fan-in {fan_in}")]
    InvalidSlot { slot: usize, fan_in: usize },

    /// Inserting the edge would close a cycle.
    #[error("edge {from} -> {to} would close a cycle")]
    CycleDetected { from: usize, to: usize },
}
