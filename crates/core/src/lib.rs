//! # tensorgate-core
//!
//! The value layer of the gate graph: [`Shape`], the shape-checked
//! [`Tensor`], and the shared [`Error`] type. Everything here is pure
//! and synchronous; the graph crate layers evaluation and
//! differentiation on top.

pub mod error;
pub mod shape;
pub mod tensor;

pub use error::Error;
pub use shape::Shape;
pub use tensor::{Tensor, Value};
