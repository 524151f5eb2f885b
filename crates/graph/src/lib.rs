//! # tensorgate-graph
//!
//! Reverse-mode autodiff over a DAG of [`Gate`]s. The
//! [`ComputationGraph`] evaluates gates in topological order, caches
//! what each derivative needs, and then walks the order backwards,
//! accumulating gradients at fan-out; affine gates fold a
//! gradient-descent update into their own backward pass.
//!
//! ## Example
//!
//! ```rust
//! use tensorgate_core::Tensor;
//! use tensorgate_graph::{affine_pipeline, train, TrainConfig};
//!
//! // input -> affine -> relu -> loss, all-ones weights, lr 0.1
//! let mut pipeline = affine_pipeline(&TrainConfig::new(3, 0.1)).unwrap();
//! let sample = Tensor::vector(vec![1.0, 2.0, 3.0]);
//! let history = train(&mut pipeline, &sample, 5).unwrap();
//! assert!(history[4] < history[0]);
//! ```

pub mod gate;
pub mod graph;
pub mod registry;
pub mod train;

pub use gate::{Affine, AffineSpec, Gate};
pub use graph::{ComputationGraph, GateId, Wire};
pub use registry::{Activation, WeightInit};
pub use train::{affine_pipeline, layer_stack, train, LayerSpec, Pipeline, TrainConfig};
