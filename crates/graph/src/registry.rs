//! # Named Registries
//!
//! Activation functions and weight initialization strategies are chosen
//! by name at construction time. The lookups resolve into closed enums,
//! so an unknown name fails immediately with
//! [`Error::UnsupportedParameter`] instead of surfacing later as a
//! missing function. Names are matched case-insensitively.

use tensorgate_core::{Error, Shape, Tensor};

use crate::gate::Gate;

/// A nonlinearity applied after an affine layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
}

impl Activation {
    /// Resolve an activation by name (case-insensitive).
    pub fn lookup(name: &str) -> Result<Self, Error> {
        match name.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            _ => Err(Error::UnsupportedParameter {
                value: name.to_string(),
                category: "activation function",
            }),
        }
    }

    /// The gate that applies this activation.
    pub fn gate(self) -> Gate {
        match self {
            Activation::Relu => Gate::relu(),
        }
    }
}

/// A strategy for building the initial weight tensor of an affine gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightInit {
    Ones,
}

impl WeightInit {
    /// Resolve an initialization strategy by name (case-insensitive).
    pub fn lookup(name: &str) -> Result<Self, Error> {
        match name.to_ascii_lowercase().as_str() {
            "ones" => Ok(WeightInit::Ones),
            _ => Err(Error::UnsupportedParameter {
                value: name.to_string(),
                category: "weight initialization strategy",
            }),
        }
    }

    /// Materialize a weight tensor of the given shape.
    pub fn build(self, shape: impl Into<Shape>) -> Tensor {
        match self {
            WeightInit::Ones => Tensor::ones(shape),
        }
    }
}
