//! # Gates
//!
//! A [`Gate`] is a differentiable node: a closed set of operations with
//! a uniform forward/backward contract. `forward` consumes exactly
//! [`Gate::fan_in`] input tensors, caches what the derivative will
//! need, and produces one output. `backward` consumes that cache plus
//! the upstream gradient and returns one downstream gradient per input
//! slot.
//!
//! The cache is taken, not peeked: each `backward` must be preceded by
//! its own `forward`, and calling it cold is
//! [`Error::PrematureBackward`].
//!
//! [`Affine`] is the only stateful gate — its backward pass folds the
//! gradient-descent update into the weights as a side effect, so a
//! full forward/backward sweep of a graph is one training step.

use tensorgate_core::{Error, Tensor};

use crate::registry::WeightInit;

/// Construction parameters for an [`Affine`] gate.
///
/// The learning rate is always explicit; there is no default step
/// size. Weights start as `(input_size [+1 with bias], n_nodes)` built
/// by the chosen initializer, squeezed to rank 1 when `n_nodes == 1`.
#[derive(Debug, Clone)]
pub struct AffineSpec {
    input_size: usize,
    n_nodes: usize,
    learning_rate: f32,
    init: WeightInit,
    has_bias: bool,
}

impl AffineSpec {
    pub fn new(input_size: usize, n_nodes: usize, learning_rate: f32) -> Self {
        Self {
            input_size,
            n_nodes,
            learning_rate,
            init: WeightInit::Ones,
            has_bias: false,
        }
    }

    /// Choose the weight initialization strategy.
    pub fn init(mut self, init: WeightInit) -> Self {
        self.init = init;
        self
    }

    /// Fold a bias term in by appending a ones column to the input.
    pub fn with_bias(mut self) -> Self {
        self.has_bias = true;
        self
    }

    /// Build the gate.
    pub fn build(self) -> Gate {
        let rows = self.input_size + usize::from(self.has_bias);
        let weights = if self.n_nodes == 1 {
            self.init.build(vec![rows])
        } else {
            self.init.build(vec![rows, self.n_nodes])
        };
        Gate::Affine(Affine {
            weights,
            learning_rate: self.learning_rate,
            has_bias: self.has_bias,
            cache: None,
        })
    }
}

/// A learnable linear map `weightsᵀ @ input`, updated in place by its
/// own backward pass.
#[derive(Debug, Clone)]
pub struct Affine {
    weights: Tensor,
    learning_rate: f32,
    has_bias: bool,
    cache: Option<Tensor>,
}

impl Affine {
    /// The current weights (including the bias row, if any).
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    fn forward(&mut self, input: &Tensor) -> Result<Tensor, Error> {
        let expected = self.weights.len() - usize::from(self.has_bias);
        if input.rank() != 1 || input.len() != expected {
            return Err(Error::ShapeMismatch {
                left: self.weights.shape().clone(),
                right: input.shape().clone(),
            });
        }
        let input = if self.has_bias {
            input.v_append(&Tensor::ones(vec![input.len()]))?
        } else {
            input.clone()
        };
        let output = self.weights.transpose().matmul(&input)?;
        self.cache = Some(input);
        Ok(output)
    }

    fn backward(&mut self, upstream: &Tensor) -> Result<Vec<Tensor>, Error> {
        let input = self.cache.take().ok_or(Error::PrematureBackward)?;

        // Downstream gradient uses the pre-update weights.
        let downstream = self.weights.transpose().mul(upstream)?;

        let grad_w = input.mul(upstream)?;
        let step = grad_w.mul(&Tensor::scalar(self.learning_rate))?;
        self.weights = self.weights.sub(&step)?;

        Ok(vec![downstream])
    }
}

/// A differentiable graph node.
#[derive(Debug, Clone)]
pub enum Gate {
    /// Identity: passes its input through unchanged.
    Constant { cache: Option<Tensor> },
    /// Learnable linear map with built-in gradient-descent update.
    Affine(Affine),
    /// Elementwise `max(0, x)`.
    Relu { cache: Option<Tensor> },
    /// Scalar loss: sum of the input, or summed squared error against
    /// a fixed target.
    Loss {
        target: Option<Tensor>,
        cache: Option<Tensor>,
    },
    /// Elementwise sum of two inputs.
    Add {
        cache: Option<(Tensor, Tensor)>,
    },
    /// Matrix product of two inputs (dot product for vectors).
    Multiply {
        cache: Option<(Tensor, Tensor)>,
    },
}

impl Gate {
    pub fn constant() -> Self {
        Gate::Constant { cache: None }
    }

    pub fn relu() -> Self {
        Gate::Relu { cache: None }
    }

    /// Loss that sums its input.
    pub fn loss() -> Self {
        Gate::Loss {
            target: None,
            cache: None,
        }
    }

    /// Loss that sums the squared error against a fixed target.
    pub fn loss_against(target: Tensor) -> Self {
        Gate::Loss {
            target: Some(target),
            cache: None,
        }
    }

    pub fn add() -> Self {
        Gate::Add { cache: None }
    }

    pub fn multiply() -> Self {
        Gate::Multiply { cache: None }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Gate::Constant { .. } => "constant",
            Gate::Affine(_) => "affine",
            Gate::Relu { .. } => "relu",
            Gate::Loss { .. } => "loss",
            Gate::Add { .. } => "add",
            Gate::Multiply { .. } => "multiply",
        }
    }

    /// Number of input slots this gate consumes.
    pub fn fan_in(&self) -> usize {
        match self {
            Gate::Add { .. } | Gate::Multiply { .. } => 2,
            _ => 1,
        }
    }

    /// The weights, if this is an affine gate.
    pub fn weights(&self) -> Option<&Tensor> {
        match self {
            Gate::Affine(affine) => Some(affine.weights()),
            _ => None,
        }
    }

    /// Execute the gate, caching whatever the derivative needs.
    pub fn forward(&mut self, inputs: &[Tensor]) -> Result<Tensor, Error> {
        if inputs.len() != self.fan_in() {
            return Err(Error::ArityMismatch {
                expected: self.fan_in(),
                found: inputs.len(),
            });
        }
        match self {
            Gate::Constant { cache } => {
                *cache = Some(inputs[0].clone());
                Ok(inputs[0].clone())
            }
            Gate::Affine(affine) => affine.forward(&inputs[0]),
            Gate::Relu { cache } => {
                let output = inputs[0].apply(|x| x.max(0.0));
                *cache = Some(inputs[0].clone());
                Ok(output)
            }
            Gate::Loss { target, cache } => {
                let output = match target {
                    Some(target) => {
                        let diff = inputs[0].sub(target)?;
                        diff.mul(&diff)?.sum()
                    }
                    None => inputs[0].sum(),
                };
                *cache = Some(inputs[0].clone());
                Ok(output)
            }
            Gate::Add { cache } => {
                let output = inputs[0].add(&inputs[1])?;
                *cache = Some((inputs[0].clone(), inputs[1].clone()));
                Ok(output)
            }
            Gate::Multiply { cache } => {
                let output = inputs[0].matmul(&inputs[1])?;
                *cache = Some((inputs[0].clone(), inputs[1].clone()));
                Ok(output)
            }
        }
    }

    /// Consume the cached forward state and return one downstream
    /// gradient per input slot.
    pub fn backward(&mut self, upstream: &Tensor) -> Result<Vec<Tensor>, Error> {
        match self {
            Gate::Constant { cache } => {
                let input = cache.take().ok_or(Error::PrematureBackward)?;
                Ok(vec![input])
            }
            Gate::Affine(affine) => affine.backward(upstream),
            Gate::Relu { cache } => {
                let input = cache.take().ok_or(Error::PrematureBackward)?;
                let mask = input.apply(|x| if x > 0.0 { 1.0 } else { 0.0 });
                Ok(vec![mask.mul(upstream)?])
            }
            Gate::Loss { cache, .. } => {
                cache.take().ok_or(Error::PrematureBackward)?;
                Ok(vec![Tensor::scalar(1.0)])
            }
            Gate::Add { cache } => {
                cache.take().ok_or(Error::PrematureBackward)?;
                Ok(vec![upstream.clone(), upstream.clone()])
            }
            Gate::Multiply { cache } => {
                let (x, y) = cache.take().ok_or(Error::PrematureBackward)?;
                Ok(vec![upstream.mul(&y)?, upstream.mul(&x)?])
            }
        }
    }
}
