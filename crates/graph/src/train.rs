//! # Training Driver
//!
//! Convenience wiring for the common single-layer setup
//! (constant input → affine → activation → loss) and a plain
//! gradient-descent loop over it. One epoch is one forward/backward
//! sweep: the affine gate updates its own weights during backward, so
//! the loop only has to drive the graph and record the loss.

use log::debug;
use tensorgate_core::{Error, Tensor};

use crate::gate::{AffineSpec, Gate};
use crate::graph::{ComputationGraph, GateId};
use crate::registry::{Activation, WeightInit};

/// Parameters for [`affine_pipeline`].
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub input_size: usize,
    pub learning_rate: f32,
    pub activation: Activation,
    pub init: WeightInit,
    pub has_bias: bool,
}

impl TrainConfig {
    pub fn new(input_size: usize, learning_rate: f32) -> Self {
        Self {
            input_size,
            learning_rate,
            activation: Activation::Relu,
            init: WeightInit::Ones,
            has_bias: false,
        }
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn init(mut self, init: WeightInit) -> Self {
        self.init = init;
        self
    }

    pub fn with_bias(mut self) -> Self {
        self.has_bias = true;
        self
    }
}

/// A wired single-layer training graph with handles to its gates.
#[derive(Debug)]
pub struct Pipeline {
    pub graph: ComputationGraph,
    pub input: GateId,
    pub affine: GateId,
    pub loss: GateId,
}

impl Pipeline {
    /// The affine gate's current weights.
    pub fn weights(&self) -> Option<&Tensor> {
        self.graph.get(self.affine).and_then(Gate::weights)
    }
}

/// Wire constant input → affine → activation → loss.
pub fn affine_pipeline(config: &TrainConfig) -> Result<Pipeline, Error> {
    let mut graph = ComputationGraph::new();
    let input = graph.source(Gate::constant());

    let mut spec = AffineSpec::new(config.input_size, 1, config.learning_rate).init(config.init);
    if config.has_bias {
        spec = spec.with_bias();
    }
    let affine = graph.gate(spec.build());
    let activation = graph.gate(config.activation.gate());
    let loss = graph.gate(Gate::loss());

    graph.connect(input, affine, 0)?;
    graph.connect(affine, activation, 0)?;
    graph.connect(activation, loss, 0)?;

    Ok(Pipeline {
        graph,
        input,
        affine,
        loss,
    })
}

/// Run `epochs` forward/backward sweeps on one sample and return the
/// loss history.
pub fn train(pipeline: &mut Pipeline, sample: &Tensor, epochs: usize) -> Result<Vec<f32>, Error> {
    let mut history = Vec::with_capacity(epochs);
    for epoch in 0..epochs {
        let outputs = pipeline.graph.forward(std::slice::from_ref(sample))?;
        let loss = outputs[0].data()[0];
        pipeline.graph.backward()?;
        debug!("epoch {epoch}: loss {loss}");
        history.push(loss);
    }
    Ok(history)
}

/// One affine+activation pair in a [`layer_stack`].
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub n_nodes: usize,
    pub activation: Activation,
}

/// Append a chain of affine+activation pairs to `graph`, fed from
/// `input`, and return the last gate of the chain.
pub fn layer_stack(
    graph: &mut ComputationGraph,
    input: GateId,
    input_size: usize,
    layers: &[LayerSpec],
    learning_rate: f32,
) -> Result<GateId, Error> {
    let mut prev = input;
    let mut width = input_size;
    for layer in layers {
        let affine = graph.gate(AffineSpec::new(width, layer.n_nodes, learning_rate).build());
        let activation = graph.gate(layer.activation.gate());
        graph.connect(prev, affine, 0)?;
        graph.connect(affine, activation, 0)?;
        prev = activation;
        width = layer.n_nodes;
    }
    Ok(prev)
}
