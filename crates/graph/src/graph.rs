//! # Computation Graph
//!
//! [`ComputationGraph`] wires gates into a DAG and drives evaluation
//! and differentiation over it. Nodes are [`Gate`]s, edges are
//! [`Wire`]s carrying the consumer's input slot, and a subset of gates
//! are *sources*: the designated entry points that consume the
//! caller's boundary inputs, one each, in registration order.
//!
//! `forward` schedules gates in topological order so every producer
//! completes before its consumers; `backward` walks the same order in
//! reverse, seeding each terminal (consumer-less) gate with the
//! multiplicative-identity gradient `[1.0]` and summing gradients at
//! fan-out before a gate differentiates. The topological order is
//! memoized and invalidated whenever an edge is inserted.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use log::trace;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tensorgate_core::{Error, Tensor};

use crate::gate::Gate;

/// Handle to a gate inside a [`ComputationGraph`].
pub type GateId = NodeIndex;

/// An edge: routes a producer's output into one input slot of the
/// consumer.
#[derive(Debug, Clone, Copy)]
pub struct Wire {
    pub slot: usize,
}

/// A DAG of gates with designated sources.
#[derive(Debug, Default)]
pub struct ComputationGraph {
    graph: DiGraph<Gate, Wire>,
    sources: Vec<GateId>,
    order: Option<Vec<GateId>>,
}

impl ComputationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gate and register it as a boundary source. Sources
    /// receive one caller-supplied input each, in registration order,
    /// on slot 0.
    pub fn source(&mut self, gate: Gate) -> GateId {
        let id = self.graph.add_node(gate);
        self.sources.push(id);
        self.order = None;
        id
    }

    /// Add an interior gate; all of its slots must be wired.
    pub fn gate(&mut self, gate: Gate) -> GateId {
        self.order = None;
        self.graph.add_node(gate)
    }

    /// Route `producer`'s output into input slot `slot` of `consumer`.
    ///
    /// The slot must exist, be unoccupied (slot 0 of a source is
    /// reserved for the boundary input), and the edge must not close a
    /// cycle.
    pub fn connect(&mut self, producer: GateId, consumer: GateId, slot: usize) -> Result<(), Error> {
        if self.graph.node_weight(producer).is_none() {
            return Err(Error::UnknownGate {
                id: producer.index(),
            });
        }
        let Some(gate) = self.graph.node_weight(consumer) else {
            return Err(Error::UnknownGate {
                id: consumer.index(),
            });
        };
        let fan_in = gate.fan_in();
        if slot >= fan_in || (slot == 0 && self.sources.contains(&consumer)) {
            return Err(Error::InvalidSlot { slot, fan_in });
        }
        let occupied = self
            .graph
            .edges_directed(consumer, Direction::Incoming)
            .any(|edge| edge.weight().slot == slot);
        if occupied {
            return Err(Error::InvalidSlot { slot, fan_in });
        }
        if producer == consumer || has_path_connecting(&self.graph, consumer, producer, None) {
            return Err(Error::CycleDetected {
                from: producer.index(),
                to: consumer.index(),
            });
        }

        self.graph.add_edge(producer, consumer, Wire { slot });
        self.order = None;
        Ok(())
    }

    /// Read access to a gate (e.g. to inspect affine weights).
    pub fn get(&self, id: GateId) -> Option<&Gate> {
        self.graph.node_weight(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The gates reachable from the sources, producers before
    /// consumers. Memoized until the next edge insertion.
    pub fn topological_sort(&mut self) -> Vec<GateId> {
        self.ensure_order()
    }

    fn ensure_order(&mut self) -> Vec<GateId> {
        if self.order.is_none() {
            self.order = Some(self.compute_order());
        }
        match &self.order {
            Some(order) => order.clone(),
            None => Vec::new(),
        }
    }

    /// Iterative depth-first traversal from the sources; reversed
    /// post-order completion is a topological order of the reachable
    /// subgraph.
    fn compute_order(&self) -> Vec<GateId> {
        let mut visited: HashSet<GateId> = HashSet::new();
        let mut order: Vec<GateId> = Vec::new();

        for &root in &self.sources {
            if visited.contains(&root) {
                continue;
            }
            visited.insert(root);
            let mut stack = vec![(root, self.consumers(root))];
            while let Some((node, children)) = stack.last_mut() {
                if let Some(child) = children.pop() {
                    if visited.insert(child) {
                        let grandchildren = self.consumers(child);
                        stack.push((child, grandchildren));
                    }
                } else {
                    order.push(*node);
                    stack.pop();
                }
            }
        }

        order.reverse();
        order
    }

    fn consumers(&self, node: GateId) -> Vec<GateId> {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect()
    }

    fn is_terminal(&self, node: GateId) -> bool {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Evaluate the graph on one boundary input per source.
    ///
    /// Returns the outputs of the terminal gates, in topological
    /// order. A gate scheduled with an unwired slot, or a boundary
    /// input count that does not match the source count, is an
    /// [`Error::ArityMismatch`].
    pub fn forward(&mut self, inputs: &[Tensor]) -> Result<Vec<Tensor>, Error> {
        if inputs.len() != self.sources.len() {
            return Err(Error::ArityMismatch {
                expected: self.sources.len(),
                found: inputs.len(),
            });
        }
        let order = self.ensure_order();

        // Per-gate slot buffers, filled as producers complete.
        let mut pending: HashMap<GateId, Vec<Option<Tensor>>> = HashMap::new();
        for (&src, input) in self.sources.iter().zip(inputs) {
            let fan_in = self.graph[src].fan_in();
            let slots = pending.entry(src).or_insert_with(|| vec![None; fan_in]);
            slots[0] = Some(input.clone());
        }

        let mut values: HashMap<GateId, Tensor> = HashMap::new();
        for &node in &order {
            let fan_in = self.graph[node].fan_in();
            let slots = pending
                .remove(&node)
                .unwrap_or_else(|| vec![None; fan_in]);
            let found = slots.iter().filter(|slot| slot.is_some()).count();
            let mut gate_inputs = Vec::with_capacity(fan_in);
            for slot in slots {
                match slot {
                    Some(value) => gate_inputs.push(value),
                    None => {
                        return Err(Error::ArityMismatch {
                            expected: fan_in,
                            found,
                        })
                    }
                }
            }

            trace!("forward {} gate {}", self.graph[node].kind(), node.index());
            let output = self.graph[node].forward(&gate_inputs)?;

            let targets: Vec<(GateId, usize, usize)> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .map(|edge| {
                    let target = edge.target();
                    (target, edge.weight().slot, self.graph[target].fan_in())
                })
                .collect();
            for (target, slot, target_fan_in) in targets {
                let slots = pending
                    .entry(target)
                    .or_insert_with(|| vec![None; target_fan_in]);
                slots[slot] = Some(output.clone());
            }

            values.insert(node, output);
        }

        Ok(order
            .iter()
            .filter(|&&node| self.is_terminal(node))
            .map(|node| values[node].clone())
            .collect())
    }

    /// Differentiate the most recent forward pass.
    ///
    /// Walks the topological order in reverse. Terminals are seeded
    /// with the gradient `[1.0]`; interior gates differentiate once
    /// their consumers' gradients are fully summed. Affine gates
    /// update their weights as a side effect. Returns the accumulated
    /// gradient delivered to each source, in registration order.
    pub fn backward(&mut self) -> Result<Vec<Tensor>, Error> {
        let order = self.ensure_order();
        let mut grads: HashMap<GateId, Tensor> = HashMap::new();

        for &node in order.iter().rev() {
            if self.is_terminal(node) {
                grads.insert(node, Tensor::scalar(1.0));
            }
            let Some(upstream) = grads.get(&node).cloned() else {
                continue;
            };

            trace!("backward {} gate {}", self.graph[node].kind(), node.index());
            let input_grads = self.graph[node].backward(&upstream)?;

            let incoming: Vec<(GateId, usize)> = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|edge| (edge.source(), edge.weight().slot))
                .collect();
            for (producer, slot) in incoming {
                let grad = input_grads[slot].clone();
                match grads.entry(producer) {
                    Entry::Occupied(mut entry) => {
                        let sum = entry.get().add(&grad)?;
                        entry.insert(sum);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(grad);
                    }
                }
            }
        }

        self.sources
            .iter()
            .map(|src| grads.get(src).cloned().ok_or(Error::PrematureBackward))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AffineSpec;

    fn diamond() -> (ComputationGraph, GateId, GateId, GateId, GateId) {
        // c -> (r1, r2) -> add
        let mut graph = ComputationGraph::new();
        let c = graph.source(Gate::constant());
        let r1 = graph.gate(Gate::relu());
        let r2 = graph.gate(Gate::relu());
        let add = graph.gate(Gate::add());
        graph.connect(c, r1, 0).unwrap();
        graph.connect(c, r2, 0).unwrap();
        graph.connect(r1, add, 0).unwrap();
        graph.connect(r2, add, 1).unwrap();
        (graph, c, r1, r2, add)
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let (mut graph, c, r1, r2, add) = diamond();
        let order = graph.topological_sort();
        let pos = |id: GateId| order.iter().position(|&n| n == id).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos(c) < pos(r1));
        assert!(pos(c) < pos(r2));
        assert!(pos(r1) < pos(add));
        assert!(pos(r2) < pos(add));
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut graph = ComputationGraph::new();
        let a = graph.source(Gate::constant());
        let b = graph.gate(Gate::add());
        graph.connect(a, b, 0).unwrap();
        assert_eq!(
            graph.connect(b, b, 1),
            Err(Error::CycleDetected {
                from: b.index(),
                to: b.index()
            })
        );
        let c = graph.gate(Gate::relu());
        graph.connect(b, c, 0).unwrap();
        assert!(matches!(
            graph.connect(c, b, 1),
            Err(Error::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_connect_validates_slots() {
        let mut graph = ComputationGraph::new();
        let a = graph.source(Gate::constant());
        let b = graph.gate(Gate::relu());
        assert_eq!(
            graph.connect(a, b, 1),
            Err(Error::InvalidSlot { slot: 1, fan_in: 1 })
        );
        graph.connect(a, b, 0).unwrap();
        // The slot is now occupied.
        assert_eq!(
            graph.connect(a, b, 0),
            Err(Error::InvalidSlot { slot: 0, fan_in: 1 })
        );
        // Slot 0 of a source is reserved for the boundary input.
        assert_eq!(
            graph.connect(b, a, 0),
            Err(Error::InvalidSlot { slot: 0, fan_in: 1 })
        );
    }

    #[test]
    fn test_forward_checks_boundary_arity() {
        let (mut graph, ..) = diamond();
        assert_eq!(
            graph.forward(&[]),
            Err(Error::ArityMismatch {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_forward_reports_unwired_slot() {
        let mut graph = ComputationGraph::new();
        let a = graph.source(Gate::constant());
        let add = graph.gate(Gate::add());
        graph.connect(a, add, 0).unwrap();
        // Slot 1 of the adder is never wired.
        assert_eq!(
            graph.forward(&[Tensor::scalar(1.0)]),
            Err(Error::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_forward_returns_terminal_outputs() {
        let (mut graph, ..) = diamond();
        let out = graph.forward(&[Tensor::vector(vec![-1.0, 2.0])]).unwrap();
        assert_eq!(out, vec![Tensor::vector(vec![0.0, 4.0])]);
    }

    #[test]
    fn test_backward_accumulates_at_fan_out() {
        let (mut graph, ..) = diamond();
        graph.forward(&[Tensor::vector(vec![-1.0, 2.0])]).unwrap();
        let grads = graph.backward().unwrap();
        // Both ReLU branches contribute [0, 1]; the sum reaches the
        // source.
        assert_eq!(grads, vec![Tensor::vector(vec![0.0, 2.0])]);
    }

    #[test]
    fn test_edge_insertion_invalidates_memoized_order() {
        let mut graph = ComputationGraph::new();
        let a = graph.source(Gate::constant());
        assert_eq!(graph.topological_sort(), vec![a]);
        let b = graph.gate(Gate::relu());
        graph.connect(a, b, 0).unwrap();
        assert_eq!(graph.topological_sort(), vec![a, b]);
    }

    #[test]
    fn test_affine_weights_reachable_through_graph() {
        let mut graph = ComputationGraph::new();
        let c = graph.source(Gate::constant());
        let affine = graph.gate(AffineSpec::new(2, 1, 0.1).build());
        graph.connect(c, affine, 0).unwrap();
        graph.forward(&[Tensor::vector(vec![1.0, 2.0])]).unwrap();
        graph.backward().unwrap();
        let weights = graph.get(affine).and_then(Gate::weights).unwrap();
        assert_eq!(weights, &Tensor::vector(vec![0.9, 0.8]));
    }
}
