//! Topological-order guarantees on randomized DAGs.

use tensorgate_core::Error;
use tensorgate_graph::{ComputationGraph, Gate, GateId};

/// Deterministic LCG so the random graphs are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() >> 33) as usize % n
    }
}

/// Build a random DAG: node 0 is the only source, and every later
/// node draws its slot-0 producer (and sometimes a slot-1 producer)
/// from the nodes before it, so the whole graph stays acyclic and
/// reachable.
fn random_dag(rng: &mut Lcg) -> (ComputationGraph, Vec<GateId>, Vec<(GateId, GateId)>) {
    let n = 2 + rng.below(19);
    let mut graph = ComputationGraph::new();
    let mut ids = vec![graph.source(Gate::constant())];
    for _ in 1..n {
        ids.push(graph.gate(Gate::add()));
    }

    let mut edges = Vec::new();
    for j in 1..n {
        let i = rng.below(j);
        graph.connect(ids[i], ids[j], 0).unwrap();
        edges.push((ids[i], ids[j]));

        if j > 1 && rng.below(2) == 1 {
            let i2 = rng.below(j);
            graph.connect(ids[i2], ids[j], 1).unwrap();
            edges.push((ids[i2], ids[j]));
        }
    }
    (graph, ids, edges)
}

#[test]
fn producers_precede_consumers_on_random_dags() {
    for seed in [1, 7, 42, 99, 1234] {
        let mut rng = Lcg(seed);
        let (mut graph, ids, edges) = random_dag(&mut rng);

        let order = graph.topological_sort();
        assert_eq!(order.len(), ids.len(), "seed {seed}: node dropped");

        let pos = |id: GateId| order.iter().position(|&n| n == id).unwrap();
        for &(producer, consumer) in &edges {
            assert!(
                pos(producer) < pos(consumer),
                "seed {seed}: edge {producer:?} -> {consumer:?} out of order"
            );
        }
    }
}

#[test]
fn memoized_order_is_stable() {
    let mut rng = Lcg(42);
    let (mut graph, ..) = random_dag(&mut rng);
    let first = graph.topological_sort();
    let second = graph.topological_sort();
    assert_eq!(first, second);
}

#[test]
fn back_edges_are_rejected_everywhere_along_a_chain() {
    let mut graph = ComputationGraph::new();
    let source = graph.source(Gate::constant());
    let mut chain = vec![source];
    for _ in 0..5 {
        let next = graph.gate(Gate::add());
        graph.connect(*chain.last().unwrap(), next, 0).unwrap();
        chain.push(next);
    }

    // Wiring any later node back into an earlier adder's free slot
    // would close a cycle.
    for (i, &early) in chain.iter().enumerate().skip(1) {
        for &late in &chain[i..] {
            assert!(
                matches!(
                    graph.connect(late, early, 1),
                    Err(Error::CycleDetected { .. })
                ),
                "expected cycle rejection for {late:?} -> {early:?}"
            );
        }
    }
}
