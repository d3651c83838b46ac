//! Property-based tests for the pulse network core.
//!
//! Uses proptest to generate random wirings, then checks that construction
//! and delivery are deterministic and that structural invariants hold.

use pulsenet_core::engine::{Engine, EngineConfig, EngineError};
use pulsenet_core::id::Level;
use pulsenet_core::network::{Network, WiringDecl};
use pulsenet_core::node::{DeclaredKind, NodeKind, NodeState};
use pulsenet_core::validation::diff_networks;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Random wiring over `n0..nK` plus a sink `out`. Each node is a flip-flop
/// or a conjunction with up to three destinations; the broadcaster feeds a
/// random subset.
fn arb_wiring(max_nodes: usize) -> impl Strategy<Value = Vec<WiringDecl>> {
    (1..=max_nodes).prop_flat_map(|n| {
        let kinds = proptest::collection::vec(any::<bool>(), n);
        let dests = proptest::collection::vec(proptest::collection::vec(0..=n, 0..=3), n);
        let entry = proptest::collection::vec(0..n, 1..=3);
        (kinds, dests, entry).prop_map(move |(kinds, dests, entry)| {
            let name = |i: usize| {
                if i == n {
                    "out".to_string()
                } else {
                    format!("n{i}")
                }
            };
            let mut decls = vec![WiringDecl::new(
                "broadcaster",
                None,
                entry.iter().map(|&i| name(i)),
            )];
            for (i, (flip, outs)) in kinds.iter().zip(&dests).enumerate() {
                let kind = if *flip {
                    DeclaredKind::FlipFlop
                } else {
                    DeclaredKind::Conjunction
                };
                decls.push(WiringDecl::new(
                    name(i),
                    Some(kind),
                    outs.iter().map(|&j| name(j)),
                ));
            }
            decls
        })
    })
}

fn small_budget() -> Engine {
    Engine::new(EngineConfig {
        delivery_budget: 5_000,
    })
}

/// Per-trigger `(low, high)` counts until the first error.
fn run_counts(network: &mut Network, triggers: u64) -> Result<Vec<(u64, u64)>, EngineError> {
    let engine = small_budget();
    let mut counts = Vec::new();
    for _ in 0..triggers {
        let trace = engine.run_trigger(network)?;
        counts.push((trace.low_count(), trace.high_count()));
    }
    Ok(counts)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Two builds from the same wiring are indistinguishable.
    #[test]
    fn construction_is_idempotent(decls in arb_wiring(8)) {
        let a = Network::build(decls.clone()).unwrap();
        let b = Network::build(decls).unwrap();
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert!(diff_networks(&a, &b).is_identical);
    }

    /// Same wiring, same trigger count: same outcome, error or not.
    #[test]
    fn delivery_is_deterministic(decls in arb_wiring(8)) {
        let mut a = Network::build(decls.clone()).unwrap();
        let mut b = Network::build(decls).unwrap();
        prop_assert_eq!(run_counts(&mut a, 20), run_counts(&mut b, 20));
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    /// Conjunction memory has one entry per distinct input, before and after
    /// running triggers.
    #[test]
    fn conjunction_memory_matches_inputs(decls in arb_wiring(8)) {
        let mut net = Network::build(decls).unwrap();
        let _ = run_counts(&mut net, 5);
        for (_, node) in net.nodes() {
            if let NodeState::Conjunction { memory } = &node.state {
                prop_assert_eq!(memory.len(), node.inputs.len());
                for input in &node.inputs {
                    prop_assert!(memory.contains_key(input));
                }
            }
        }
    }

    /// Every trace opens with the source's Low pulse to the entry and only
    /// names nodes the network owns.
    #[test]
    fn traces_stay_inside_the_network(decls in arb_wiring(8)) {
        let mut net = Network::build(decls).unwrap();
        let engine = small_budget();
        for _ in 0..5 {
            let Ok(trace) = engine.run_trigger(&mut net) else { break };
            let first = trace.iter().next().unwrap().pulse;
            prop_assert_eq!(first.sender, net.source());
            prop_assert_eq!(first.receiver, net.entry());
            prop_assert_eq!(first.level, Level::Low);
            for pulse in trace.pulses() {
                prop_assert!(net.contains(pulse.sender));
                prop_assert!(net.contains(pulse.receiver));
                prop_assert_ne!(net.kind(pulse.receiver), Some(NodeKind::Source));
            }
        }
    }

    /// The trigger counter only advances on drained triggers.
    #[test]
    fn trigger_counter_tracks_successes(decls in arb_wiring(8)) {
        let mut net = Network::build(decls).unwrap();
        let engine = small_budget();
        let mut drained = 0u64;
        for _ in 0..10 {
            if engine.run_trigger(&mut net).is_err() {
                break;
            }
            drained += 1;
        }
        prop_assert_eq!(net.triggers(), drained);
    }
}
