//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::network::{Network, WiringDecl};
use crate::node::DeclaredKind;

// ===========================================================================
// Declaration helpers
// ===========================================================================

pub fn decl(name: &str, kind: Option<DeclaredKind>, dests: &[&str]) -> WiringDecl {
    WiringDecl::new(name, kind, dests.iter().copied())
}

pub fn flip_flop(name: &str, dests: &[&str]) -> WiringDecl {
    decl(name, Some(DeclaredKind::FlipFlop), dests)
}

pub fn conjunction(name: &str, dests: &[&str]) -> WiringDecl {
    decl(name, Some(DeclaredKind::Conjunction), dests)
}

/// Build a network, panicking on malformed wiring.
pub fn build(decls: Vec<WiringDecl>) -> Network {
    Network::build(decls).expect("test wiring should be valid")
}

// ===========================================================================
// Reference circuits
// ===========================================================================

/// `broadcaster -> a; %a -> inv, con; &inv -> b; %b -> con; &con -> output`.
///
/// 1000 triggers deliver 4250 Low and 2750 High pulses.
pub fn textbook_circuit() -> Network {
    build(vec![
        decl("broadcaster", None, &["a"]),
        flip_flop("a", &["inv", "con"]),
        conjunction("inv", &["b"]),
        flip_flop("b", &["con"]),
        conjunction("con", &["output"]),
    ])
}

/// `broadcaster -> a, b, c; %a -> b; %b -> c; %c -> inv; &inv -> a`.
///
/// Every trigger delivers 8 Low and 4 High pulses.
pub fn flip_flop_ring() -> Network {
    build(vec![
        decl("broadcaster", None, &["a", "b", "c"]),
        flip_flop("a", &["b"]),
        flip_flop("b", &["c"]),
        flip_flop("c", &["inv"]),
        conjunction("inv", &["a"]),
    ])
}

/// A broadcaster wired straight to `outputs` sinks.
pub fn fan_out(outputs: usize) -> Network {
    let names: Vec<String> = (0..outputs).map(|i| format!("out{i}")).collect();
    let dests: Vec<&str> = names.iter().map(String::as_str).collect();
    build(vec![decl("broadcaster", None, &dests)])
}

/// Five chained flip-flops feeding `&con -> rx`, plus a dangling `a2`.
/// `con` first sees High at trigger 16 and next at trigger 48.
pub fn binary_counter() -> Network {
    build(vec![
        decl("broadcaster", None, &["a1", "a2"]),
        flip_flop("a1", &["b1"]),
        flip_flop("b1", &["c1"]),
        flip_flop("c1", &["d1"]),
        flip_flop("d1", &["e1"]),
        flip_flop("e1", &["con"]),
        conjunction("con", &["rx"]),
    ])
}

// ===========================================================================
// Periodic counters
// ===========================================================================

/// Declarations for a self-resetting flip-flop counter with the given
/// period, reporting to `target`.
///
/// Bits `{prefix}_b0 ..` form a ripple counter driven from `{prefix}_b0`.
/// The set bits of `period` feed the conjunction `{prefix}_gate`; when they
/// are all on the gate emits Low to the clear bits and to bit 0, which adds
/// `2^bits - period` and wraps the counter to zero. `{prefix}_inv` inverts
/// the gate, so `target` sees exactly one High from it at every multiple of
/// `period`.
///
/// The caller wires the broadcaster to `{prefix}_b0`.
///
/// # Panics
///
/// Panics if `period` is even or smaller than 3.
pub fn counter_decls(prefix: &str, period: u64, target: &str) -> Vec<WiringDecl> {
    assert!(period >= 3 && period % 2 == 1, "period must be odd and >= 3");
    let bits = (u64::BITS - period.leading_zeros()) as usize;
    let bit = |j: usize| format!("{prefix}_b{j}");
    let gate = format!("{prefix}_gate");
    let inv = format!("{prefix}_inv");
    let is_set = |j: usize| period & (1 << j) != 0;

    let mut decls = Vec::with_capacity(bits + 2);
    for j in 0..bits {
        let mut dests = Vec::new();
        if j + 1 < bits {
            dests.push(bit(j + 1));
        }
        if is_set(j) {
            dests.push(gate.clone());
        }
        decls.push(WiringDecl::new(bit(j), Some(DeclaredKind::FlipFlop), dests));
    }

    let mut gate_dests: Vec<String> = (0..bits).filter(|&j| !is_set(j)).map(bit).collect();
    gate_dests.push(bit(0));
    gate_dests.push(inv.clone());
    decls.push(WiringDecl::new(
        gate,
        Some(DeclaredKind::Conjunction),
        gate_dests,
    ));
    decls.push(WiringDecl::new(
        inv,
        Some(DeclaredKind::Conjunction),
        [target],
    ));
    decls
}

/// One counter per period, all inverters feeding `&hub -> rx`.
/// Counter `i` uses the prefix `k{i}`.
pub fn counter_bank(periods: &[u64]) -> Network {
    let entries: Vec<String> = (0..periods.len()).map(|i| format!("k{i}_b0")).collect();
    let mut decls = vec![WiringDecl::new(
        "broadcaster",
        None,
        entries.iter().map(String::as_str),
    )];
    for (i, &period) in periods.iter().enumerate() {
        decls.extend(counter_decls(&format!("k{i}"), period, "hub"));
    }
    decls.push(conjunction("hub", &["rx"]));
    build(decls)
}
