//! Pulsenet Core -- a pulse-propagation network simulator.
//!
//! A network is a directed graph of typed logic nodes (broadcast, flip-flop,
//! conjunction, sink) that exchange Low/High pulses. Pulses are delivered in
//! strict FIFO order, and per-node state persists from one trigger to the
//! next.
//!
//! # Trigger Cycle
//!
//! Each call to [`engine::Engine::run_trigger`]:
//!
//! 1. Injects a Low pulse from the virtual source to the entry broadcast.
//! 2. Delivers pending pulses oldest-first through the node rules.
//! 3. Records every delivery in a [`trace::PulseTrace`].
//! 4. Returns once the queue is empty, or errors if the delivery budget is
//!    exhausted.
//!
//! # Building a Network
//!
//! ```rust,ignore
//! use pulsenet_core::network::{Network, WiringDecl};
//! use pulsenet_core::node::DeclaredKind;
//!
//! let mut network = Network::build(vec![
//!     WiringDecl::new("broadcaster", None, ["a"]),
//!     WiringDecl::new("a", Some(DeclaredKind::FlipFlop), ["out"]),
//! ])?;
//! let trace = pulsenet_core::engine::run_trigger(&mut network)?;
//! ```
//!
//! # Key Types
//!
//! - [`network::Network`] -- nodes by name, wiring, and trigger counter.
//! - [`network::NetworkBuilder`] -- resolves wiring declarations.
//! - [`node::NodeState`] -- the per-kind state machine.
//! - [`engine::Engine`] -- the FIFO delivery loop.
//! - [`trace::PulseTrace`] -- the deliveries of one trigger.
//! - [`sim::StateHash`] -- deterministic hashing of network state.

pub mod engine;
pub mod id;
pub mod network;
pub mod node;
pub mod pulse;
pub mod sim;
pub mod trace;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
