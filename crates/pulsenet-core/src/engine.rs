//! The event engine: drives one trigger to quiescence.
//!
//! # Delivery loop
//!
//! Each [`Engine::run_trigger`] call:
//! 1. **Inject** -- enqueue one Low pulse from the virtual source to the entry.
//! 2. **Dequeue** -- pop the oldest pending pulse (strict FIFO).
//! 3. **Deliver** -- run the receiver's behavior rule; enqueue one pulse per
//!    output edge if it emits.
//! 4. **Record** -- append the delivered pulse to the trace.
//!
//! Steps 2-4 repeat until the queue is empty. The queue lives on the stack of
//! one call, so nothing leaks between triggers or between networks.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::pulse::Pulse;
use crate::trace::PulseTrace;

// ---------------------------------------------------------------------------
// Configuration & errors
// ---------------------------------------------------------------------------

/// Engine limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum pulses delivered in a single trigger. A network that keeps
    /// re-triggering itself trips this instead of looping forever.
    pub delivery_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delivery_budget: 1_000_000,
        }
    }
}

/// Errors that can occur while draining a trigger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("trigger {trigger} exceeded the delivery budget of {budget} pulses")]
    DeliveryBudgetExceeded { trigger: u64, budget: usize },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless driver for triggers. All mutable state lives in the [`Network`].
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one full trigger and return its trace.
    ///
    /// On [`EngineError::DeliveryBudgetExceeded`] the network keeps the state
    /// it had when the budget ran out and the trigger counter is not advanced.
    ///
    /// # Panics
    ///
    /// Panics if a pulse is addressed to a node the network does not own.
    /// The builder resolves every destination, so this is a wiring defect.
    pub fn run_trigger(&self, network: &mut Network) -> Result<PulseTrace, EngineError> {
        let trigger = network.triggers() + 1;
        let budget = self.config.delivery_budget.max(1);

        let mut queue: VecDeque<Pulse> = VecDeque::new();
        queue.push_back(Pulse::low(network.source(), network.entry()));
        let mut trace = PulseTrace::new(trigger);

        while let Some(pulse) = queue.pop_front() {
            if trace.len() >= budget {
                tracing::warn!(
                    trigger,
                    budget,
                    pending = queue.len() + 1,
                    "delivery budget exceeded"
                );
                return Err(EngineError::DeliveryBudgetExceeded { trigger, budget });
            }

            let Some(node) = network.node_mut(pulse.receiver) else {
                panic!("pulse addressed to unregistered node {:?}", pulse.receiver);
            };
            if let Some(level) = node.state.receive(pulse.sender, pulse.level) {
                queue.extend(
                    node.outputs
                        .iter()
                        .map(|&out| Pulse::new(pulse.receiver, level, out)),
                );
            }
            trace.record(pulse);
        }

        network.complete_trigger();
        tracing::trace!(
            trigger,
            delivered = trace.len(),
            low = trace.low_count(),
            high = trace.high_count(),
            "trigger drained"
        );
        Ok(trace)
    }

    /// Run `count` triggers in sequence, handing each trace to `observe`.
    /// Stops at the first error.
    pub fn run_triggers<F>(
        &self,
        network: &mut Network,
        count: u64,
        mut observe: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(&PulseTrace),
    {
        for _ in 0..count {
            let trace = self.run_trigger(network)?;
            observe(&trace);
        }
        Ok(())
    }
}

/// Run one trigger with the default engine limits.
pub fn run_trigger(network: &mut Network) -> Result<PulseTrace, EngineError> {
    Engine::default().run_trigger(network)
}

// ===========================================================================
// Tests
// ===========================================================================
