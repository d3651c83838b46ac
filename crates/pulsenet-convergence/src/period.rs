//! First-occurrence tracking for High pulses into a single node.

use std::collections::HashMap;

use pulsenet_core::id::NodeId;
use pulsenet_core::trace::PulseTrace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Occurrence {
    first: Option<u64>,
    next: Option<u64>,
}

/// Watches the High pulses each input delivers to `predecessor`.
///
/// Several Highs from the same input within one trigger count once.
#[derive(Debug, Clone)]
pub struct PeriodTracker {
    predecessor: NodeId,
    inputs: Vec<NodeId>,
    seen: HashMap<NodeId, Occurrence>,
}

impl PeriodTracker {
    pub fn new(predecessor: NodeId, inputs: impl IntoIterator<Item = NodeId>) -> Self {
        let inputs: Vec<NodeId> = inputs.into_iter().collect();
        let seen = inputs
            .iter()
            .map(|&id| (id, Occurrence::default()))
            .collect();
        Self {
            predecessor,
            inputs,
            seen,
        }
    }

    /// Record every High from a watched input to the predecessor.
    pub fn observe(&mut self, trace: &PulseTrace) {
        let trigger = trace.trigger();
        for pulse in trace.received_by(self.predecessor) {
            if !pulse.level.is_high() {
                continue;
            }
            let Some(occ) = self.seen.get_mut(&pulse.sender) else {
                continue;
            };
            match occ.first {
                None => occ.first = Some(trigger),
                Some(first) if first != trigger && occ.next.is_none() => {
                    occ.next = Some(trigger);
                }
                Some(_) => {}
            }
        }
    }

    pub fn first_high(&self, input: NodeId) -> Option<u64> {
        self.seen.get(&input).and_then(|occ| occ.first)
    }

    /// Trigger of the second distinct High from `input`.
    pub fn next_high(&self, input: NodeId) -> Option<u64> {
        self.seen.get(&input).and_then(|occ| occ.next)
    }

    pub fn all_found(&self) -> bool {
        self.seen.values().all(|occ| occ.first.is_some())
    }

    /// Inputs that have not yet delivered a High, in wiring order.
    pub fn pending(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inputs
            .iter()
            .copied()
            .filter(|id| self.first_high(*id).is_none())
    }

    /// Inputs without a second High, in wiring order.
    pub fn unconfirmed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inputs
            .iter()
            .copied()
            .filter(|id| self.next_high(*id).is_none())
    }

    /// Last trigger needed to see every input fire a second time, assuming
    /// each repeats at twice its first index.
    pub fn verification_horizon(&self) -> u64 {
        self.seen
            .values()
            .filter_map(|occ| occ.first)
            .map(|first| first.saturating_mul(2))
            .max()
            .unwrap_or(0)
    }

    /// Inputs whose second High did not land at twice the first index,
    /// paired with that first index.
    pub fn mismatched(&self) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.inputs.iter().filter_map(|&id| {
            let occ = self.seen.get(&id)?;
            let first = occ.first?;
            (occ.next != first.checked_mul(2)).then_some((id, first))
        })
    }

    /// lcm of the first-occurrence indices, once all are known.
    /// `None` if some input is still pending or the result overflows.
    pub fn combined(&self) -> Option<u64> {
        if !self.all_found() {
            return None;
        }
        lcm_of(self.seen.values().filter_map(|occ| occ.first))
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple, or `None` on overflow.
pub fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// lcm over every value; 1 for an empty input.
pub fn lcm_of(values: impl IntoIterator<Item = u64>) -> Option<u64> {
    values.into_iter().try_fold(1, lcm)
}
