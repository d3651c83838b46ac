//! The record of one trigger: every delivered pulse, in delivery order.

use crate::id::{Level, NodeId};
use crate::pulse::Pulse;

/// A pulse together with its position in the delivery order of its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveredPulse {
    /// 0-based delivery index within the trigger.
    pub index: usize,
    pub pulse: Pulse,
}

/// Every pulse delivered during one trigger, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseTrace {
    trigger: u64,
    deliveries: Vec<DeliveredPulse>,
}

impl PulseTrace {
    /// An empty trace for the given 1-based trigger index.
    pub fn new(trigger: u64) -> Self {
        Self {
            trigger,
            deliveries: Vec::new(),
        }
    }

    /// Append a delivered pulse. The delivery index is assigned here.
    pub fn record(&mut self, pulse: Pulse) {
        let index = self.deliveries.len();
        self.deliveries.push(DeliveredPulse { index, pulse });
    }

    /// 1-based index of the trigger this trace belongs to.
    pub fn trigger(&self) -> u64 {
        self.trigger
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeliveredPulse> {
        self.deliveries.iter()
    }

    /// The delivered pulses without their indices.
    pub fn pulses(&self) -> impl Iterator<Item = &Pulse> {
        self.deliveries.iter().map(|d| &d.pulse)
    }

    pub fn count(&self, level: Level) -> u64 {
        self.pulses().filter(|p| p.level == level).count() as u64
    }

    pub fn low_count(&self) -> u64 {
        self.count(Level::Low)
    }

    pub fn high_count(&self) -> u64 {
        self.count(Level::High)
    }

    /// Pulses delivered to `node`, in order.
    pub fn received_by(&self, node: NodeId) -> impl Iterator<Item = &Pulse> {
        self.pulses().filter(move |p| p.receiver == node)
    }

    /// Pulses sent by `node`, in order.
    pub fn sent_by(&self, node: NodeId) -> impl Iterator<Item = &Pulse> {
        self.pulses().filter(move |p| p.sender == node)
    }
}

impl<'a> IntoIterator for &'a PulseTrace {
    type Item = &'a DeliveredPulse;
    type IntoIter = std::slice::Iter<'a, DeliveredPulse>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
