//! Bounded pulse statistics for pulsenet networks.
//!
//! Runs a fixed number of triggers and aggregates delivered pulses by level
//! across the whole run. State persists between triggers, so the totals
//! depend on how many triggers came before.
//!
//! # Usage
//!
//! ```ignore
//! let product = count_pulses(&mut network, 1000)?;
//!
//! // Or keep the breakdown:
//! let stats = collect_stats(&mut network, &StatsConfig::default())?;
//! let highs_from_a = stats.emitted_by(a).high;
//! ```

use std::collections::HashMap;

use pulsenet_core::engine::{Engine, EngineError};
use pulsenet_core::id::{Level, NodeId};
use pulsenet_core::network::Network;
use pulsenet_core::trace::PulseTrace;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a bounded statistics run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Number of triggers to run.
    pub trigger_count: u64,
    /// Maximum number of per-trigger snapshots to retain.
    pub history_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            trigger_count: 1000,
            history_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// Level counts
// ---------------------------------------------------------------------------

/// Pulse counts split by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub low: u64,
    pub high: u64,
}

impl LevelCounts {
    pub fn add(&mut self, level: Level) {
        match level {
            Level::Low => self.low += 1,
            Level::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.high
    }
}

/// Counts for a single trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerCounts {
    pub trigger: u64,
    pub counts: LevelCounts,
}

// ---------------------------------------------------------------------------
// RingBuffer: per-trigger history
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer of per-trigger counts.
///
/// When full, the oldest entry is overwritten. Iterates oldest-to-newest.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<Option<TriggerCounts>>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a new ring buffer. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![None; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: TriggerCounts) {
        self.data[self.head] = Some(value);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The most recently pushed entry, if any.
    pub fn latest(&self) -> Option<TriggerCounts> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.capacity() - 1) % self.capacity();
        self.data[idx]
    }

    /// Iterate entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = TriggerCounts> + '_ {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        (0..self.len).filter_map(move |offset| self.data[(start + offset) % self.capacity()])
    }
}

// ---------------------------------------------------------------------------
// PulseStats
// ---------------------------------------------------------------------------

/// Running totals over every trace it observes.
#[derive(Debug, Clone)]
pub struct PulseStats {
    totals: LevelCounts,
    triggers: u64,
    /// Emissions per sending node, including the virtual source.
    emitted: HashMap<NodeId, LevelCounts>,
    history: RingBuffer,
}

impl PulseStats {
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            totals: LevelCounts::default(),
            triggers: 0,
            emitted: HashMap::new(),
            history: RingBuffer::new(config.history_capacity),
        }
    }

    /// Fold one trigger's deliveries into the totals.
    pub fn observe(&mut self, trace: &PulseTrace) {
        let mut counts = LevelCounts::default();
        for pulse in trace.pulses() {
            counts.add(pulse.level);
            self.emitted.entry(pulse.sender).or_default().add(pulse.level);
        }
        self.totals.low += counts.low;
        self.totals.high += counts.high;
        self.triggers += 1;
        self.history.push(TriggerCounts {
            trigger: trace.trigger(),
            counts,
        });
    }

    pub fn low(&self) -> u64 {
        self.totals.low
    }

    pub fn high(&self) -> u64 {
        self.totals.high
    }

    pub fn totals(&self) -> LevelCounts {
        self.totals
    }

    /// Number of traces observed.
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    /// Total Low deliveries times total High deliveries.
    pub fn product(&self) -> u64 {
        self.totals.low * self.totals.high
    }

    /// Pulses emitted by `node` across all observed triggers.
    pub fn emitted_by(&self, node: NodeId) -> LevelCounts {
        self.emitted.get(&node).copied().unwrap_or_default()
    }

    pub fn history(&self) -> &RingBuffer {
        &self.history
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Run `config.trigger_count` triggers with `engine` and collect statistics.
pub fn collect_stats_with(
    engine: &Engine,
    network: &mut Network,
    config: &StatsConfig,
) -> Result<PulseStats, EngineError> {
    let mut stats = PulseStats::new(config);
    engine.run_triggers(network, config.trigger_count, |trace| stats.observe(trace))?;
    tracing::debug!(
        triggers = stats.triggers(),
        low = stats.low(),
        high = stats.high(),
        "pulse statistics collected"
    );
    Ok(stats)
}

/// Run `config.trigger_count` triggers with default engine limits.
pub fn collect_stats(
    network: &mut Network,
    config: &StatsConfig,
) -> Result<PulseStats, EngineError> {
    collect_stats_with(&Engine::default(), network, config)
}

/// Run exactly `trigger_count` triggers and return the product of the total
/// Low and total High deliveries.
pub fn count_pulses(network: &mut Network, trigger_count: u64) -> Result<u64, EngineError> {
    let config = StatsConfig {
        trigger_count,
        ..StatsConfig::default()
    };
    collect_stats(network, &config).map(|stats| stats.product())
}

// ===========================================================================
// Tests
// ===========================================================================
