//! Convergence analysis for pulsenet networks.
//!
//! Finds the trigger at which a target sink's sole conjunction predecessor
//! would first emit Low, without simulating that far. Each input of the
//! predecessor is watched for its first High delivery; the answer is the
//! least common multiple of those first-occurrence indices.
//!
//! # Periodicity assumption
//!
//! Combining by lcm is only sound when every input fires High with a period
//! equal to its first-occurrence index and no phase offset. That is a
//! property of how the input network was designed, not something the engine
//! can prove. With [`ConvergenceConfig::verify_period`] set, the analysis
//! keeps running until it has seen each input fire again at exactly twice
//! its first index, and fails with [`ConvergenceError::PeriodMismatch`]
//! otherwise.

pub mod period;

use pulsenet_core::engine::{Engine, EngineError};
use pulsenet_core::id::NodeId;
use pulsenet_core::network::Network;
use pulsenet_core::node::NodeKind;
use serde::{Deserialize, Serialize};

pub use period::{PeriodTracker, lcm, lcm_of};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a convergence search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Name of the sink whose predecessor is analysed.
    pub target: String,
    /// Give up after this many triggers.
    pub max_triggers: u64,
    /// Require each input to fire again at twice its first index.
    pub verify_period: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            target: "rx".to_string(),
            max_triggers: 100_000,
            verify_period: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The convergence precondition could not be established.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvergenceError {
    #[error("target node '{name}' does not exist")]
    TargetNotFound { name: String },
    #[error("target '{name}' is a {kind}, expected sink")]
    TargetNotSink { name: String, kind: NodeKind },
    #[error("target '{name}' has {count} predecessors, expected exactly one")]
    PredecessorCount { name: String, count: usize },
    #[error("predecessor '{name}' is a {kind}, expected conjunction")]
    PredecessorNotConjunction { name: String, kind: NodeKind },
    #[error("predecessor '{name}' has no inputs")]
    NoInputs { name: String },
    #[error("no High reached '{predecessor}' from {pending:?} within {bound} triggers")]
    NoHighWithinBound {
        predecessor: String,
        pending: Vec<String>,
        bound: u64,
    },
    #[error("periods of {pending:?} could not be confirmed within {bound} triggers")]
    PeriodUnverified { pending: Vec<String>, bound: u64 },
    #[error(
        "input '{input}' first fired High at trigger {first} but not next at trigger {expected}"
    )]
    PeriodMismatch {
        input: String,
        first: u64,
        expected: u64,
    },
    #[error("least common multiple overflows u64")]
    Overflow,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// First-occurrence data for one predecessor input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPeriod {
    pub name: String,
    pub first_high: u64,
    /// Trigger of the next High. Always `None` when verification is off.
    pub confirmed_at: Option<u64>,
}

/// Outcome of a convergence search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceReport {
    pub target: String,
    pub predecessor: String,
    pub inputs: Vec<InputPeriod>,
    /// Triggers actually simulated.
    pub triggers_run: u64,
    /// lcm of every input's first High index.
    pub convergence: u64,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Drives a single shared trigger sequence and watches the predecessor.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceAnalysis {
    config: ConvergenceConfig,
    engine: Engine,
}

impl ConvergenceAnalysis {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self {
            config,
            engine: Engine::default(),
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Locate the target's sole conjunction predecessor and its inputs.
    pub fn resolve(&self, network: &Network) -> Result<(NodeId, Vec<NodeId>), ConvergenceError> {
        let name = &self.config.target;
        let target = network
            .node_id(name)
            .ok_or_else(|| ConvergenceError::TargetNotFound { name: name.clone() })?;
        match network.kind(target) {
            Some(NodeKind::Sink) => {}
            Some(kind) => {
                return Err(ConvergenceError::TargetNotSink {
                    name: name.clone(),
                    kind,
                });
            }
            None => return Err(ConvergenceError::TargetNotFound { name: name.clone() }),
        }

        let predecessor = match network.inputs(target) {
            [only] => *only,
            others => {
                return Err(ConvergenceError::PredecessorCount {
                    name: name.clone(),
                    count: others.len(),
                });
            }
        };
        match network.kind(predecessor) {
            Some(NodeKind::Conjunction) => {}
            Some(kind) => {
                return Err(ConvergenceError::PredecessorNotConjunction {
                    name: network.name(predecessor).to_string(),
                    kind,
                });
            }
            None => unreachable!("inputs only hold ids minted by the builder"),
        }

        let inputs = network.inputs(predecessor).to_vec();
        if inputs.is_empty() {
            return Err(ConvergenceError::NoInputs {
                name: network.name(predecessor).to_string(),
            });
        }
        Ok((predecessor, inputs))
    }

    /// Reset the network, then run triggers from 1 until every input of the
    /// predecessor has delivered a High (and, with verification, delivered
    /// the next one at twice that index).
    pub fn run(&self, network: &mut Network) -> Result<ConvergenceReport, ConvergenceError> {
        let (predecessor, inputs) = self.resolve(network)?;
        let bound = self.config.max_triggers;

        network.reset();
        let mut tracker = PeriodTracker::new(predecessor, inputs.iter().copied());
        let mut triggers_run = 0;

        while !tracker.all_found() {
            if triggers_run >= bound {
                return Err(ConvergenceError::NoHighWithinBound {
                    predecessor: network.name(predecessor).to_string(),
                    pending: names(network, tracker.pending()),
                    bound,
                });
            }
            let trace = self.engine.run_trigger(network)?;
            tracker.observe(&trace);
            triggers_run += 1;
        }

        if self.config.verify_period {
            let horizon = tracker.verification_horizon();
            while triggers_run < horizon {
                if triggers_run >= bound {
                    return Err(ConvergenceError::PeriodUnverified {
                        pending: names(network, tracker.unconfirmed()),
                        bound,
                    });
                }
                let trace = self.engine.run_trigger(network)?;
                tracker.observe(&trace);
                triggers_run += 1;
            }
            if let Some((input, first)) = tracker.mismatched().next() {
                return Err(ConvergenceError::PeriodMismatch {
                    input: network.name(input).to_string(),
                    first,
                    expected: first * 2,
                });
            }
        }

        let firsts: Vec<u64> = inputs
            .iter()
            .filter_map(|&input| tracker.first_high(input))
            .collect();
        let convergence = lcm_of(firsts).ok_or(ConvergenceError::Overflow)?;

        let report = ConvergenceReport {
            target: self.config.target.clone(),
            predecessor: network.name(predecessor).to_string(),
            inputs: inputs
                .iter()
                .map(|&input| InputPeriod {
                    name: network.name(input).to_string(),
                    first_high: tracker.first_high(input).unwrap_or_default(),
                    confirmed_at: self
                        .config
                        .verify_period
                        .then(|| tracker.next_high(input))
                        .flatten(),
                })
                .collect(),
            triggers_run,
            convergence,
        };
        tracing::debug!(
            target_node = %report.target,
            predecessor = %report.predecessor,
            triggers_run,
            convergence,
            "convergence resolved"
        );
        Ok(report)
    }
}

fn names(network: &Network, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
    ids.map(|id| network.name(id).to_string()).collect()
}

/// Convergence trigger for the default target (`rx`) with verification on.
///
/// Inputs whose Highs carry a phase offset fail with
/// [`ConvergenceError::PeriodMismatch`]; run [`ConvergenceAnalysis`] with
/// `verify_period: false` to take their first-High lcm anyway.
pub fn first_convergence(network: &mut Network) -> Result<u64, ConvergenceError> {
    ConvergenceAnalysis::default()
        .run(network)
        .map(|report| report.convergence)
}

// ===========================================================================
// Tests
// ===========================================================================
