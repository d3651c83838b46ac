//! Per-kind node state machines.
//!
//! Every node kind is one variant of [`NodeState`]. The engine dispatches a
//! delivered pulse through [`NodeState::receive`], an exhaustive match, so
//! the receipt/emission table below is the whole behavioral contract:
//!
//! | Kind        | On receipt                              | Emission                         |
//! |-------------|-----------------------------------------|----------------------------------|
//! | Source      | never receives                          | Low to the entry, once a trigger |
//! | Broadcast   | nothing                                 | the received level               |
//! | FlipFlop    | High ignored; Low toggles `energized`   | High if now on, Low if now off   |
//! | Conjunction | remembers the level for the sender      | Low if all remembered High       |
//! | Sink        | counts the receipt                      | nothing                          |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{Level, NodeId};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The kind a wiring declaration asks for. Sinks are never declared; they
/// are implied for names that only appear as destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    Broadcast,
    FlipFlop,
    Conjunction,
}

impl DeclaredKind {
    /// Map a one-character kind marker (`%` flip-flop, `&` conjunction).
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '%' => Some(DeclaredKind::FlipFlop),
            '&' => Some(DeclaredKind::Conjunction),
            _ => None,
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            DeclaredKind::Broadcast => NodeKind::Broadcast,
            DeclaredKind::FlipFlop => NodeKind::FlipFlop,
            DeclaredKind::Conjunction => NodeKind::Conjunction,
        }
    }
}

/// Discriminant tag for node kinds, used for queries and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Source,
    Broadcast,
    FlipFlop,
    Conjunction,
    Sink,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Source => "source",
            NodeKind::Broadcast => "broadcast",
            NodeKind::FlipFlop => "flip-flop",
            NodeKind::Conjunction => "conjunction",
            NodeKind::Sink => "sink",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Node state
// ---------------------------------------------------------------------------

/// Mutable per-kind state. Dispatches via enum match (no trait objects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Source,
    Broadcast,
    FlipFlop {
        energized: bool,
    },
    Conjunction {
        /// Last level seen from each input. Keys are fixed at wiring time.
        memory: BTreeMap<NodeId, Level>,
    },
    Sink {
        low_received: u64,
        high_received: u64,
    },
}

impl NodeState {
    /// Initial state for a node of the given kind. Conjunction memory starts
    /// with every input remembered as Low.
    pub fn initial(kind: NodeKind, inputs: &[NodeId]) -> Self {
        match kind {
            NodeKind::Source => NodeState::Source,
            NodeKind::Broadcast => NodeState::Broadcast,
            NodeKind::FlipFlop => NodeState::FlipFlop { energized: false },
            NodeKind::Conjunction => NodeState::Conjunction {
                memory: inputs.iter().map(|&input| (input, Level::Low)).collect(),
            },
            NodeKind::Sink => NodeState::Sink {
                low_received: 0,
                high_received: 0,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeState::Source => NodeKind::Source,
            NodeState::Broadcast => NodeKind::Broadcast,
            NodeState::FlipFlop { .. } => NodeKind::FlipFlop,
            NodeState::Conjunction { .. } => NodeKind::Conjunction,
            NodeState::Sink { .. } => NodeKind::Sink,
        }
    }

    /// Apply a received pulse. Returns the level to emit on every output, or
    /// `None` if the node stays silent.
    pub fn receive(&mut self, sender: NodeId, level: Level) -> Option<Level> {
        match self {
            NodeState::Source => None,
            NodeState::Broadcast => Some(level),
            NodeState::FlipFlop { energized } => {
                if level.is_high() {
                    return None;
                }
                *energized = !*energized;
                Some(if *energized { Level::High } else { Level::Low })
            }
            NodeState::Conjunction { memory } => {
                // Record first, then decide.
                debug_assert!(
                    memory.contains_key(&sender),
                    "conjunction received from unwired sender"
                );
                if let Some(slot) = memory.get_mut(&sender) {
                    *slot = level;
                }
                if memory.values().all(|l| l.is_high()) {
                    Some(Level::Low)
                } else {
                    Some(Level::High)
                }
            }
            NodeState::Sink {
                low_received,
                high_received,
            } => {
                match level {
                    Level::Low => *low_received += 1,
                    Level::High => *high_received += 1,
                }
                None
            }
        }
    }

    /// Restore the state to what [`NodeState::initial`] produced, keeping
    /// conjunction keys.
    pub fn reset(&mut self) {
        match self {
            NodeState::Source | NodeState::Broadcast => {}
            NodeState::FlipFlop { energized } => *energized = false,
            NodeState::Conjunction { memory } => {
                for level in memory.values_mut() {
                    *level = Level::Low;
                }
            }
            NodeState::Sink {
                low_received,
                high_received,
            } => {
                *low_received = 0;
                *high_received = 0;
            }
        }
    }

    /// Whether a flip-flop is on. `None` for other kinds.
    pub fn energized(&self) -> Option<bool> {
        match self {
            NodeState::FlipFlop { energized } => Some(*energized),
            _ => None,
        }
    }

    /// A conjunction's remembered level for `input`. `None` for other kinds
    /// or unwired inputs.
    pub fn remembered(&self, input: NodeId) -> Option<Level> {
        match self {
            NodeState::Conjunction { memory } => memory.get(&input).copied(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A named node with its wiring and state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub state: NodeState,
    /// Output edges in wiring order. May repeat a destination.
    pub outputs: Vec<NodeId>,
    /// Distinct nodes that wire into this one, in first-seen order.
    pub inputs: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.state.kind()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
