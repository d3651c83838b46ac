use serde::{Deserialize, Serialize};

use crate::id::{Level, NodeId};

/// A single pulse travelling along one wiring edge. Immutable value record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pulse {
    pub sender: NodeId,
    pub level: Level,
    pub receiver: NodeId,
}

impl Pulse {
    pub fn new(sender: NodeId, level: Level, receiver: NodeId) -> Self {
        Self {
            sender,
            level,
            receiver,
        }
    }

    pub fn low(sender: NodeId, receiver: NodeId) -> Self {
        Self::new(sender, Level::Low, receiver)
    }

    pub fn high(sender: NodeId, receiver: NodeId) -> Self {
        Self::new(sender, Level::High, receiver)
    }
}
