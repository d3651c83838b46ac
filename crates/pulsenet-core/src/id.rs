use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node in a pulse network.
    pub struct NodeId;
}

/// Name of the virtual node that injects the Low pulse at the start of every
/// trigger. Reserved: wiring may not declare or target it.
pub const SOURCE_NAME: &str = "button";

/// Conventional name of the broadcast node that receives the trigger pulse.
pub const DEFAULT_ENTRY_NAME: &str = "broadcaster";

/// A pulse level. Only two discrete levels exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}
