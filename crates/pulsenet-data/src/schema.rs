//! Serde data file structs for wiring and run configuration.
//!
//! A wiring file lists nodes with their kind and ordered outputs; names that
//! only ever appear as outputs become sinks when the network is built.

use pulsenet_convergence::ConvergenceConfig;
use pulsenet_core::engine::EngineConfig;
use pulsenet_core::network::{NetworkBuilder, WiringDecl};
use pulsenet_core::node::DeclaredKind;
use pulsenet_stats::StatsConfig;
use serde::{Deserialize, Serialize};

// ===========================================================================
// Wiring
// ===========================================================================

/// Top-level wiring file.
#[derive(Debug, Clone, Deserialize)]
pub struct WiringFile {
    /// Entry broadcast node. Defaults to `broadcaster`.
    #[serde(default)]
    pub entry: Option<String>,
    pub nodes: Vec<NodeData>,
}

/// One node declaration in a wiring file.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub name: String,
    #[serde(default)]
    pub kind: Option<NodeKindData>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Node kind as written in a data file: a sigil (`%`, `&`) or a name
/// (`flip_flop`, `conjunction`, `broadcast`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct NodeKindData(pub DeclaredKind);

impl TryFrom<String> for NodeKindData {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let mut chars = raw.chars();
        if let (Some(sigil), None) = (chars.next(), chars.next()) {
            if let Some(kind) = DeclaredKind::from_sigil(sigil) {
                return Ok(Self(kind));
            }
        }
        match raw.as_str() {
            "broadcast" => Ok(Self(DeclaredKind::Broadcast)),
            "flip_flop" | "flip-flop" => Ok(Self(DeclaredKind::FlipFlop)),
            "conjunction" => Ok(Self(DeclaredKind::Conjunction)),
            _ => Err(format!("unknown node kind '{raw}'")),
        }
    }
}

impl From<NodeData> for WiringDecl {
    fn from(node: NodeData) -> Self {
        WiringDecl::new(node.name, node.kind.map(|k| k.0), node.outputs)
    }
}

impl WiringFile {
    /// A builder holding every declaration, in file order.
    pub fn into_builder(self) -> NetworkBuilder {
        let mut builder = NetworkBuilder::new();
        if let Some(entry) = self.entry {
            builder = builder.entry(entry);
        }
        builder.declare_all(self.nodes.into_iter().map(WiringDecl::from))
    }
}

// ===========================================================================
// Run configuration
// ===========================================================================

/// Settings for every analysis, each section optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub engine: EngineConfig,
    pub stats: StatsConfig,
    pub convergence: ConvergenceConfig,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(raw: &str) -> Result<DeclaredKind, String> {
        NodeKindData::try_from(raw.to_string()).map(|k| k.0)
    }

    #[test]
    fn sigils_and_names() {
        assert_eq!(kind("%"), Ok(DeclaredKind::FlipFlop));
        assert_eq!(kind("&"), Ok(DeclaredKind::Conjunction));
        assert_eq!(kind("flip_flop"), Ok(DeclaredKind::FlipFlop));
        assert_eq!(kind("flip-flop"), Ok(DeclaredKind::FlipFlop));
        assert_eq!(kind("conjunction"), Ok(DeclaredKind::Conjunction));
        assert_eq!(kind("broadcast"), Ok(DeclaredKind::Broadcast));
    }

    #[test]
    fn unknown_kind_rejected() {
        assert!(kind("#").is_err());
        assert!(kind("latch").is_err());
        assert!(kind("").is_err());
    }

    #[test]
    fn json_wiring_file() {
        let file: WiringFile = serde_json::from_str(
            r#"{"nodes": [
                {"name": "broadcaster", "outputs": ["a"]},
                {"name": "a", "kind": "%", "outputs": ["out"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(file.entry, None);
        assert_eq!(file.nodes[1].kind, Some(NodeKindData(DeclaredKind::FlipFlop)));
        let net = file.into_builder().build().unwrap();
        assert_eq!(net.len(), 4);
    }

    #[test]
    fn custom_entry_is_used() {
        let file: WiringFile = serde_json::from_str(
            r#"{"entry": "start", "nodes": [{"name": "start", "outputs": ["x"]}]}"#,
        )
        .unwrap();
        let net = file.into_builder().build().unwrap();
        assert_eq!(net.name(net.entry()), "start");
    }

    #[test]
    fn sim_config_sections_default() {
        let config: SimConfig = toml::from_str(
            r#"
[stats]
trigger_count = 10
"#,
        )
        .unwrap();
        assert_eq!(config.stats.trigger_count, 10);
        assert_eq!(config.stats.history_capacity, StatsConfig::default().history_capacity);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.convergence.target, "rx");
        assert_eq!(config.log_filter, None);
    }
}
