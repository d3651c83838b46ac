use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::id::{DEFAULT_ENTRY_NAME, Level, NodeId, SOURCE_NAME};
use crate::node::{DeclaredKind, Node, NodeKind, NodeState};
use crate::sim::StateHash;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Malformed wiring: the declarations cannot describe a valid network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WiringError {
    #[error("node declared with an empty name")]
    EmptyName,
    #[error("'{name}' is reserved for the trigger source")]
    ReservedName { name: String },
    #[error("node '{name}' declared as {first} and again as {second}")]
    KindConflict {
        name: String,
        first: NodeKind,
        second: NodeKind,
    },
    #[error("node '{name}' declared more than once")]
    DuplicateDeclaration { name: String },
    #[error("entry node '{name}' is not declared")]
    MissingEntry { name: String },
    #[error("entry node '{name}' is a {kind}, expected broadcast")]
    EntryNotBroadcast { name: String, kind: NodeKind },
}

// ---------------------------------------------------------------------------
// Wiring declarations
// ---------------------------------------------------------------------------

/// One source line of wiring: a node, its optional kind, and its ordered
/// destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringDecl {
    pub name: String,
    #[serde(default)]
    pub kind: Option<DeclaredKind>,
    #[serde(default)]
    pub destinations: Vec<String>,
}

impl WiringDecl {
    pub fn new<I, S>(name: impl Into<String>, kind: Option<DeclaredKind>, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            destinations: destinations.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Name-level view of a node while declarations are being resolved.
#[derive(Debug)]
struct PendingNode {
    name: String,
    /// `None` until the node is declared as a source; undeclared names
    /// become sinks.
    kind: Option<NodeKind>,
    outputs: Vec<usize>,
}

/// Collects wiring declarations and resolves them into a [`Network`].
///
/// Nodes are registered in first-appearance order (as a declared source or
/// as a destination), so two builds from the same declarations produce the
/// same ids and the same iteration order.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    entry: String,
    decls: Vec<WiringDecl>,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            entry: DEFAULT_ENTRY_NAME.to_string(),
            decls: Vec::new(),
        }
    }

    /// Name the broadcast node that receives the trigger pulse.
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = name.into();
        self
    }

    pub fn declare(mut self, decl: WiringDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn declare_all(mut self, decls: impl IntoIterator<Item = WiringDecl>) -> Self {
        self.decls.extend(decls);
        self
    }

    /// Resolve every declaration and destination into a wired network.
    pub fn build(self) -> Result<Network, WiringError> {
        let mut pending: Vec<PendingNode> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for decl in &self.decls {
            check_name(&decl.name)?;
            let kind = match decl.kind {
                Some(kind) => kind.node_kind(),
                None if decl.name == self.entry => NodeKind::Broadcast,
                None => {
                    tracing::warn!(
                        node = %decl.name,
                        "untagged source declaration; treating it as a sink"
                    );
                    NodeKind::Sink
                }
            };

            let slot = intern(&mut pending, &mut index, &decl.name);
            if let Some(first) = pending[slot].kind {
                return Err(if first == kind {
                    WiringError::DuplicateDeclaration {
                        name: decl.name.clone(),
                    }
                } else {
                    WiringError::KindConflict {
                        name: decl.name.clone(),
                        first,
                        second: kind,
                    }
                });
            }
            pending[slot].kind = Some(kind);

            for dest in &decl.destinations {
                check_name(dest)?;
                let target = intern(&mut pending, &mut index, dest);
                pending[slot].outputs.push(target);
            }
        }

        let entry_slot = *index
            .get(&self.entry)
            .ok_or_else(|| WiringError::MissingEntry {
                name: self.entry.clone(),
            })?;
        match pending[entry_slot].kind {
            Some(NodeKind::Broadcast) => {}
            Some(kind) => {
                return Err(WiringError::EntryNotBroadcast {
                    name: self.entry.clone(),
                    kind,
                });
            }
            None => {
                return Err(WiringError::MissingEntry {
                    name: self.entry.clone(),
                });
            }
        }

        Ok(Network::assemble(pending, entry_slot))
    }
}

fn check_name(name: &str) -> Result<(), WiringError> {
    if name.is_empty() {
        return Err(WiringError::EmptyName);
    }
    if name == SOURCE_NAME {
        return Err(WiringError::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn intern(pending: &mut Vec<PendingNode>, index: &mut HashMap<String, usize>, name: &str) -> usize {
    if let Some(&slot) = index.get(name) {
        return slot;
    }
    let slot = pending.len();
    pending.push(PendingNode {
        name: name.to_string(),
        kind: None,
        outputs: Vec::new(),
    });
    index.insert(name.to_string(), slot);
    slot
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A fully wired pulse network: every destination resolves to a node, and
/// per-node state persists across triggers.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: SlotMap<NodeId, Node>,
    by_name: HashMap<String, NodeId>,
    source: NodeId,
    entry: NodeId,
    /// Number of triggers drained to completion.
    triggers: u64,
}

impl Network {
    /// Build with the conventional entry name.
    pub fn build(decls: impl IntoIterator<Item = WiringDecl>) -> Result<Self, WiringError> {
        NetworkBuilder::new().declare_all(decls).build()
    }

    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::new()
    }

    fn assemble(pending: Vec<PendingNode>, entry_slot: usize) -> Self {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let mut by_name = HashMap::with_capacity(pending.len() + 1);

        let source = nodes.insert(Node {
            name: SOURCE_NAME.to_string(),
            state: NodeState::Source,
            outputs: Vec::new(),
            inputs: Vec::new(),
        });
        by_name.insert(SOURCE_NAME.to_string(), source);

        let ids: Vec<NodeId> = pending
            .iter()
            .map(|p| {
                let id = nodes.insert(Node {
                    name: p.name.clone(),
                    state: NodeState::Sink {
                        low_received: 0,
                        high_received: 0,
                    },
                    outputs: Vec::new(),
                    inputs: Vec::new(),
                });
                by_name.insert(p.name.clone(), id);
                id
            })
            .collect();

        let entry = ids[entry_slot];
        nodes[source].outputs.push(entry);
        nodes[entry].inputs.push(source);

        for (p, &from) in pending.iter().zip(&ids) {
            for &target in &p.outputs {
                let to = ids[target];
                nodes[from].outputs.push(to);
                if !nodes[to].inputs.contains(&from) {
                    nodes[to].inputs.push(from);
                }
            }
        }

        for (p, &id) in pending.iter().zip(&ids) {
            let kind = p.kind.unwrap_or(NodeKind::Sink);
            let node = &mut nodes[id];
            node.state = NodeState::initial(kind, &node.inputs);
        }

        let network = Self {
            nodes,
            by_name,
            source,
            entry,
            triggers: 0,
        };
        tracing::debug!(
            nodes = network.len(),
            entry = %network.name(entry),
            "network built"
        );
        network
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The virtual node that emits the trigger pulse.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The broadcast node that receives the trigger pulse.
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Number of nodes, including the virtual source.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_id(name).and_then(|id| self.nodes.get(id))
    }

    /// Name of a node, or an empty string for ids minted elsewhere.
    pub fn name(&self, id: NodeId) -> &str {
        self.nodes.get(id).map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(Node::kind)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.inputs.as_slice()).unwrap_or(&[])
    }

    pub fn outputs(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.outputs.as_slice()).unwrap_or(&[])
    }

    /// Number of triggers drained so far.
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    /// `(low, high)` receipt counts for a sink.
    pub fn sink_receipts(&self, name: &str) -> Option<(u64, u64)> {
        match self.node_by_name(name)?.state {
            NodeState::Sink {
                low_received,
                high_received,
            } => Some((low_received, high_received)),
            _ => None,
        }
    }

    /// A flip-flop's current flag, looked up by name.
    pub fn energized(&self, name: &str) -> Option<bool> {
        self.node_by_name(name)?.state.energized()
    }

    /// A conjunction's remembered level for one of its inputs.
    pub fn remembered(&self, conjunction: &str, input: &str) -> Option<Level> {
        let input = self.node_id(input)?;
        self.node_by_name(conjunction)?.state.remembered(input)
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Restore every node to its initial state and zero the trigger counter.
    /// Wiring is untouched.
    pub fn reset(&mut self) {
        for node in self.nodes.values_mut() {
            node.state.reset();
        }
        self.triggers = 0;
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn complete_trigger(&mut self) {
        self.triggers += 1;
    }

    /// Hash of names, kinds, wiring, and all mutable state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.triggers);
        for node in self.nodes.values() {
            h.write_str(&node.name);
            h.write_u8(node.kind() as u8);
            h.write_u64(node.outputs.len() as u64);
            for &out in &node.outputs {
                h.write_str(self.name(out));
            }
            match &node.state {
                NodeState::Source | NodeState::Broadcast => {}
                NodeState::FlipFlop { energized } => h.write_u8(*energized as u8),
                NodeState::Conjunction { memory } => {
                    for &input in &node.inputs {
                        h.write_str(self.name(input));
                        h.write_u8(memory.get(&input).copied().unwrap_or(Level::Low) as u8);
                    }
                }
                NodeState::Sink {
                    low_received,
                    high_received,
                } => {
                    h.write_u64(*low_received);
                    h.write_u64(*high_received);
                }
            }
        }
        h.finish()
    }

    // -----------------------------------------------------------------------
    // Partitioning
    // -----------------------------------------------------------------------

    /// Weakly-connected components, ignoring edge direction. Components are
    /// ordered by their earliest-registered node; members keep registration
    /// order.
    pub fn weak_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: HashMap<NodeId, usize> = HashMap::with_capacity(self.nodes.len());
        let mut components: Vec<Vec<NodeId>> = Vec::new();

        for start in self.nodes.keys() {
            if seen.contains_key(&start) {
                continue;
            }
            let component = components.len();
            seen.insert(start, component);
            let mut queue = VecDeque::from([start]);
            while let Some(id) = queue.pop_front() {
                let node = &self.nodes[id];
                for &next in node.outputs.iter().chain(&node.inputs) {
                    if !seen.contains_key(&next) {
                        seen.insert(next, component);
                        queue.push_back(next);
                    }
                }
            }
            components.push(Vec::new());
        }

        for id in self.nodes.keys() {
            components[seen[&id]].push(id);
        }
        components
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DeclaredKind::{Broadcast, Conjunction, FlipFlop};

    fn decl(name: &str, kind: Option<DeclaredKind>, dests: &[&str]) -> WiringDecl {
        WiringDecl::new(name, kind, dests.iter().copied())
    }

    fn textbook() -> Vec<WiringDecl> {
        vec![
            decl("broadcaster", None, &["a"]),
            decl("a", Some(FlipFlop), &["inv", "con"]),
            decl("inv", Some(Conjunction), &["b"]),
            decl("b", Some(FlipFlop), &["con"]),
            decl("con", Some(Conjunction), &["output"]),
        ]
    }

    #[test]
    fn build_registers_every_referenced_node() {
        let net = Network::build(textbook()).unwrap();
        // 6 named nodes plus the virtual source.
        assert_eq!(net.len(), 7);
        for name in ["broadcaster", "a", "inv", "b", "con", "output", SOURCE_NAME] {
            assert!(net.node_id(name).is_some(), "missing {name}");
        }
        assert_eq!(net.node_by_name("output").unwrap().kind(), NodeKind::Sink);
        assert_eq!(net.node_by_name("broadcaster").unwrap().kind(), NodeKind::Broadcast);
    }

    #[test]
    fn source_feeds_entry() {
        let net = Network::build(textbook()).unwrap();
        assert_eq!(net.outputs(net.source()), &[net.entry()]);
        assert_eq!(net.inputs(net.entry()), &[net.source()]);
        assert_eq!(net.kind(net.source()), Some(NodeKind::Source));
    }

    #[test]
    fn outputs_keep_wiring_order() {
        let net = Network::build(textbook()).unwrap();
        let a = net.node_id("a").unwrap();
        let names: Vec<&str> = net.outputs(a).iter().map(|&id| net.name(id)).collect();
        assert_eq!(names, vec!["inv", "con"]);
    }

    #[test]
    fn conjunction_memory_sized_by_inputs() {
        let net = Network::build(textbook()).unwrap();
        let con = net.node_by_name("con").unwrap();
        match &con.state {
            NodeState::Conjunction { memory } => {
                assert_eq!(memory.len(), 2);
                assert!(memory.values().all(|&l| l == Level::Low));
            }
            other => panic!("expected conjunction, got {other:?}"),
        }
        assert_eq!(net.remembered("con", "a"), Some(Level::Low));
        assert_eq!(net.remembered("con", "b"), Some(Level::Low));
        assert_eq!(net.remembered("con", "inv"), None);
    }

    #[test]
    fn duplicate_destination_gives_two_edges_one_input() {
        let net = Network::build(vec![
            decl("broadcaster", None, &["c", "c"]),
            decl("c", Some(Conjunction), &[]),
        ])
        .unwrap();
        let b = net.entry();
        let c = net.node_id("c").unwrap();
        assert_eq!(net.outputs(b).len(), 2);
        assert_eq!(net.inputs(c), &[b]);
    }

    #[test]
    fn contradictory_kind_is_rejected() {
        let err = Network::build(vec![
            decl("broadcaster", None, &["x"]),
            decl("x", Some(FlipFlop), &[]),
            decl("x", Some(Conjunction), &[]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            WiringError::KindConflict {
                name: "x".into(),
                first: NodeKind::FlipFlop,
                second: NodeKind::Conjunction,
            }
        );
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let err = Network::build(vec![
            decl("broadcaster", None, &["x"]),
            decl("x", Some(FlipFlop), &[]),
            decl("x", Some(FlipFlop), &["broadcaster"]),
        ])
        .unwrap_err();
        assert!(matches!(err, WiringError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn missing_entry_is_rejected() {
        let err = Network::build(vec![decl("a", Some(FlipFlop), &["b"])]).unwrap_err();
        assert_eq!(
            err,
            WiringError::MissingEntry {
                name: DEFAULT_ENTRY_NAME.into()
            }
        );
    }

    #[test]
    fn entry_referenced_but_undeclared_is_missing() {
        let err = Network::build(vec![decl("a", Some(FlipFlop), &["broadcaster"])]).unwrap_err();
        assert!(matches!(err, WiringError::MissingEntry { .. }));
    }

    #[test]
    fn entry_must_be_broadcast() {
        let err = Network::build(vec![decl("broadcaster", Some(FlipFlop), &["a"])]).unwrap_err();
        assert_eq!(
            err,
            WiringError::EntryNotBroadcast {
                name: DEFAULT_ENTRY_NAME.into(),
                kind: NodeKind::FlipFlop,
            }
        );
    }

    #[test]
    fn custom_entry_name() {
        let net = Network::builder()
            .entry("start")
            .declare(decl("start", Some(Broadcast), &["out"]))
            .build()
            .unwrap();
        assert_eq!(net.name(net.entry()), "start");
    }

    #[test]
    fn reserved_and_empty_names_are_rejected() {
        let err = Network::build(vec![decl("broadcaster", None, &[SOURCE_NAME])]).unwrap_err();
        assert!(matches!(err, WiringError::ReservedName { .. }));

        let err = Network::build(vec![decl("broadcaster", None, &[""])]).unwrap_err();
        assert_eq!(err, WiringError::EmptyName);
    }

    #[test]
    fn untagged_source_becomes_sink() {
        let net = Network::build(vec![
            decl("broadcaster", None, &["probe"]),
            decl("probe", None, &["after"]),
        ])
        .unwrap();
        let probe = net.node_by_name("probe").unwrap();
        assert_eq!(probe.kind(), NodeKind::Sink);
        assert_eq!(probe.outputs.len(), 1);
    }

    #[test]
    fn rebuild_is_structurally_identical() {
        let a = Network::build(textbook()).unwrap();
        let b = Network::build(textbook()).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        let names_a: Vec<&str> = a.nodes().map(|(_, n)| n.name.as_str()).collect();
        let names_b: Vec<&str> = b.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn weak_components_split_disjoint_subgraphs() {
        let net = Network::build(vec![
            decl("broadcaster", None, &["a"]),
            decl("a", Some(FlipFlop), &["out"]),
            decl("island", Some(FlipFlop), &["lonely"]),
        ])
        .unwrap();
        let components = net.weak_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 4); // button, broadcaster, a, out
        let island: Vec<&str> = components[1].iter().map(|&id| net.name(id)).collect();
        assert_eq!(island, vec!["island", "lonely"]);
    }

    #[test]
    fn wiring_error_display_messages() {
        let err = WiringError::KindConflict {
            name: "x".into(),
            first: NodeKind::FlipFlop,
            second: NodeKind::Conjunction,
        };
        assert_eq!(
            err.to_string(),
            "node 'x' declared as flip-flop and again as conjunction"
        );
        assert_eq!(
            WiringError::EmptyName.to_string(),
            "node declared with an empty name"
        );
    }
}
