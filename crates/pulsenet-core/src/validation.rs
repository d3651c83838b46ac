//! Structural and state comparison between two networks.
//!
//! Nodes are matched by name, so networks built separately from the same
//! wiring compare equal even though their ids live in different maps.

use crate::network::Network;
use crate::node::{Node, NodeState};

// ---------------------------------------------------------------------------
// Diff types
// ---------------------------------------------------------------------------

/// Difference between two networks at the node level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDiff {
    /// Node exists only in network A.
    OnlyInA(String),
    /// Node exists only in network B.
    OnlyInB(String),
    /// Same name, different kind or outputs.
    WiringMismatch { node: String, description: String },
    /// Same wiring, different mutable state.
    StateMismatch { node: String, description: String },
}

/// Full diff between two networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDiff {
    pub is_identical: bool,
    pub triggers_match: bool,
    pub node_diffs: Vec<NodeDiff>,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Compute a node-by-node diff, matching nodes by name.
pub fn diff_networks(a: &Network, b: &Network) -> NetworkDiff {
    let triggers_match = a.triggers() == b.triggers();
    let mut node_diffs = Vec::new();

    for (_, node_a) in a.nodes() {
        match b.node_by_name(&node_a.name) {
            None => node_diffs.push(NodeDiff::OnlyInA(node_a.name.clone())),
            Some(node_b) => {
                if let Some(diff) = compare_nodes(a, node_a, b, node_b) {
                    node_diffs.push(diff);
                }
            }
        }
    }
    for (_, node_b) in b.nodes() {
        if a.node_id(&node_b.name).is_none() {
            node_diffs.push(NodeDiff::OnlyInB(node_b.name.clone()));
        }
    }

    NetworkDiff {
        is_identical: triggers_match && node_diffs.is_empty(),
        triggers_match,
        node_diffs,
    }
}

/// Whether two networks hash identically. Faster than a full diff.
pub fn quick_compare(a: &Network, b: &Network) -> bool {
    a.state_hash() == b.state_hash()
}

fn compare_nodes(a: &Network, node_a: &Node, b: &Network, node_b: &Node) -> Option<NodeDiff> {
    if node_a.kind() != node_b.kind() {
        return Some(NodeDiff::WiringMismatch {
            node: node_a.name.clone(),
            description: format!("kind {} vs {}", node_a.kind(), node_b.kind()),
        });
    }

    let outs_a: Vec<&str> = node_a.outputs.iter().map(|&id| a.name(id)).collect();
    let outs_b: Vec<&str> = node_b.outputs.iter().map(|&id| b.name(id)).collect();
    if outs_a != outs_b {
        return Some(NodeDiff::WiringMismatch {
            node: node_a.name.clone(),
            description: format!("outputs {outs_a:?} vs {outs_b:?}"),
        });
    }

    let description = match (&node_a.state, &node_b.state) {
        (NodeState::FlipFlop { energized: x }, NodeState::FlipFlop { energized: y }) if x != y => {
            Some(format!("energized {x} vs {y}"))
        }
        (NodeState::Conjunction { memory: x }, NodeState::Conjunction { memory: y }) => {
            let mut mismatched = Vec::new();
            for (&input, level) in x {
                let name = a.name(input);
                let other = b.node_id(name).and_then(|id| y.get(&id));
                if other != Some(level) {
                    mismatched.push(name.to_string());
                }
            }
            if mismatched.is_empty() && x.len() == y.len() {
                None
            } else {
                Some(format!("memory differs for {mismatched:?}"))
            }
        }
        (
            NodeState::Sink {
                low_received: la,
                high_received: ha,
            },
            NodeState::Sink {
                low_received: lb,
                high_received: hb,
            },
        ) if (la, ha) != (lb, hb) => Some(format!("receipts ({la}, {ha}) vs ({lb}, {hb})")),
        _ => None,
    };

    description.map(|description| NodeDiff::StateMismatch {
        node: node_a.name.clone(),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_trigger;
    use crate::test_utils::*;

    #[test]
    fn fresh_builds_are_identical() {
        let a = textbook_circuit();
        let b = textbook_circuit();
        let diff = diff_networks(&a, &b);
        assert!(diff.is_identical, "{diff:?}");
        assert!(quick_compare(&a, &b));
    }

    #[test]
    fn state_divergence_is_reported() {
        let mut a = textbook_circuit();
        let b = textbook_circuit();
        run_trigger(&mut a).unwrap();

        let diff = diff_networks(&a, &b);
        assert!(!diff.is_identical);
        assert!(!diff.triggers_match);
        assert!(diff.node_diffs.iter().any(|d| matches!(
            d,
            NodeDiff::StateMismatch { node, .. } if node == "a"
        )));
        assert!(!quick_compare(&a, &b));
    }

    #[test]
    fn same_trigger_count_converges_again() {
        let mut a = textbook_circuit();
        let mut b = textbook_circuit();
        for _ in 0..5 {
            run_trigger(&mut a).unwrap();
            run_trigger(&mut b).unwrap();
        }
        assert!(diff_networks(&a, &b).is_identical);
    }

    #[test]
    fn wiring_differences_are_reported() {
        let a = build(vec![
            decl("broadcaster", None, &["x"]),
            flip_flop("x", &["y"]),
        ]);
        let b = build(vec![
            decl("broadcaster", None, &["x"]),
            conjunction("x", &["z"]),
        ]);
        let diff = diff_networks(&a, &b);
        assert!(diff.node_diffs.contains(&NodeDiff::OnlyInA("y".into())));
        assert!(diff.node_diffs.contains(&NodeDiff::OnlyInB("z".into())));
        assert!(diff.node_diffs.iter().any(|d| matches!(
            d,
            NodeDiff::WiringMismatch { node, .. } if node == "x"
        )));
    }
}
