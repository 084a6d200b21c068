//! Edge state derived from node completion flags

use std::collections::HashMap;

use tracing::debug;

use crate::error::CalcError;
use crate::graph::{Graph, GraphEdge, NodeId};

/// Remembers the completion flags edges were last derived from, so edge
/// styles are rebuilt only when a flag actually flips.
#[derive(Debug, Default, Clone)]
pub struct EdgeStateSync {
    last: HashMap<NodeId, bool>,
}

impl EdgeStateSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking from the current state of `graph` without touching it.
    pub fn prime(graph: &Graph) -> Self {
        EdgeStateSync {
            last: graph.done_map(),
        }
    }

    /// Rebuild edge styles if any node's completion flag differs from the
    /// last sync. Returns whether a rebuild happened.
    pub fn sync(&mut self, graph: &mut Graph) -> bool {
        let current = graph.done_map();
        if current == self.last {
            return false;
        }
        graph.rebuild_edge_styles();
        debug!(revision = graph.edge_revision, "edge styles rebuilt");
        self.last = current;
        true
    }
}

/// Flip one node's completion flag and bring edge styles up to date.
pub fn set_node_done<'g>(
    graph: &'g mut Graph,
    sync: &mut EdgeStateSync,
    node_id: &NodeId,
    done: bool,
) -> Result<&'g [GraphEdge], CalcError> {
    let node = graph
        .node_mut(node_id)
        .ok_or_else(|| CalcError::UnknownNode(node_id.clone()))?;
    node.is_done = done;
    sync.sync(graph);
    Ok(&graph.edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::project;
    use crate::models::{ItemId, RecipeId};
    use crate::resolver::RequirementNode;

    fn sample() -> Graph {
        let leaf = |item: u32| RequirementNode {
            item_id: ItemId(item),
            recipe_id: None,
            required_quantity: 1.0,
            runs: 0,
            depth: 1,
            termination: None,
            children: vec![],
        };
        project(
            &RequirementNode {
                item_id: ItemId(1),
                recipe_id: Some(RecipeId(1)),
                required_quantity: 1.0,
                runs: 1,
                depth: 0,
                termination: None,
                children: vec![leaf(2), leaf(3)],
            },
            None,
        )
    }

    #[test]
    fn marking_done_satisfies_incoming_edges() {
        let mut g = sample();
        let mut s = EdgeStateSync::prime(&g);
        let edges = set_node_done(&mut g, &mut s, &NodeId::for_item(ItemId(2)), true).unwrap();
        let satisfied: Vec<bool> = edges.iter().map(|e| e.style.satisfied).collect();
        assert_eq!(satisfied, vec![true, false]);
        assert_eq!(g.edge_revision, 1);
    }

    #[test]
    fn unchanged_flags_skip_rebuild() {
        let mut g = sample();
        let mut s = EdgeStateSync::prime(&g);
        let id = NodeId::for_item(ItemId(2));
        set_node_done(&mut g, &mut s, &id, false).unwrap();
        assert_eq!(g.edge_revision, 0);
        assert!(!s.sync(&mut g));

        set_node_done(&mut g, &mut s, &id, true).unwrap();
        let rev = g.edge_revision;
        set_node_done(&mut g, &mut s, &id, true).unwrap();
        assert_eq!(g.edge_revision, rev);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let mut g = sample();
        let mut s = EdgeStateSync::new();
        let missing = NodeId("item-99".to_string());
        assert_eq!(
            set_node_done(&mut g, &mut s, &missing, true).unwrap_err(),
            CalcError::UnknownNode(missing)
        );
    }
}
