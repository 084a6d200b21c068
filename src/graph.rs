//! Projection of a requirement tree onto a flat node/edge graph
//!
//! The tree may mention an item in several branches; the graph holds exactly
//! one node per item with the quantities of all occurrences summed, which is
//! what the UI renders and what completion state is keyed on. Branches the
//! resolver cut short (loops, depth limit) get their own terminal node per
//! item, so they never inflate the crafted node of the same item.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ItemId, RecipeId};
use crate::resolver::RequirementNode;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn for_item(item: ItemId) -> NodeId {
        NodeId(format!("item-{}", item.0))
    }

    /// Terminal stand-in for an occurrence of `item` that was not expanded.
    pub fn cut_for_item(item: ItemId) -> NodeId {
        NodeId(format!("item-{}-cut", item.0))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn between(source: &NodeId, target: &NodeId) -> EdgeId {
        EdgeId(format!("{}->{}", source, target))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub item_id: ItemId,
    pub recipe_id: Option<RecipeId>,
    pub quantity: f64,
    pub runs: u64,
    pub position: Point,
    /// Filled in by the UI after rendering; not part of the saved shape.
    pub measured_size: Option<Size>,
    pub is_done: bool,
}

impl GraphNode {
    pub fn is_terminal(&self) -> bool {
        self.recipe_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub satisfied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub target: ItemId,
    pub quantity: f64,
    /// Breadth-first from the root; the root is always first.
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Bumped every time the edge list is rebuilt.
    pub edge_revision: u64,
}

impl Graph {
    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn node_for_item(&self, item: ItemId) -> Option<&GraphNode> {
        self.node(&NodeId::for_item(item))
    }

    pub fn done_map(&self) -> HashMap<NodeId, bool> {
        self.nodes.iter().map(|n| (n.id.clone(), n.is_done)).collect()
    }

    pub fn edges_into<'g>(&'g self, id: &'g NodeId) -> impl Iterator<Item = &'g GraphEdge> {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    pub fn edges_from<'g>(&'g self, id: &'g NodeId) -> impl Iterator<Item = &'g GraphEdge> {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Recompute every edge's style from its target's completion flag.
    pub(crate) fn rebuild_edge_styles(&mut self) {
        let done = self.done_map();
        for edge in &mut self.edges {
            edge.style.satisfied = done.get(&edge.target).copied().unwrap_or(false);
        }
        self.edge_revision += 1;
    }
}

/// Flatten `root` into a graph. Completion flags, measured sizes and
/// positions of nodes that also exist in `previous` are carried over.
pub fn project(root: &RequirementNode, previous: Option<&Graph>) -> Graph {
    let carried: HashMap<&NodeId, &GraphNode> = previous
        .map(|g| g.nodes.iter().map(|n| (&n.id, n)).collect())
        .unwrap_or_default();

    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut slots: HashMap<(ItemId, bool), usize> = HashMap::new();
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut seen_edges: HashSet<(usize, usize)> = HashSet::new();

    let mut queue: VecDeque<(&RequirementNode, Option<usize>)> = VecDeque::new();
    queue.push_back((root, None));

    while let Some((occurrence, parent)) = queue.pop_front() {
        let cut = occurrence.termination.is_some();
        let slot = *slots.entry((occurrence.item_id, cut)).or_insert_with(|| {
            let id = if cut {
                NodeId::cut_for_item(occurrence.item_id)
            } else {
                NodeId::for_item(occurrence.item_id)
            };
            let old = carried.get(&id);
            nodes.push(GraphNode {
                item_id: occurrence.item_id,
                recipe_id: None,
                quantity: 0.0,
                runs: 0,
                position: old.map(|n| n.position).unwrap_or_default(),
                measured_size: old.and_then(|n| n.measured_size),
                is_done: old.map(|n| n.is_done).unwrap_or(false),
                id,
            });
            nodes.len() - 1
        });

        let node = &mut nodes[slot];
        node.quantity += occurrence.required_quantity;
        node.runs = node.runs.saturating_add(occurrence.runs);
        if node.recipe_id.is_none() {
            node.recipe_id = occurrence.recipe_id;
        }

        if let Some(parent) = parent {
            if seen_edges.insert((parent, slot)) {
                let source = nodes[parent].id.clone();
                let target = nodes[slot].id.clone();
                edges.push(GraphEdge {
                    id: EdgeId::between(&source, &target),
                    style: EdgeStyle {
                        satisfied: nodes[slot].is_done,
                    },
                    source,
                    target,
                });
            }
        }

        for child in &occurrence.children {
            queue.push_back((child, Some(slot)));
        }
    }

    Graph {
        target: root.item_id,
        quantity: root.required_quantity,
        nodes,
        edges,
        edge_revision: previous.map(|g| g.edge_revision + 1).unwrap_or(0),
    }
}
