//! Save/restore shape for resolved graphs
//!
//! The surrounding application stores plans as
//! `{ quantity, nodes, edges, createdAt, updatedAt }`. Only reproducible
//! fields go in; measured sizes and any UI decoration are left out on save
//! and tolerated (ignored) on load.

use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::graph::{EdgeId, EdgeStyle, Graph, GraphEdge, GraphNode, NodeId, Point};
use crate::models::{ItemId, RecipeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNode {
    pub id: NodeId,
    pub item_id: ItemId,
    #[serde(default)]
    pub recipe_id: Option<RecipeId>,
    pub quantity: f64,
    #[serde(default)]
    pub runs: u64,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub is_done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGraph {
    pub quantity: f64,
    pub nodes: Vec<SavedNode>,
    pub edges: Vec<SavedEdge>,
    /// Unix milliseconds.
    pub created_at: u64,
    pub updated_at: u64,
}

impl SavedGraph {
    /// Snapshot `graph`. `created_at` is kept from an earlier save when
    /// given, so re-saving a plan only moves `updated_at`.
    pub fn capture(graph: &Graph, created_at: Option<u64>, now: u64) -> SavedGraph {
        SavedGraph {
            quantity: graph.quantity,
            nodes: graph
                .nodes
                .iter()
                .map(|n| SavedNode {
                    id: n.id.clone(),
                    item_id: n.item_id,
                    recipe_id: n.recipe_id,
                    quantity: n.quantity,
                    runs: n.runs,
                    position: n.position,
                    is_done: n.is_done,
                })
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|e| SavedEdge {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    target: e.target.clone(),
                    style: e.style,
                })
                .collect(),
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        }
    }

    /// Rebuild a graph. Edge styles are derived again from node flags.
    pub fn restore(&self) -> Result<Graph, CalcError> {
        let root = self.nodes.first().ok_or(CalcError::NoGraph)?;
        let mut graph = Graph {
            target: root.item_id,
            quantity: self.quantity,
            nodes: self
                .nodes
                .iter()
                .map(|n| GraphNode {
                    id: n.id.clone(),
                    item_id: n.item_id,
                    recipe_id: n.recipe_id,
                    quantity: n.quantity,
                    runs: n.runs,
                    position: n.position,
                    measured_size: None,
                    is_done: n.is_done,
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| GraphEdge {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    target: e.target.clone(),
                    style: e.style,
                })
                .collect(),
            edge_revision: 0,
        };
        graph.rebuild_edge_styles();
        graph.edge_revision = 0;
        Ok(graph)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<SavedGraph> {
        serde_json::from_str(s)
    }
}
