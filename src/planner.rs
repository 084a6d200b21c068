//! Calculator session driven by UI events
//!
//! Holds the graph for the currently selected target and applies the event
//! loop: item selected, quantity changed, alternative recipe chosen,
//! completion toggled, layout requested. Every resolve replaces the graph
//! wholesale; completion flags carry over only while the target stays the same.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::CalcConfig;
use crate::error::{CalcError, ResolveWarning};
use crate::graph::{Graph, GraphEdge, NodeId, Size, project};
use crate::index::RecipeIndex;
use crate::layout::{LayoutResult, LayoutSession};
use crate::models::{ItemId, RecipeId};
use crate::resolver::{LowestId, RecipeRanker, RequirementNode, ResolveOptions, Resolver};
use crate::snapshot::SavedGraph;
use crate::sync::{self, EdgeStateSync};

pub struct Planner<'a> {
    index: &'a RecipeIndex,
    config: CalcConfig,
    ranker: Box<dyn RecipeRanker>,
    selection: HashMap<ItemId, RecipeId>,
    graph: Option<Graph>,
    tree: Option<RequirementNode>,
    warnings: Vec<ResolveWarning>,
    edge_sync: EdgeStateSync,
    layout: LayoutSession,
}

impl<'a> Planner<'a> {
    pub fn new(index: &'a RecipeIndex, config: CalcConfig) -> Self {
        Planner {
            index,
            config,
            ranker: Box::new(LowestId),
            selection: HashMap::new(),
            graph: None,
            tree: None,
            warnings: Vec::new(),
            edge_sync: EdgeStateSync::new(),
            layout: LayoutSession::new(),
        }
    }

    pub fn with_ranker(mut self, ranker: impl RecipeRanker + 'static) -> Self {
        self.ranker = Box::new(ranker);
        self
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Requirement tree behind the current graph; absent after [`Planner::load`].
    pub fn tree(&self) -> Option<&RequirementNode> {
        self.tree.as_ref()
    }

    /// Warnings from the most recent resolve.
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    pub fn selection(&self) -> &HashMap<ItemId, RecipeId> {
        &self.selection
    }

    /// Resolve `target` at `quantity`, replacing the current graph.
    pub fn select(&mut self, target: ItemId, quantity: f64) -> Result<&Graph, CalcError> {
        if self.graph.as_ref().map(|g| g.target) != Some(target) {
            self.selection.clear();
        }
        self.run(target, quantity)
    }

    pub fn set_quantity(&mut self, quantity: f64) -> Result<&Graph, CalcError> {
        let target = self.graph.as_ref().ok_or(CalcError::NoGraph)?.target;
        self.run(target, quantity)
    }

    /// Use `recipe` for `item` from now on and re-resolve.
    pub fn choose_recipe(&mut self, item: ItemId, recipe: RecipeId) -> Result<&Graph, CalcError> {
        let graph = self.graph.as_ref().ok_or(CalcError::NoGraph)?;
        let (target, quantity) = (graph.target, graph.quantity);
        self.selection.insert(item, recipe);
        self.run(target, quantity)
    }

    fn run(&mut self, target: ItemId, quantity: f64) -> Result<&Graph, CalcError> {
        let options = ResolveOptions {
            recipe_selection: self.selection.clone(),
            config: self.config.resolver.clone(),
        };
        let resolution = Resolver::new(self.index, self.ranker.as_ref()).resolve(target, quantity, &options)?;

        // A different target starts a fresh view: no carried flags, refit on layout.
        let previous = self.graph.take().filter(|g| g.target == target);
        if previous.is_none() {
            self.layout.reset();
        }
        let graph = project(&resolution.root, previous.as_ref());
        info!(
            item = %target,
            quantity,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "plan resolved"
        );

        self.edge_sync = EdgeStateSync::prime(&graph);
        self.warnings = resolution.warnings;
        self.tree = Some(resolution.root);
        Ok(self.graph.insert(graph))
    }

    pub fn set_node_done(&mut self, node_id: &NodeId, done: bool) -> Result<&[GraphEdge], CalcError> {
        let graph = self.graph.as_mut().ok_or(CalcError::NoGraph)?;
        debug!(node = %node_id, done, "completion toggled");
        sync::set_node_done(graph, &mut self.edge_sync, node_id, done)
    }

    /// Lay out the current graph. `None` means the shape was unchanged and
    /// positions were left as they are.
    pub fn layout(
        &mut self,
        sizes: &HashMap<NodeId, Size>,
        refit: bool,
    ) -> Result<Option<LayoutResult>, CalcError> {
        let graph = self.graph.as_mut().ok_or(CalcError::NoGraph)?;
        Ok(self.layout.update(graph, sizes, &self.config.layout, refit))
    }

    pub fn snapshot(&self, created_at: Option<u64>, now: u64) -> Result<SavedGraph, CalcError> {
        let graph = self.graph.as_ref().ok_or(CalcError::NoGraph)?;
        Ok(SavedGraph::capture(graph, created_at, now))
    }

    /// Continue from a saved plan.
    pub fn load(&mut self, saved: &SavedGraph) -> Result<&Graph, CalcError> {
        let graph = saved.restore()?;
        self.selection = graph
            .nodes
            .iter()
            .filter_map(|n| Some((n.item_id, n.recipe_id?)))
            .collect();
        self.layout.reset();
        self.edge_sync = EdgeStateSync::prime(&graph);
        self.warnings.clear();
        self.tree = None;
        Ok(self.graph.insert(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_catalog;

    fn index() -> RecipeIndex {
        RecipeIndex::build(&sample_catalog())
    }

    #[test]
    fn completion_persists_across_quantity_change() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        p.select(crate::sample::PLANK, 10.0).unwrap();
        let wood = NodeId::for_item(crate::sample::WOOD);
        p.set_node_done(&wood, true).unwrap();

        let g = p.set_quantity(20.0).unwrap();
        assert!(g.node(&wood).unwrap().is_done);
        assert_eq!(g.node(&wood).unwrap().quantity, 10.0);
    }

    #[test]
    fn new_target_drops_completion_and_selection() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        p.select(crate::sample::PLANK, 10.0).unwrap();
        p.choose_recipe(crate::sample::PLANK, crate::sample::PLANK_FROM_LOG).unwrap();
        p.set_node_done(&NodeId::for_item(crate::sample::PLANK), true).unwrap();

        let g = p.select(crate::sample::BOX, 1.0).unwrap();
        assert!(g.nodes.iter().all(|n| !n.is_done));
        assert!(p.selection().is_empty());
    }

    #[test]
    fn first_layout_refits_and_toggle_does_not_relayout() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        p.select(crate::sample::PLANK, 10.0).unwrap();
        let sizes = HashMap::new();
        assert!(p.layout(&sizes, false).unwrap().unwrap().viewport.is_some());
        p.set_node_done(&NodeId::for_item(crate::sample::WOOD), true).unwrap();
        assert!(p.layout(&sizes, false).unwrap().is_none());
    }

    #[test]
    fn events_before_resolve_fail_cleanly() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        assert_eq!(p.set_quantity(3.0).unwrap_err(), CalcError::NoGraph);
        assert_eq!(
            p.set_node_done(&NodeId::for_item(crate::sample::WOOD), true).unwrap_err(),
            CalcError::NoGraph
        );
        assert!(p.snapshot(None, 0).is_err());
    }

    #[test]
    fn invalid_quantity_keeps_previous_graph() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        p.select(crate::sample::PLANK, 10.0).unwrap();
        assert!(p.set_quantity(-1.0).is_err());
        assert_eq!(p.graph().unwrap().quantity, 10.0);
    }

    #[test]
    fn saved_plan_reloads_with_selection() {
        let idx = index();
        let mut p = Planner::new(&idx, CalcConfig::default());
        p.select(crate::sample::PLANK, 10.0).unwrap();
        p.choose_recipe(crate::sample::PLANK, crate::sample::PLANK_FROM_LOG).unwrap();
        let saved = p.snapshot(None, 42).unwrap();

        let mut other = Planner::new(&idx, CalcConfig::default());
        other.load(&saved).unwrap();
        assert_eq!(other.selection().get(&crate::sample::PLANK), Some(&crate::sample::PLANK_FROM_LOG));
        let g = other.set_quantity(10.0).unwrap();
        assert_eq!(g.root().unwrap().recipe_id, Some(crate::sample::PLANK_FROM_LOG));
    }
}
