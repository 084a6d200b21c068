//! Crafting Calculator
//!
//! Resolves the full production tree for a target item from recipe data,
//! flattens it into a one-node-per-item flow graph and lays that graph out
//! in ranks for display.
//!
//! ```no_run
//! use craft_calculator::{RecipeIndex, ResolveOptions, resolve, sample};
//!
//! let catalog = sample::sample_catalog();
//! let index = RecipeIndex::build(&catalog);
//! let resolved = resolve(&index, sample::PLANK, 10.0, &ResolveOptions::default()).unwrap();
//! assert_eq!(resolved.graph.nodes.len(), 2);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod import;
pub mod index;
pub mod layout;
pub mod models;
pub mod planner;
pub mod quantity;
pub mod resolver;
pub mod sample;
pub mod snapshot;
pub mod summary;
pub mod sync;

pub use config::{CalcConfig, LayoutConfig, ResolverConfig};
pub use error::{CalcError, ResolveWarning};
pub use graph::{Graph, GraphEdge, GraphNode, NodeId};
pub use index::RecipeIndex;
pub use layout::{LayoutOptions, LayoutResult, compute_layout};
pub use models::{Catalog, Item, ItemId, Recipe, RecipeId};
pub use planner::Planner;
pub use resolver::{RequirementNode, ResolveOptions};
pub use snapshot::SavedGraph;
pub use sync::{EdgeStateSync, set_node_done};

/// A projected graph plus everything that was cut or skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub graph: Graph,
    pub tree: RequirementNode,
    pub warnings: Vec<ResolveWarning>,
}

/// Resolve `target` at `desired` units and project the result into a graph.
pub fn resolve(
    index: &RecipeIndex,
    target: ItemId,
    desired: f64,
    options: &ResolveOptions,
) -> Result<Resolved, CalcError> {
    let resolution = resolver::resolve_tree(index, target, desired, options)?;
    let graph = graph::project(&resolution.root, None);
    Ok(Resolved {
        graph,
        tree: resolution.root,
        warnings: resolution.warnings,
    })
}
