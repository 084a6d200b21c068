//! Error and warning types

use thiserror::Error;

use crate::graph::NodeId;
use crate::models::{ItemId, RecipeId};

/// Errors raised at the library entrypoints. Data problems inside a resolve
/// pass never surface here; they become [`ResolveWarning`]s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("desired quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),

    #[error("item {0} is not in the catalog")]
    UnknownItem(ItemId),

    #[error("graph has no node {0}")]
    UnknownNode(NodeId),

    #[error("no graph has been resolved yet")]
    NoGraph,
}

/// Which stack of a recipe referenced a missing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSide {
    Input,
    Output,
}

impl StackSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackSide::Input => "input",
            StackSide::Output => "output",
        }
    }
}

fn join_path(path: &[ItemId]) -> String {
    path.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" -> ")
}

/// Non-fatal conditions collected while indexing or resolving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveWarning {
    /// `item` already appeared on the ancestor path; the branch was cut.
    #[error("cycle at item {item} (path {})", join_path(.path))]
    CycleDetected { item: ItemId, path: Vec<ItemId> },

    /// The branch reached the configured depth bound.
    #[error("depth limit {max_depth} reached at item {item}")]
    DepthExceeded { item: ItemId, max_depth: usize },

    /// A recipe stack referenced an item absent from the catalog and was skipped.
    #[error("recipe {recipe} {} references unknown item {item}", .side.as_str())]
    MissingJoinData {
        recipe: RecipeId,
        item: ItemId,
        side: StackSide,
    },

    /// The caller selected a recipe that does not produce the item.
    #[error("selected recipe {recipe} does not produce item {item}")]
    InvalidSelection { item: ItemId, recipe: RecipeId },
}
