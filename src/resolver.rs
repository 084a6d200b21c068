//! Recursive dependency resolution
//!
//! Expands a target item into the tree of everything needed to make it.
//! Resolution is a pure function of the index, the target, the quantity and
//! the caller's recipe choices. Cycles and runaway depth cut the offending
//! branch and are reported as warnings; they never fail the pass.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{CalcError, ResolveWarning};
use crate::index::RecipeIndex;
use crate::models::{ItemId, Recipe, RecipeId};
use crate::quantity::{input_qty_for_runs, runs_needed};

/// Why a node was not expanded even though a recipe produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Cycle,
    DepthLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementNode {
    pub item_id: ItemId,
    /// `None` for raw materials and truncated branches.
    pub recipe_id: Option<RecipeId>,
    pub required_quantity: f64,
    pub runs: u64,
    pub depth: usize,
    pub termination: Option<Termination>,
    pub children: Vec<RequirementNode>,
}

impl RequirementNode {
    fn terminal(item_id: ItemId, required_quantity: f64, depth: usize) -> Self {
        RequirementNode {
            item_id,
            recipe_id: None,
            required_quantity,
            runs: 0,
            depth,
            termination: None,
            children: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.recipe_id.is_none()
    }

    /// Pre-order walk over this node and all descendants.
    pub fn walk(&self) -> Vec<&RequirementNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

/// Chooses among alternative recipes when the caller expressed no preference.
pub trait RecipeRanker {
    /// `candidates` is never empty and is sorted by ascending recipe id.
    fn choose<'r>(&self, item: ItemId, candidates: &[&'r Recipe]) -> &'r Recipe;
}

/// Picks the recipe with the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestId;

impl RecipeRanker for LowestId {
    fn choose<'r>(&self, _item: ItemId, candidates: &[&'r Recipe]) -> &'r Recipe {
        candidates[0]
    }
}

/// Picks the recipe with the fewest distinct inputs, then the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestInputs;

impl RecipeRanker for FewestInputs {
    fn choose<'r>(&self, _item: ItemId, candidates: &[&'r Recipe]) -> &'r Recipe {
        candidates
            .iter()
            .copied()
            .min_by_key(|r| (r.inputs.len(), r.id))
            .unwrap_or(candidates[0])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveOptions {
    /// Per-item recipe overrides picked by the user.
    pub recipe_selection: HashMap<ItemId, RecipeId>,
    pub config: ResolverConfig,
}

impl ResolveOptions {
    pub fn with_selection(mut self, item: ItemId, recipe: RecipeId) -> Self {
        self.recipe_selection.insert(item, recipe);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub root: RequirementNode,
    pub warnings: Vec<ResolveWarning>,
}

/// Reject quantities the resolver cannot work with.
pub fn validate_quantity(desired: f64) -> Result<(), CalcError> {
    if desired.is_finite() && desired > 0.0 {
        Ok(())
    } else {
        Err(CalcError::InvalidQuantity(desired))
    }
}

/// Resolve with the default lowest-id ranking.
pub fn resolve_tree(
    index: &RecipeIndex,
    target: ItemId,
    desired: f64,
    options: &ResolveOptions,
) -> Result<Resolution, CalcError> {
    Resolver::new(index, &LowestId).resolve(target, desired, options)
}

pub struct Resolver<'a> {
    index: &'a RecipeIndex,
    ranker: &'a dyn RecipeRanker,
}

struct Pass<'o> {
    options: &'o ResolveOptions,
    path: Vec<ItemId>,
    warnings: Vec<ResolveWarning>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a RecipeIndex, ranker: &'a dyn RecipeRanker) -> Self {
        Resolver { index, ranker }
    }

    pub fn resolve(
        &self,
        target: ItemId,
        desired: f64,
        options: &ResolveOptions,
    ) -> Result<Resolution, CalcError> {
        validate_quantity(desired)?;
        if !self.index.contains_item(target) {
            return Err(CalcError::UnknownItem(target));
        }

        let mut pass = Pass {
            options,
            path: Vec::new(),
            warnings: Vec::new(),
        };
        let root = self.expand(&mut pass, target, desired, 0);

        for w in &pass.warnings {
            warn!(%w, item = %target, "resolve branch truncated");
        }
        debug!(
            item = %target,
            desired,
            nodes = root.walk().len(),
            warnings = pass.warnings.len(),
            "resolved requirement tree"
        );

        Ok(Resolution {
            root,
            warnings: pass.warnings,
        })
    }

    fn select_recipe(&self, pass: &mut Pass<'_>, item: ItemId) -> Option<&'a Recipe> {
        let candidates = self.index.by_output(item);
        if candidates.is_empty() {
            return None;
        }
        if let Some(&chosen) = pass.options.recipe_selection.get(&item) {
            if let Some(recipe) = candidates.iter().copied().find(|r| r.id == chosen) {
                return Some(recipe);
            }
            pass.warnings.push(ResolveWarning::InvalidSelection { item, recipe: chosen });
        }
        Some(self.ranker.choose(item, &candidates))
    }

    fn expand(
        &self,
        pass: &mut Pass<'_>,
        item: ItemId,
        quantity: f64,
        depth: usize,
    ) -> RequirementNode {
        if pass.path.contains(&item) {
            let mut path = pass.path.clone();
            path.push(item);
            pass.warnings.push(ResolveWarning::CycleDetected { item, path });
            let mut node = RequirementNode::terminal(item, quantity, depth);
            node.termination = Some(Termination::Cycle);
            return node;
        }

        let Some(recipe) = self.select_recipe(pass, item) else {
            return RequirementNode::terminal(item, quantity, depth);
        };

        let max_depth = pass.options.config.max_depth;
        if depth >= max_depth {
            pass.warnings.push(ResolveWarning::DepthExceeded { item, max_depth });
            let mut node = RequirementNode::terminal(item, quantity, depth);
            node.termination = Some(Termination::DepthLimit);
            return node;
        }

        let runs = runs_needed(quantity, recipe.output_per_run(item));

        pass.path.push(item);
        let children = recipe
            .inputs
            .iter()
            .filter(|input| input.quantity > 0.0)
            .map(|input| {
                let child_qty = input_qty_for_runs(input.quantity, runs);
                self.expand(pass, input.item_id, child_qty, depth + 1)
            })
            .collect();
        pass.path.pop();

        RequirementNode {
            item_id: item,
            recipe_id: Some(recipe.id),
            required_quantity: quantity,
            runs,
            depth,
            termination: None,
            children,
        }
    }
}
