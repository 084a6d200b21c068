//! Lookup tables over the recipe collection
//!
//! Built once per data load and shared by reference with every resolve pass.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::{ResolveWarning, StackSide};
use crate::models::{Catalog, ItemId, Recipe, RecipeId};

#[derive(Debug, Clone, Default)]
pub struct RecipeIndex {
    /// Recipes with unresolvable stacks removed, ascending by id.
    recipes: Vec<Recipe>,
    positions: HashMap<RecipeId, usize>,
    by_output: HashMap<ItemId, Vec<usize>>,
    by_input: HashMap<ItemId, Vec<usize>>,
    known_items: BTreeSet<ItemId>,
    warnings: Vec<ResolveWarning>,
}

impl RecipeIndex {
    pub fn build(catalog: &Catalog) -> RecipeIndex {
        let known_items: BTreeSet<ItemId> = catalog.items.keys().copied().collect();
        let mut warnings = Vec::new();

        let mut recipes: Vec<Recipe> = Vec::with_capacity(catalog.recipes.len());
        for recipe in &catalog.recipes {
            let mut clean = recipe.clone();
            clean.inputs.retain(|stack| {
                let ok = known_items.contains(&stack.item_id);
                if !ok {
                    warnings.push(ResolveWarning::MissingJoinData {
                        recipe: recipe.id,
                        item: stack.item_id,
                        side: StackSide::Input,
                    });
                }
                ok
            });
            clean.outputs.retain(|stack| {
                let ok = known_items.contains(&stack.item_id);
                if !ok {
                    warnings.push(ResolveWarning::MissingJoinData {
                        recipe: recipe.id,
                        item: stack.item_id,
                        side: StackSide::Output,
                    });
                }
                ok
            });
            // Nothing left to produce: the recipe can never be selected.
            if clean.outputs.is_empty() {
                continue;
            }
            recipes.push(clean);
        }
        recipes.sort_by_key(|r| r.id);

        let mut positions = HashMap::with_capacity(recipes.len());
        let mut by_output: HashMap<ItemId, Vec<usize>> = HashMap::new();
        let mut by_input: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (pos, recipe) in recipes.iter().enumerate() {
            positions.insert(recipe.id, pos);
            for output in &recipe.outputs {
                let entry = by_output.entry(output.item_id).or_default();
                if entry.last() != Some(&pos) {
                    entry.push(pos);
                }
            }
            for input in &recipe.inputs {
                let entry = by_input.entry(input.item_id).or_default();
                if entry.last() != Some(&pos) {
                    entry.push(pos);
                }
            }
        }

        for w in &warnings {
            warn!(%w, "skipping recipe entry");
        }
        debug!(
            recipes = recipes.len(),
            items = known_items.len(),
            skipped = warnings.len(),
            "recipe index built"
        );

        RecipeIndex {
            recipes,
            positions,
            by_output,
            by_input,
            known_items,
            warnings,
        }
    }

    /// Recipes yielding `item`, ascending by recipe id.
    pub fn by_output(&self, item: ItemId) -> Vec<&Recipe> {
        self.lookup(&self.by_output, item)
    }

    /// Recipes consuming `item`, ascending by recipe id.
    pub fn by_input(&self, item: ItemId) -> Vec<&Recipe> {
        self.lookup(&self.by_input, item)
    }

    fn lookup(&self, table: &HashMap<ItemId, Vec<usize>>, item: ItemId) -> Vec<&Recipe> {
        table
            .get(&item)
            .map(|positions| positions.iter().map(|&p| &self.recipes[p]).collect())
            .unwrap_or_default()
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.positions.get(&id).map(|&p| &self.recipes[p])
    }

    pub fn contains_item(&self, item: ItemId) -> bool {
        self.known_items.contains(&item)
    }

    /// True when no recipe produces `item`.
    pub fn is_raw(&self, item: ItemId) -> bool {
        !self.by_output.contains_key(&item)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Join problems found while building the index.
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }
}
