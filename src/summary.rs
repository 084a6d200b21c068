//! Text rendering of requirement trees and plan summaries

use std::fmt;

use crate::graph::Graph;
use crate::index::RecipeIndex;
use crate::models::{Catalog, RecipeId};
use crate::quantity::display_quantity;
use crate::resolver::{RequirementNode, Termination};

fn recipe_name(index: &RecipeIndex, id: RecipeId) -> String {
    index
        .recipe(id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("recipe #{}", id))
}

/// Format a requirement tree as an indented list
pub fn format_requirement_tree(
    node: &RequirementNode,
    catalog: &Catalog,
    index: &RecipeIndex,
    indent: usize,
) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);
    let name = catalog.item_name(node.item_id);

    match node.recipe_id {
        None => {
            let note = match node.termination {
                Some(Termination::Cycle) => " (loop, not expanded)",
                Some(Termination::DepthLimit) => " (depth limit)",
                None => " (raw)",
            };
            output.push_str(&format!(
                "{}{} x{}{}\n",
                prefix,
                name,
                display_quantity(node.required_quantity),
                note
            ));
        }
        Some(recipe) => {
            output.push_str(&format!(
                "{}{} x{} via {} ({} runs)\n",
                prefix,
                name,
                display_quantity(node.required_quantity),
                recipe_name(index, recipe),
                node.runs
            ));
            for child in &node.children {
                output.push_str(&format_requirement_tree(child, catalog, index, indent + 1));
            }
        }
    }

    output
}

/// Summary of a projected plan
#[derive(Debug)]
pub struct PlanSummary {
    pub target: String,
    pub quantity: f64,
    /// (item, recipe, runs), in graph order
    pub crafted: Vec<(String, String, u64)>,
    /// (item, whole units), sorted by name
    pub raw_materials: Vec<(String, u64)>,
    pub done: usize,
    pub total: usize,
}

pub fn summarize(graph: &Graph, catalog: &Catalog, index: &RecipeIndex) -> PlanSummary {
    let mut crafted = Vec::new();
    let mut raw_materials = Vec::new();

    for node in &graph.nodes {
        let name = catalog.item_name(node.item_id);
        match node.recipe_id {
            Some(recipe) => crafted.push((name, recipe_name(index, recipe), node.runs)),
            None => raw_materials.push((name, display_quantity(node.quantity))),
        }
    }
    raw_materials.sort_by(|a, b| a.0.cmp(&b.0));

    PlanSummary {
        target: catalog.item_name(graph.target),
        quantity: graph.quantity,
        crafted,
        raw_materials,
        done: graph.nodes.iter().filter(|n| n.is_done).count(),
        total: graph.nodes.len(),
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crafting Plan ===")?;
        writeln!(f, "Target: {} x{}", self.target, display_quantity(self.quantity))?;
        writeln!(f)?;

        writeln!(f, "Crafting steps:")?;
        for (item, recipe, runs) in &self.crafted {
            writeln!(f, "  {:>4}x {} -> {}", runs, recipe, item)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw materials:")?;
        for (item, qty) in &self.raw_materials {
            writeln!(f, "  {} x{}", item, qty)?;
        }
        writeln!(f)?;

        writeln!(f, "Progress: {}/{} done", self.done, self.total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::project;
    use crate::resolver::{ResolveOptions, resolve_tree};
    use crate::sample::{self, sample_catalog};

    #[test]
    fn tree_marks_raw_and_crafted_lines() {
        let catalog = sample_catalog();
        let index = RecipeIndex::build(&catalog);
        let res = resolve_tree(&index, sample::PLANK, 10.0, &ResolveOptions::default()).unwrap();
        let text = format_requirement_tree(&res.root, &catalog, &index, 0);
        assert_eq!(text, "Plank x10 via Saw Planks (3 runs)\n  Wood x6 (raw)\n");
    }

    #[test]
    fn loop_is_labelled() {
        let catalog = sample_catalog();
        let index = RecipeIndex::build(&catalog);
        let res = resolve_tree(&index, sample::SEED, 3.0, &ResolveOptions::default()).unwrap();
        let text = format_requirement_tree(&res.root, &catalog, &index, 0);
        assert!(text.contains("Seed x2 (loop, not expanded)"));
    }

    #[test]
    fn loop_input_counts_as_raw_material() {
        let catalog = sample_catalog();
        let index = RecipeIndex::build(&catalog);
        let res = resolve_tree(&index, sample::SEED, 3.0, &ResolveOptions::default()).unwrap();
        let summary = summarize(&project(&res.root, None), &catalog, &index);
        assert_eq!(summary.raw_materials, vec![("Seed".to_string(), 2)]);
        assert_eq!(summary.crafted.len(), 2);
        assert_eq!(summary.quantity, 3.0);
    }

    #[test]
    fn summary_lists_raw_materials_sorted() {
        let catalog = sample_catalog();
        let index = RecipeIndex::build(&catalog);
        let res = resolve_tree(&index, sample::BOX, 1.0, &ResolveOptions::default()).unwrap();
        let summary = summarize(&project(&res.root, None), &catalog, &index);
        assert_eq!(
            summary.raw_materials,
            vec![("Iron Ore".to_string(), 3), ("Wood".to_string(), 4)]
        );
        assert_eq!(summary.crafted[0], ("Wooden Box".to_string(), "Assemble Box".to_string(), 1));
        assert!(summary.to_string().contains("Progress: 0/7 done"));
    }
}
