//! Import of exported game data tables
//!
//! Walks a directory for JSON table dumps (`item_desc`, `crafting_recipe_desc`,
//! `extraction_recipe_desc`, optionally with a prefix or suffix such as
//! `region1_item_desc.json`) and writes them to the catalog store.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Catalog, Item, ItemId, ItemStack, OutputStack, Rarity, Recipe, RecipeId, RecipeKind, Yield};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Items,
    CraftingRecipes,
    ExtractionRecipes,
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: u32,
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    tier: i32,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    rarity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StackRow {
    item_id: u32,
    quantity: f64,
    #[serde(default)]
    quantity_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RecipeRow {
    id: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    consumed_item_stacks: Vec<StackRow>,
    #[serde(default, alias = "extracted_item_stacks")]
    crafted_item_stacks: Vec<StackRow>,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    tier: i32,
}

/// Classify a table file by name
pub fn classify(path: &Path, pattern: &Regex) -> Option<TableKind> {
    let filename = path.file_name()?.to_str()?;
    let caps = pattern.captures(filename)?;
    match &caps[1] {
        "item" => Some(TableKind::Items),
        "crafting_recipe" => Some(TableKind::CraftingRecipes),
        "extraction_recipe" => Some(TableKind::ExtractionRecipes),
        _ => None,
    }
}

fn table_pattern() -> Result<Regex> {
    Ok(Regex::new(r"(?:^|_)(item|crafting_recipe|extraction_recipe)_desc(?:_\w+)?\.json$")?)
}

/// Find all recognised table files below `dir`, in path order
pub fn find_table_files(dir: &Path) -> Result<Vec<(PathBuf, TableKind)>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let pattern = table_pattern()?;
    let mut tables = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(kind) = classify(path, &pattern) {
            tables.push((path.to_path_buf(), kind));
        }
    }

    Ok(tables)
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn convert_item(row: ItemRow) -> Item {
    Item {
        id: ItemId(row.id),
        slug: row.slug.unwrap_or_else(|| slugify(&row.name)),
        name: row.name,
        tier: row.tier,
        tag: row.tag,
        rarity: row.rarity.as_deref().map(Rarity::parse).unwrap_or_default(),
    }
}

fn convert_recipe(row: RecipeRow, kind: RecipeKind) -> Recipe {
    Recipe {
        id: RecipeId(row.id),
        name: row.name.unwrap_or_else(|| format!("{} #{}", kind.as_str(), row.id)),
        kind,
        inputs: row
            .consumed_item_stacks
            .into_iter()
            .map(|s| ItemStack {
                item_id: ItemId(s.item_id),
                quantity: s.quantity,
            })
            .collect(),
        outputs: row
            .crafted_item_stacks
            .into_iter()
            .map(|s| OutputStack {
                item_id: ItemId(s.item_id),
                yield_: match s.quantity_max {
                    Some(max) if max != s.quantity => Yield::Range { min: s.quantity, max },
                    _ => Yield::Fixed(s.quantity),
                },
            })
            .collect(),
        skill: row.skill,
        tier: row.tier,
    }
}

/// Parse every table below `dir` into a catalog
pub fn read_catalog(dir: &Path, stats: &mut ImportStats) -> Result<Catalog> {
    let mut catalog = Catalog::default();

    for (path, kind) in find_table_files(dir)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let parsed = match kind {
            TableKind::Items => serde_json::from_str::<Vec<ItemRow>>(&content).map(|rows| {
                for row in rows {
                    let item = convert_item(row);
                    catalog.items.insert(item.id, item);
                    stats.items += 1;
                }
            }),
            TableKind::CraftingRecipes | TableKind::ExtractionRecipes => {
                let recipe_kind = if kind == TableKind::ExtractionRecipes {
                    RecipeKind::Extraction
                } else {
                    RecipeKind::Crafting
                };
                serde_json::from_str::<Vec<RecipeRow>>(&content).map(|rows| {
                    for row in rows {
                        let recipe = convert_recipe(row, recipe_kind);
                        if catalog.recipes.iter().any(|r| r.id == recipe.id && r.kind == recipe.kind) {
                            warn!(recipe = %recipe.id, file = %path.display(), "duplicate recipe id, keeping first");
                            stats.skipped += 1;
                            continue;
                        }
                        catalog.recipes.push(recipe);
                        stats.recipes += 1;
                    }
                })
            }
        };

        match parsed {
            Ok(()) => {
                stats.files += 1;
                info!(file = %path.display(), ?kind, "table imported");
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "table could not be parsed");
                stats.errors += 1;
            }
        }
    }

    stats.renumbered = separate_recipe_ids(&mut catalog.recipes);
    Ok(catalog)
}

/// Crafting and extraction tables number their rows independently, but the
/// catalog has one recipe id space. Extraction recipes whose id is already
/// used by a crafting recipe move to fresh ids above the current maximum.
fn separate_recipe_ids(recipes: &mut [Recipe]) -> usize {
    let mut taken: HashSet<RecipeId> = recipes
        .iter()
        .filter(|r| r.kind == RecipeKind::Crafting)
        .map(|r| r.id)
        .collect();
    let mut next = recipes.iter().map(|r| r.id.0).max().unwrap_or(0);
    let mut renumbered = 0;

    for recipe in recipes.iter_mut().filter(|r| r.kind == RecipeKind::Extraction) {
        if taken.insert(recipe.id) {
            continue;
        }
        next += 1;
        info!(from = %recipe.id, to = next, "extraction recipe id shared with a crafting recipe, renumbered");
        recipe.id = RecipeId(next);
        taken.insert(recipe.id);
        renumbered += 1;
    }

    renumbered
}

/// Import all tables below `dir` and populate the database
pub fn import_to_database(conn: &mut Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let catalog = read_catalog(dir, &mut stats)?;
    db::store_catalog(conn, &catalog)?;
    Ok(stats)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub items: usize,
    pub recipes: usize,
    pub skipped: usize,
    pub renumbered: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} items and {} recipes from {} tables. Skipped: {}, Renumbered: {}, Errors: {}",
            self.items, self.recipes, self.files, self.skipped, self.renumbered, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn table_names_are_classified() {
        let re = table_pattern().unwrap();
        assert_eq!(classify(Path::new("a/item_desc.json"), &re), Some(TableKind::Items));
        assert_eq!(
            classify(Path::new("region1_crafting_recipe_desc.json"), &re),
            Some(TableKind::CraftingRecipes)
        );
        assert_eq!(
            classify(Path::new("extraction_recipe_desc_v2.json"), &re),
            Some(TableKind::ExtractionRecipes)
        );
        assert_eq!(classify(Path::new("cargo_desc.json"), &re), None);
        assert_eq!(classify(Path::new("item_desc.csv"), &re), None);
    }

    #[test]
    fn slugs_are_derived_from_names() {
        assert_eq!(slugify("Rough Wood Log"), "rough-wood-log");
        assert_eq!(slugify("  Iron  Ingot (T2) "), "iron-ingot-t2");
    }

    #[test]
    fn reads_tables_from_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("static");
        fs::create_dir(&nested).unwrap();
        fs::write(
            nested.join("item_desc.json"),
            r#"[{"id": 1, "name": "Wood"}, {"id": 2, "name": "Plank", "tier": 1, "rarity": "Rare"}, {"id": 3, "name": "Log"}]"#,
        )
        .unwrap();
        fs::write(
            nested.join("crafting_recipe_desc.json"),
            r#"[{"id": 10, "name": "Saw Planks",
                "consumed_item_stacks": [{"item_id": 1, "quantity": 2}],
                "crafted_item_stacks": [{"item_id": 2, "quantity": 4}]},
               {"id": 10, "name": "Saw Planks Again"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("extraction_recipe_desc.json"),
            r#"[{"id": 10, "name": "Chop Tree", "extracted_item_stacks": [{"item_id": 3, "quantity": 1}]},
               {"id": 11, "extracted_item_stacks": [{"item_id": 3, "quantity": 1, "quantity_max": 3}]}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("item_desc_broken.json"), "{not json").unwrap();

        let mut stats = ImportStats::default();
        let catalog = read_catalog(dir.path(), &mut stats).unwrap();

        assert_eq!(stats.items, 3);
        assert_eq!(stats.recipes, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.renumbered, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(catalog.item(ItemId(2)).unwrap().rarity, Rarity::Rare);
        assert_eq!(catalog.item(ItemId(1)).unwrap().slug, "wood");

        let extraction = catalog.recipes.iter().find(|r| r.id == RecipeId(11)).unwrap();
        assert_eq!(extraction.kind, RecipeKind::Extraction);
        assert_eq!(extraction.outputs[0].yield_, Yield::Range { min: 1.0, max: 3.0 });
        assert_eq!(extraction.name, "extraction #11");

        // both id-10 recipes survive, crafting keeps its id
        let saw = catalog.recipes.iter().find(|r| r.produces(ItemId(2))).unwrap();
        assert_eq!((saw.id, saw.name.as_str()), (RecipeId(10), "Saw Planks"));
        let chop = catalog.recipes.iter().find(|r| r.name == "Chop Tree").unwrap();
        assert_eq!(chop.id, RecipeId(12));
        assert_eq!(chop.kind, RecipeKind::Extraction);
    }

    #[test]
    fn shared_ids_across_kinds_are_separated() {
        let recipe = |id: u32, kind| Recipe {
            id: RecipeId(id),
            name: format!("r{}", id),
            kind,
            inputs: vec![],
            outputs: vec![],
            skill: None,
            tier: 0,
        };
        let mut recipes = vec![
            recipe(3, RecipeKind::Extraction),
            recipe(3, RecipeKind::Crafting),
            recipe(5, RecipeKind::Extraction),
        ];
        assert_eq!(separate_recipe_ids(&mut recipes), 1);
        let ids: Vec<u32> = recipes.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![6, 3, 5]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(find_table_files(&dir.path().join("absent")).is_err());
    }
}
