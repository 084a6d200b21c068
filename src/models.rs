//! Data models for items, recipes and the in-memory catalog

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric item identifier from the game data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

/// Numeric recipe identifier. Crafting and extraction recipes share one id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
        }
    }

    /// Parse a rarity name; unknown names fall back to common.
    pub fn parse(s: &str) -> Rarity {
        match s.to_ascii_lowercase().as_str() {
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            "mythic" => Rarity::Mythic,
            _ => Rarity::Common,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub tier: i32,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub rarity: Rarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    #[default]
    Crafting,
    Extraction,
}

impl RecipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeKind::Crafting => "crafting",
            RecipeKind::Extraction => "extraction",
        }
    }

    pub fn parse(s: &str) -> RecipeKind {
        if s.eq_ignore_ascii_case("extraction") {
            RecipeKind::Extraction
        } else {
            RecipeKind::Crafting
        }
    }
}

/// An `{ item, quantity }` pair consumed by one run of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub quantity: f64,
}

/// How much of an item one run yields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Yield {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl Yield {
    /// Conservative per-run yield: ranged outputs count as their minimum.
    pub fn per_run_minimum(&self) -> f64 {
        match *self {
            Yield::Fixed(q) => q,
            Yield::Range { min, max } => min.min(max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputStack {
    pub item_id: ItemId,
    #[serde(rename = "quantity")]
    pub yield_: Yield,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default)]
    pub kind: RecipeKind,
    #[serde(default)]
    pub inputs: Vec<ItemStack>,
    #[serde(default)]
    pub outputs: Vec<OutputStack>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub tier: i32,
}

impl Recipe {
    pub fn produces(&self, item: ItemId) -> bool {
        self.outputs.iter().any(|o| o.item_id == item)
    }

    /// Total conservative yield of `item` per run, summed over output stacks.
    pub fn output_per_run(&self, item: ItemId) -> f64 {
        self.outputs
            .iter()
            .filter(|o| o.item_id == item)
            .map(|o| o.yield_.per_run_minimum())
            .sum()
    }
}

/// Read-only item and recipe collection handed over by the data-loading layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub items: BTreeMap<ItemId, Item>,
    pub recipes: Vec<Recipe>,
}

impl Catalog {
    pub fn new(items: impl IntoIterator<Item = Item>, recipes: Vec<Recipe>) -> Self {
        Catalog {
            items: items.into_iter().map(|i| (i.id, i)).collect(),
            recipes,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Item> {
        self.items.values().find(|i| i.slug == slug)
    }

    /// Display name, or `#id` for items missing from the catalog.
    pub fn item_name(&self, id: ItemId) -> String {
        self.item(id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }
}
