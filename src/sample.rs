//! Small built-in catalog for trying the calculator without game data

use crate::models::{Catalog, Item, ItemId, ItemStack, OutputStack, Rarity, Recipe, RecipeId, RecipeKind, Yield};

pub const WOOD: ItemId = ItemId(1);
pub const PLANK: ItemId = ItemId(2);
pub const LOG: ItemId = ItemId(3);
pub const STICK: ItemId = ItemId(4);
pub const BOX: ItemId = ItemId(5);
pub const NAIL: ItemId = ItemId(6);
pub const IRON_ORE: ItemId = ItemId(7);
pub const IRON_INGOT: ItemId = ItemId(8);
pub const RESIN: ItemId = ItemId(9);
pub const FERTILIZER: ItemId = ItemId(10);
pub const SEED: ItemId = ItemId(11);

pub const SAW_PLANKS: RecipeId = RecipeId(1);
pub const PLANK_FROM_LOG: RecipeId = RecipeId(2);
pub const CHOP_TREE: RecipeId = RecipeId(3);
pub const ASSEMBLE_BOX: RecipeId = RecipeId(7);

fn item(id: ItemId, name: &str, tier: i32, tag: &str, rarity: Rarity) -> Item {
    Item {
        id,
        slug: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        tier,
        tag: Some(tag.to_string()),
        rarity,
    }
}

fn recipe(
    id: RecipeId,
    name: &str,
    kind: RecipeKind,
    inputs: &[(ItemId, f64)],
    outputs: &[(ItemId, Yield)],
    skill: &str,
    tier: i32,
) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        kind,
        inputs: inputs
            .iter()
            .map(|&(item_id, quantity)| ItemStack { item_id, quantity })
            .collect(),
        outputs: outputs
            .iter()
            .map(|&(item_id, yield_)| OutputStack { item_id, yield_ })
            .collect(),
        skill: Some(skill.to_string()),
        tier,
    }
}

/// Woodworking and smithing chain with an alternative plank recipe, two
/// extraction recipes with ranged yields and a compost/seed feedback loop.
pub fn sample_catalog() -> Catalog {
    use RecipeKind::{Crafting, Extraction};
    use Yield::{Fixed, Range};

    let items = vec![
        item(WOOD, "Wood", 1, "Raw Material", Rarity::Common),
        item(PLANK, "Plank", 1, "Refined Material", Rarity::Common),
        item(LOG, "Log", 1, "Raw Material", Rarity::Common),
        item(STICK, "Stick", 1, "Component", Rarity::Common),
        item(BOX, "Wooden Box", 2, "Container", Rarity::Uncommon),
        item(NAIL, "Nail", 2, "Component", Rarity::Common),
        item(IRON_ORE, "Iron Ore", 1, "Raw Material", Rarity::Common),
        item(IRON_INGOT, "Iron Ingot", 2, "Refined Material", Rarity::Common),
        item(RESIN, "Resin", 1, "Raw Material", Rarity::Rare),
        item(FERTILIZER, "Fertilizer", 2, "Farming", Rarity::Common),
        item(SEED, "Seed", 1, "Farming", Rarity::Common),
    ];

    let recipes = vec![
        recipe(SAW_PLANKS, "Saw Planks", Crafting, &[(WOOD, 2.0)], &[(PLANK, Fixed(4.0))], "Carpentry", 1),
        recipe(PLANK_FROM_LOG, "Split Log", Crafting, &[(LOG, 1.0)], &[(PLANK, Fixed(6.0))], "Carpentry", 1),
        recipe(
            CHOP_TREE,
            "Chop Tree",
            Extraction,
            &[],
            &[(LOG, Range { min: 1.0, max: 3.0 }), (RESIN, Fixed(1.0))],
            "Forestry",
            1,
        ),
        recipe(RecipeId(4), "Whittle Sticks", Crafting, &[(PLANK, 1.0)], &[(STICK, Fixed(2.0))], "Carpentry", 1),
        recipe(RecipeId(5), "Smelt Iron", Crafting, &[(IRON_ORE, 3.0)], &[(IRON_INGOT, Fixed(1.0))], "Smithing", 2),
        recipe(RecipeId(6), "Forge Nails", Crafting, &[(IRON_INGOT, 1.0)], &[(NAIL, Fixed(10.0))], "Smithing", 2),
        recipe(
            ASSEMBLE_BOX,
            "Assemble Box",
            Crafting,
            &[(PLANK, 4.0), (STICK, 2.0), (NAIL, 8.0)],
            &[(BOX, Fixed(1.0))],
            "Carpentry",
            2,
        ),
        recipe(RecipeId(8), "Tap Resin", Extraction, &[], &[(RESIN, Range { min: 2.0, max: 4.0 })], "Forestry", 1),
        recipe(RecipeId(9), "Compost", Crafting, &[(SEED, 2.0)], &[(FERTILIZER, Fixed(1.0))], "Farming", 1),
        recipe(RecipeId(10), "Grow Seeds", Crafting, &[(FERTILIZER, 1.0)], &[(SEED, Fixed(3.0))], "Farming", 1),
    ];

    Catalog::new(items, recipes)
}
