//! SQLite catalog store

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::models::{Catalog, Item, ItemId, ItemStack, OutputStack, Rarity, Recipe, RecipeId, RecipeKind, Yield};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            slug TEXT NOT NULL,
            name TEXT NOT NULL,
            tier INTEGER NOT NULL DEFAULT 0,
            tag TEXT,
            rarity TEXT NOT NULL DEFAULT 'common'
        );

        -- Crafting and extraction recipes share one id space
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'crafting',
            skill TEXT,
            tier INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            quantity REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        -- quantity_max is NULL for fixed yields
        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            quantity_min REAL NOT NULL,
            quantity_max REAL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_item ON recipe_outputs(item_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_inputs_item ON recipe_inputs(item_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_items_slug ON items(slug);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, slug, name, tier, tag, rarity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            item.id.0,
            &item.slug,
            &item.name,
            item.tier,
            &item.tag,
            item.rarity.as_str(),
        ),
    )?;
    Ok(())
}

/// Insert or replace a recipe together with its stacks
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, name, kind, skill, tier) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            recipe.id.0,
            &recipe.name,
            recipe.kind.as_str(),
            &recipe.skill,
            recipe.tier,
        ),
    )?;
    conn.execute("DELETE FROM recipe_inputs WHERE recipe_id = ?1", [recipe.id.0])?;
    conn.execute("DELETE FROM recipe_outputs WHERE recipe_id = ?1", [recipe.id.0])?;

    for (pos, input) in recipe.inputs.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_inputs (recipe_id, position, item_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            (recipe.id.0, pos as i64, input.item_id.0, input.quantity),
        )?;
    }
    for (pos, output) in recipe.outputs.iter().enumerate() {
        let (min, max) = match output.yield_ {
            Yield::Fixed(q) => (q, None),
            Yield::Range { min, max } => (min, Some(max)),
        };
        conn.execute(
            "INSERT INTO recipe_outputs (recipe_id, position, item_id, quantity_min, quantity_max)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (recipe.id.0, pos as i64, output.item_id.0, min, max),
        )?;
    }
    Ok(())
}

/// Write a whole catalog in one transaction
pub fn store_catalog(conn: &mut Connection, catalog: &Catalog) -> Result<()> {
    let tx = conn.transaction()?;
    for item in catalog.items.values() {
        upsert_item(&tx, item)?;
    }
    for recipe in &catalog.recipes {
        insert_recipe(&tx, recipe)?;
    }
    tx.commit()?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: ItemId(row.get(0)?),
        slug: row.get(1)?,
        name: row.get(2)?,
        tier: row.get(3)?,
        tag: row.get(4)?,
        rarity: Rarity::parse(&row.get::<_, String>(5)?),
    })
}

/// List all items ordered by name
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, slug, name, tier, tag, rarity FROM items ORDER BY name")?;
    let rows = stmt.query_map([], item_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Look an item up by numeric id or slug
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<Item>> {
    let sql = "SELECT id, slug, name, tier, tag, rarity FROM items WHERE id = ?1 OR slug = ?2";
    let id: Option<i64> = key.parse().ok();
    let item = conn
        .query_row(sql, (id, key), item_from_row)
        .optional()?;
    Ok(item)
}

/// List all items that some recipe produces
pub fn list_producible_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT i.id, i.slug, i.name, i.tier, i.tag, i.rarity
         FROM items i
         JOIN recipe_outputs ro ON ro.item_id = i.id
         ORDER BY i.name",
    )?;
    let rows = stmt.query_map([], item_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load the full catalog into memory
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let items = list_items(conn)?;

    let mut inputs: HashMap<u32, Vec<ItemStack>> = HashMap::new();
    let mut stmt =
        conn.prepare("SELECT recipe_id, item_id, quantity FROM recipe_inputs ORDER BY recipe_id, position")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            ItemStack {
                item_id: ItemId(row.get(1)?),
                quantity: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (recipe_id, stack) = row?;
        inputs.entry(recipe_id).or_default().push(stack);
    }

    let mut outputs: HashMap<u32, Vec<OutputStack>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT recipe_id, item_id, quantity_min, quantity_max FROM recipe_outputs ORDER BY recipe_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        let min: f64 = row.get(2)?;
        let max: Option<f64> = row.get(3)?;
        Ok((
            row.get::<_, u32>(0)?,
            OutputStack {
                item_id: ItemId(row.get(1)?),
                yield_: match max {
                    Some(max) => Yield::Range { min, max },
                    None => Yield::Fixed(min),
                },
            },
        ))
    })?;
    for row in rows {
        let (recipe_id, stack) = row?;
        outputs.entry(recipe_id).or_default().push(stack);
    }

    let mut stmt = conn.prepare("SELECT id, name, kind, skill, tier FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, i32>(4)?,
        ))
    })?;
    let mut recipes = Vec::new();
    for row in rows {
        let (id, name, kind, skill, tier) = row?;
        recipes.push(Recipe {
            id: RecipeId(id),
            name,
            kind: RecipeKind::parse(&kind),
            inputs: inputs.remove(&id).unwrap_or_default(),
            outputs: outputs.remove(&id).unwrap_or_default(),
            skill,
            tier,
        });
    }

    Ok(Catalog::new(items, recipes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{self, sample_catalog};
    use pretty_assertions::assert_eq;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn catalog_round_trips_through_sqlite() {
        let mut conn = memory_db();
        let catalog = sample_catalog();
        store_catalog(&mut conn, &catalog).unwrap();
        assert_eq!(load_catalog(&conn).unwrap(), catalog);
    }

    #[test]
    fn lookup_by_id_or_slug() {
        let mut conn = memory_db();
        store_catalog(&mut conn, &sample_catalog()).unwrap();
        assert_eq!(get_item(&conn, "2").unwrap().unwrap().id, sample::PLANK);
        assert_eq!(get_item(&conn, "wooden-box").unwrap().unwrap().id, sample::BOX);
        assert!(get_item(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn producible_excludes_raw_items() {
        let mut conn = memory_db();
        store_catalog(&mut conn, &sample_catalog()).unwrap();
        let names: Vec<String> = list_producible_items(&conn).unwrap().into_iter().map(|i| i.name).collect();
        assert!(names.contains(&"Plank".to_string()));
        assert!(!names.contains(&"Wood".to_string()));
        assert!(!names.contains(&"Iron Ore".to_string()));
    }

    #[test]
    fn reinserting_a_recipe_replaces_its_stacks() {
        let conn = memory_db();
        let mut recipe = sample_catalog().recipes[0].clone();
        insert_recipe(&conn, &recipe).unwrap();
        recipe.inputs.clear();
        insert_recipe(&conn, &recipe).unwrap();
        let loaded = load_catalog(&conn).unwrap();
        assert!(loaded.recipes[0].inputs.is_empty());

        clear_catalog(&conn).unwrap();
        assert!(load_catalog(&conn).unwrap().recipes.is_empty());
    }
}
