//! Crafting Calculator CLI
//!
//! Maintains a SQLite catalog of items and recipes and computes crafting
//! plans against it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use craft_calculator::config::CalcConfig;
use craft_calculator::models::{Catalog, Item, RecipeId};
use craft_calculator::{ItemId, Planner, RecipeIndex, db, import, sample, summary};

#[derive(Parser)]
#[command(name = "craft-calculator")]
#[command(about = "Crafting dependency calculator for game recipe data")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "craft_data.db")]
    database: PathBuf,

    /// Optional TOML file with resolver and layout settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import item and recipe tables exported as JSON
    Import {
        /// Directory containing *_desc.json tables
        source_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Calculate the crafting plan for an item
    Calc {
        /// Item id or slug (e.g., "plank", "5")
        item: String,

        /// Number of units wanted
        #[arg(short, long, default_value = "1")]
        quantity: f64,

        /// Use a specific recipe for an item, as ITEM=RECIPE_ID (repeatable)
        #[arg(short, long = "select", value_parser = parse_selection)]
        selections: Vec<(String, u32)>,

        /// Show the full requirement tree
        #[arg(short, long)]
        tree: bool,

        /// Print node positions from the layered layout
        #[arg(long)]
        layout: bool,

        /// Print the plan as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Write the plan to a JSON file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List all items in the database
    ListItems,

    /// List all items some recipe produces
    ListProducible,

    /// Show details and recipes for an item
    Item {
        /// Item id or slug
        key: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog
    LoadSample,
}

fn parse_selection(s: &str) -> Result<(String, u32), String> {
    let (item, recipe) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM=RECIPE_ID, got '{}'", s))?;
    let recipe = recipe
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("recipe id must be a number, got '{}'", recipe))?;
    Ok((item.trim().to_string(), recipe))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn find_item<'c>(catalog: &'c Catalog, key: &str) -> Result<&'c Item> {
    key.parse::<u32>()
        .ok()
        .and_then(|id| catalog.item(ItemId(id)))
        .or_else(|| catalog.find_by_slug(key))
        .ok_or_else(|| anyhow!("Item '{}' not found", key))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => CalcConfig::load(path)?,
        None => CalcConfig::default(),
    };

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { source_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_to_database(&mut conn, &source_dir)?;
            println!("{}", stats);
        }

        Commands::Calc {
            item,
            quantity,
            selections,
            tree,
            layout,
            json,
            save,
        } => {
            let catalog = db::load_catalog(&conn)?;
            if catalog.items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
                return Ok(());
            }
            let index = RecipeIndex::build(&catalog);
            let target = find_item(&catalog, &item)?.id;

            let mut planner = Planner::new(&index, config);
            planner.select(target, quantity)?;
            for (key, recipe) in selections {
                let item = find_item(&catalog, &key)?.id;
                planner.choose_recipe(item, RecipeId(recipe))?;
            }

            for warning in planner.warnings() {
                eprintln!("warning: {}", warning);
            }

            if layout {
                planner.layout(&HashMap::new(), true)?;
            }

            let saved = planner.snapshot(None, now_millis())?;
            if let Some(path) = &save {
                fs::write(path, saved.to_json()?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Plan saved to {}", path.display());
            }

            if json {
                println!("{}", saved.to_json()?);
                return Ok(());
            }

            let graph = planner.graph().ok_or_else(|| anyhow!("no plan resolved"))?;
            if tree {
                if let Some(root) = planner.tree() {
                    println!("Requirement tree:\n");
                    println!("{}", summary::format_requirement_tree(root, &catalog, &index, 0));
                }
            }

            println!("{}", summary::summarize(graph, &catalog, &index));

            if layout {
                println!("Layout:");
                for node in &graph.nodes {
                    println!(
                        "  {:<24} x={:>8.1} y={:>8.1}",
                        catalog.item_name(node.item_id),
                        node.position.x,
                        node.position.y
                    );
                }
            }
        }

        Commands::ListItems => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:>6} {:<30} {:>4} {:<10}", "ID", "Item", "Tier", "Rarity");
                println!("{}", "-".repeat(53));
                for i in items {
                    println!("{:>6} {:<30} {:>4} {:<10}", i.id.0, i.name, i.tier, i.rarity.as_str());
                }
            }
        }

        Commands::ListProducible => {
            let items = db::list_producible_items(&conn)?;
            if items.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Producible items:");
                for i in items {
                    println!("  {} ({})", i.name, i.slug);
                }
            }
        }

        Commands::Item { key } => {
            let Some(item) = db::get_item(&conn, &key)? else {
                println!("Item '{}' not found", key);
                return Ok(());
            };
            println!("Item: {}", item.name);
            println!("  ID: {}", item.id);
            println!("  Slug: {}", item.slug);
            println!("  Tier: {}", item.tier);
            println!("  Rarity: {}", item.rarity.as_str());
            if let Some(tag) = &item.tag {
                println!("  Tag: {}", tag);
            }

            let catalog = db::load_catalog(&conn)?;
            let index = RecipeIndex::build(&catalog);

            let producers = index.by_output(item.id);
            if producers.is_empty() {
                println!("  Raw material (no recipe produces it)");
            } else {
                println!("  Produced by:");
                for r in producers {
                    println!("    [{}] {} ({}, yields {})", r.id, r.name, r.kind.as_str(), r.output_per_run(item.id));
                }
            }

            let consumers = index.by_input(item.id);
            if !consumers.is_empty() {
                println!("  Used in:");
                for r in consumers {
                    println!("    [{}] {}", r.id, r.name);
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            db::clear_catalog(&conn)?;
            let catalog = sample::sample_catalog();
            db::store_catalog(&mut conn, &catalog)?;
            println!(
                "Loaded {} sample items and {} recipes",
                catalog.items.len(),
                catalog.recipes.len()
            );
        }
    }

    Ok(())
}
