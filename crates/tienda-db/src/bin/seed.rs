//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tienda.db with the full demo catalog
//! cargo run -p tienda-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p tienda-db --bin seed -- --count 10
//!
//! # Specify database path
//! cargo run -p tienda-db --bin seed -- --db ./data/tienda.db
//! ```
//!
//! Every product gets a stable id (`{CATEGORY}-{NN}`) so demo requests can
//! reference it directly, a price between 4.99 and 89.99 and a stock level
//! between 0 and 40. Some items start out of stock on purpose.

use anyhow::Context;
use std::env;
use tienda_core::{Money, Product};
use tienda_db::{Database, DbConfig};

const CATALOG: &[(&str, &[&str])] = &[
    (
        "KIT",
        &[
            "Ceramic Mug",
            "French Press",
            "Chef Knife",
            "Cutting Board",
            "Cast Iron Skillet",
            "Tea Kettle",
        ],
    ),
    (
        "HOM",
        &[
            "Desk Lamp",
            "Wool Throw",
            "Linen Pillow",
            "Wall Clock",
            "Plant Pot",
        ],
    ),
    (
        "OUT",
        &[
            "Water Bottle",
            "Trail Backpack",
            "Camping Lantern",
            "Picnic Blanket",
        ],
    ),
    (
        "STA",
        &["Notebook", "Fountain Pen", "Desk Organizer", "Sticky Notes"],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: u32 = u32::MAX;
    let mut db_path = String::from("./tienda.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value
                        .parse()
                        .with_context(|| format!("invalid --count value '{value}'"))?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tienda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./tienda.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tienda Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("failed to open {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated: u32 = 0;
    'catalog: for (category_idx, (category, names)) in CATALOG.iter().enumerate() {
        for (idx, name) in names.iter().enumerate() {
            if generated >= count {
                break 'catalog;
            }

            let product = generate_product(category, name, idx, category_idx * 10 + idx);
            db.products()
                .insert(&product)
                .await
                .with_context(|| format!("failed to insert {}", product.id))?;

            println!(
                "  {:<8} {:<20} {:>8}  stock {}",
                product.id,
                product.name,
                product.price(),
                product.stock
            );
            generated += 1;
        }
    }

    let active = db.products().list_active(generated).await?;
    let in_stock = active.iter().filter(|p| p.stock > 0).count();

    println!();
    println!("✓ Seeded {} products ({} in stock)", generated, in_stock);
    db.close().await;

    Ok(())
}

/// Builds one demo product with deterministic price and stock.
fn generate_product(category: &str, name: &str, idx: usize, seed: usize) -> Product {
    // 4.99 .. 89.99, always ending in .99
    let price = Money::from_units(4 + ((seed * 37) % 86) as i64, 99);
    // Every seventh product starts sold out
    let stock = if seed % 7 == 3 { 0 } else { ((seed * 13) % 40 + 1) as i64 };

    let mut product = Product::new(name, price, stock);
    product.id = format!("{}-{:02}", category, idx + 1);
    product
}
