//! # Seed Data Generator
//!
//! Populates a database with a small, realistic shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bazaar_dev.db
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path and stock per product
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db --stock 50
//! ```
//!
//! ## Generated Data
//! - One branch with a cashier and a shop assistant (password `secret1`)
//! - A percent tariff assigned to both
//! - Categories with products, each stocked at the branch

use std::env;

use bazaar_core::{
    NewBranch, NewCategory, NewProduct, NewStaff, NewStaffTariff, NewStockRecord, StaffType,
    TariffType,
};
use bazaar_db::{Database, DbConfig};
use chrono::NaiveDate;

/// Categories and their products: (name, price in cents)
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Beverages",
        &[
            ("Green Tea 100g", 1_500),
            ("Black Tea 250g", 2_800),
            ("Mineral Water 1L", 400),
            ("Apple Juice 1L", 1_200),
            ("Cola 1.5L", 1_100),
        ],
    ),
    (
        "Bakery",
        &[
            ("Flatbread", 500),
            ("Samsa", 800),
            ("Sweet Bun", 600),
        ],
    ),
    (
        "Dairy",
        &[
            ("Milk 1L", 1_000),
            ("Kefir 0.5L", 700),
            ("Butter 200g", 2_500),
            ("Cottage Cheese 400g", 2_200),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bazaar_dev.db");
    let mut stock: i64 = 25;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -s, --stock <N>    Units stocked per product (default: 25)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bazaar Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let branch = db
        .branches()
        .create(&NewBranch {
            name: "Chorsu".to_string(),
            address: "Chorsu bazaar, row 4".to_string(),
        })
        .await?;

    let tariff = db
        .tariffs()
        .create(&NewStaffTariff {
            name: "Standard".to_string(),
            tariff_type: TariffType::Percent,
            amount_for_cash_cents: 200,
            amount_for_card_cents: 150,
        })
        .await?;

    for (login, name, staff_type) in [
        ("cashier", "Dilnoza", StaffType::Cashier),
        ("assistant", "Jasur", StaffType::ShopAssistant),
    ] {
        db.staff()
            .create(&NewStaff {
                branch_id: branch.id.clone(),
                tariff_id: Some(tariff.id.clone()),
                staff_type,
                name: name.to_string(),
                balance_cents: 0,
                birth_date: NaiveDate::from_ymd_opt(1996, 5, 20).ok_or("invalid birth date")?,
                login: login.to_string(),
                password: "secret1".to_string(),
            })
            .await?;
    }
    println!("✓ Branch, tariff and staff created");

    let mut generated = 0;
    for (category_idx, (category_name, products)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .create(&NewCategory {
                name: category_name.to_string(),
                parent_id: None,
            })
            .await?;

        for (product_idx, (product_name, price_cents)) in products.iter().enumerate() {
            let product = NewProduct {
                name: product_name.to_string(),
                price_cents: *price_cents,
                barcode: format!("478{:010}", category_idx * 100 + product_idx),
                category_id: Some(category.id.clone()),
            };

            let product = match db.products().create(&product).await {
                Ok(product) => product,
                Err(e) => {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }
            };

            db.stock()
                .create(&NewStockRecord {
                    product_id: product.id.clone(),
                    branch_id: branch.id.clone(),
                    count: stock,
                })
                .await?;

            generated += 1;
        }
    }

    println!("✓ Generated {} products with {} units each", generated, stock);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
