//! # Repository Module
//!
//! Database repository implementations: the persistence gateway.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Their Tables                        │
//! │                                                                         │
//! │  BranchRepository       branches          create/get/list/update/delete │
//! │  CategoryRepository     categories        create/get/list/update/delete │
//! │  ProductRepository      products          create/get/list/update/delete │
//! │  StockRepository        stock_records     + available / branch_counts   │
//! │  SaleRepository         sales             + claim / mark_settled        │
//! │  BasketRepository       basket_lines      get/list/remove (no update)   │
//! │  LedgerRepository       ledger_entries    append-only                   │
//! │  TariffRepository       staff_tariffs     create/get/list/update/delete │
//! │  StaffRepository        staff             + change_password             │
//! │  TransactionRepository  money_transactions + amount range filter        │
//! │                                                                         │
//! │  CheckoutRepository     sales + basket_lines + stock_records + ledger   │
//! │                         AddToBasket / SettleSale in one transaction     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each entity module exposes a pool-backed repository plus `pub(crate)`
//! query functions over `&mut SqliteConnection`, so the checkout can run
//! the same SQL inside its transaction.

pub mod basket;
pub mod branch;
pub mod category;
pub mod checkout;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod staff;
pub mod stock;
pub mod tariff;
pub mod transaction;

pub use basket::BasketRepository;
pub use branch::BranchRepository;
pub use category::CategoryRepository;
pub use checkout::CheckoutRepository;
pub use ledger::LedgerRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
pub use staff::StaffRepository;
pub use stock::StockRepository;
pub use tariff::TariffRepository;
pub use transaction::TransactionRepository;

use uuid::Uuid;

/// Generates a new entity ID.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// `LIKE` pattern for a case-insensitive substring search.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|s| format!("%{}%", s))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for repository tests.

    use bazaar_core::{
        NewBranch, NewProduct, NewSale, NewStaff, NewStockRecord, PaymentType, Product, Sale,
        StaffType,
    };
    use chrono::NaiveDate;
    use std::path::Path;

    use crate::{Database, DbConfig};

    pub struct Shop {
        pub db: Database,
        pub branch_id: String,
        pub cashier_id: String,
        pub assistant_id: String,
    }

    /// An in-memory database with one branch, a cashier and a shop assistant.
    pub async fn shop() -> Shop {
        shop_on(DbConfig::in_memory()).await
    }

    /// Same shop on a SQLite file, for tests that need several connections.
    pub async fn file_shop(path: &Path) -> Shop {
        shop_on(DbConfig::new(path.join("bazaar.db")).max_connections(8)).await
    }

    async fn shop_on(config: DbConfig) -> Shop {
        let db = Database::new(config).await.unwrap();

        let branch = db
            .branches()
            .create(&NewBranch {
                name: "Main".to_string(),
                address: "1 Market St".to_string(),
            })
            .await
            .unwrap();

        let cashier_id = staff(&db, &branch.id, StaffType::Cashier, "cashier").await;
        let assistant_id = staff(&db, &branch.id, StaffType::ShopAssistant, "assistant").await;

        Shop {
            db,
            branch_id: branch.id,
            cashier_id,
            assistant_id,
        }
    }

    pub async fn staff(db: &Database, branch_id: &str, staff_type: StaffType, login: &str) -> String {
        db.staff()
            .create(&NewStaff {
                branch_id: branch_id.to_string(),
                tariff_id: None,
                staff_type,
                name: login.to_string(),
                balance_cents: 0,
                birth_date: NaiveDate::from_ymd_opt(1995, 3, 1).unwrap(),
                login: login.to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    impl Shop {
        pub async fn product(&self, barcode: &str, price_cents: i64) -> Product {
            self.db
                .products()
                .create(&NewProduct {
                    name: format!("Product {barcode}"),
                    price_cents,
                    barcode: barcode.to_string(),
                    category_id: None,
                })
                .await
                .unwrap()
        }

        pub async fn stock(&self, product_id: &str, count: i64) {
            self.db
                .stock()
                .create(&NewStockRecord {
                    product_id: product_id.to_string(),
                    branch_id: self.branch_id.clone(),
                    count,
                })
                .await
                .unwrap();
        }

        pub async fn open_sale(&self) -> Sale {
            self.db
                .sales()
                .create(&NewSale {
                    branch_id: self.branch_id.clone(),
                    shop_assistant_id: Some(self.assistant_id.clone()),
                    cashier_id: self.cashier_id.clone(),
                    payment_type: PaymentType::Cash,
                    client_name: "Walk-in".to_string(),
                })
                .await
                .unwrap()
        }
    }
}
