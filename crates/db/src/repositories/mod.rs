//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Methods accept `&mut PgConnection` so that engine flows can compose
//! several repositories inside one transaction (`&mut *tx`); callers
//! outside a transaction acquire a connection from the pool.

pub mod batch_file_repo;
pub mod batch_item_repo;
pub mod batch_repo;
pub mod order_item_repo;
pub mod order_repo;
pub mod product_repo;
pub mod rule_repo;
pub mod stock_repo;
pub mod store_repo;
pub mod unit_repo;

pub use batch_file_repo::BatchFileRepo;
pub use batch_item_repo::BatchItemRepo;
pub use batch_repo::BatchRepo;
pub use order_item_repo::OrderItemRepo;
pub use order_repo::OrderRepo;
pub use product_repo::{ProductRepo, ProductVariantRepo};
pub use rule_repo::ClassificationRuleRepo;
pub use stock_repo::StockRepo;
pub use store_repo::StoreRepo;
pub use unit_repo::UnitRepo;
