//! Request handlers, one module per resource.

pub mod batches;
pub mod order_items;
pub mod scan;
pub mod units;
pub mod webhooks;
