//! Outbound commerce-platform client (GraphQL admin API).
//!
//! Everything here is best-effort from the engine's point of view:
//! callers catch and log [`CommerceError`] and never let it roll back a
//! local transaction. The client itself reports failures faithfully.

mod client;

pub use client::{CancelOrderOptions, CommerceClient, CommerceError, Fulfillment};
