//! Catalog domain types shared by every subsystem.

pub mod product;

pub use product::{AggregatedResult, InvalidProductId, ProductDetail, ProductId};
