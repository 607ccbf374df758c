//! Products domain module (event-sourced).
//!
//! Catalog data (SKU, name, price) plus the stock counters guarded by
//! `orderflow-inventory`. Pure domain logic, no IO.

pub mod product;

pub use product::{
    AdjustStock, CommitStock, CreateProduct, DeleteProduct, Product, ProductCommand,
    ProductCreated, ProductDeleted, ProductEvent, ProductId, ProductUpdated, ReleaseStock,
    ReserveStock, StockMoved, UpdateProduct,
};
