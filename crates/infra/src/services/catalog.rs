use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use orderflow_core::{DomainError, Money};
use orderflow_events::EventBus;
use orderflow_products::{
    AdjustStock, CreateProduct, DeleteProduct, Product, ProductCommand, ProductId, UpdateProduct,
};

use crate::ledger::{LedgerRecord, LedgerStore};

use super::error::ServiceError;
use super::ledger::{JsonEnvelope, Ledger};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub initial_stock: i64,
    pub min_stock_level: Option<i64>,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub cost_price: Option<Money>,
    pub min_stock_level: Option<i64>,
    pub active: Option<bool>,
}

/// Product catalog and manual stock corrections.
pub struct CatalogService<S, B> {
    ledger: Arc<Ledger<S, B>>,
}

impl<S, B> CatalogService<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(ledger: Arc<Ledger<S, B>>) -> Self {
        Self { ledger }
    }

    pub fn create(&self, request: NewProduct) -> Result<Product, ServiceError> {
        let product = self.ledger.execute("products.create", |uow| {
            let sku = request.sku.trim().to_string();
            if uow.exists_by_key::<Product>(&sku) {
                return Err(DomainError::invalid_request(format!(
                    "product with SKU {sku} already exists"
                ))
                .into());
            }

            let product_id = ProductId::new(uow.next_id::<Product>());
            let mut product = Product::empty(product_id);
            uow.execute(
                &mut product,
                ProductCommand::CreateProduct(CreateProduct {
                    product_id,
                    sku,
                    name: request.name,
                    description: request.description,
                    price: request.price,
                    cost_price: request.cost_price,
                    initial_stock: request.initial_stock,
                    min_stock_level: request.min_stock_level,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(product)
        })?;

        tracing::info!(product_id = %product.id_typed(), sku = product.sku(), "product created");
        Ok(product)
    }

    pub fn update(&self, product_id: ProductId, changes: ProductChanges) -> Result<Product, ServiceError> {
        let product = self.ledger.execute("products.update", |uow| {
            let mut product = uow.load::<Product>(product_id.record_id())?;
            uow.execute(
                &mut product,
                ProductCommand::UpdateProduct(UpdateProduct {
                    product_id,
                    name: changes.name,
                    description: changes.description,
                    price: changes.price,
                    cost_price: changes.cost_price,
                    min_stock_level: changes.min_stock_level,
                    active: changes.active,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(product)
        })?;

        tracing::info!(product_id = %product_id, "product updated");
        Ok(product)
    }

    /// Soft delete. Refused while open orders hold reservations on the product.
    pub fn delete(&self, product_id: ProductId) -> Result<(), ServiceError> {
        self.ledger.execute("products.delete", |uow| {
            let mut product = uow.load::<Product>(product_id.record_id())?;
            uow.execute(
                &mut product,
                ProductCommand::DeleteProduct(DeleteProduct {
                    product_id,
                    occurred_at: Utc::now(),
                }),
            )
        })?;

        tracing::info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    /// Manual stock correction (goods received, shrinkage, stock take).
    pub fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<Product, ServiceError> {
        let product = self.ledger.execute("products.adjust_stock", |uow| {
            let mut product = uow.load::<Product>(product_id.record_id())?;
            uow.execute(
                &mut product,
                ProductCommand::AdjustStock(AdjustStock {
                    product_id,
                    delta,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(product)
        })?;

        tracing::info!(
            product_id = %product_id,
            delta,
            on_hand = product.quantity_in_stock(),
            "stock adjusted"
        );
        Ok(product)
    }

    pub fn get(&self, product_id: ProductId) -> Result<Product, ServiceError> {
        self.ledger
            .read(|view| view.products().find_by_id(product_id.record_id()))?
            .ok_or_else(|| DomainError::not_found(Product::ENTITY, product_id).into())
    }

    pub fn find_by_sku(&self, sku: &str) -> Result<Product, ServiceError> {
        let sku = sku.trim();
        self.ledger
            .read(|view| view.products().find_by_key(sku))?
            .ok_or_else(|| DomainError::not_found(Product::ENTITY, sku).into())
    }

    pub fn list(&self) -> Result<Vec<Product>, ServiceError> {
        self.ledger.read(|view| view.products().all())
    }

    pub fn list_active(&self) -> Result<Vec<Product>, ServiceError> {
        self.ledger
            .read(|view| view.products().find_where(&|p: &Product| p.is_active()))
    }

    pub fn low_stock(&self) -> Result<Vec<Product>, ServiceError> {
        self.ledger
            .read(|view| view.products().find_where(&|p: &Product| p.is_low_stock()))
    }

    /// Case-insensitive match on name or description.
    pub fn search(&self, keyword: &str) -> Result<Vec<Product>, ServiceError> {
        let needle = keyword.trim().to_lowercase();
        self.ledger.read(|view| {
            view.products().find_where(&|p: &Product| {
                p.name().to_lowercase().contains(&needle)
                    || p
                        .description()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
        })
    }
}
