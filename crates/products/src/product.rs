use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{Aggregate, AggregateRoot, DomainError, Money, RecordMeta, record_id_newtype};
use orderflow_events::Event;
use orderflow_inventory::{StockLevel, StockMovement};

record_id_newtype!(
    /// Product identifier.
    ProductId
);

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    description: Option<String>,
    price: Money,
    cost_price: Option<Money>,
    stock: StockLevel,
    min_stock_level: Option<i64>,
    active: bool,
    meta: RecordMeta,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            sku: String::new(),
            name: String::new(),
            description: None,
            price: Decimal::ZERO,
            cost_price: None,
            stock: StockLevel::default(),
            min_stock_level: None,
            active: false,
            meta: RecordMeta::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn cost_price(&self) -> Option<Money> {
        self.cost_price
    }

    pub fn stock(&self) -> StockLevel {
        self.stock
    }

    pub fn quantity_in_stock(&self) -> i64 {
        self.stock.on_hand()
    }

    pub fn reserved_quantity(&self) -> i64 {
        self.stock.reserved()
    }

    pub fn available_stock(&self) -> i64 {
        self.stock.available()
    }

    pub fn min_stock_level(&self) -> Option<i64> {
        self.min_stock_level
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock.is_low(self.min_stock_level)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.is_deleted()
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub initial_stock: i64,
    pub min_stock_level: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProduct. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub cost_price: Option<Money>,
    pub min_stock_level: Option<i64>,
    pub active: Option<bool>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteProduct (soft delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReserveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReleaseStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CommitStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    UpdateProduct(UpdateProduct),
    DeleteProduct(DeleteProduct),
    ReserveStock(ReserveStock),
    ReleaseStock(ReleaseStock),
    CommitStock(CommitStock),
    AdjustStock(AdjustStock),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub initial_stock: i64,
    pub min_stock_level: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductUpdated. Carries the full set of details after the update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub min_stock_level: Option<i64>,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockMoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub product_id: ProductId,
    pub movement: StockMovement,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductUpdated(ProductUpdated),
    ProductDeleted(ProductDeleted),
    StockMoved(StockMoved),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::ProductUpdated(_) => "products.product.updated",
            ProductEvent::ProductDeleted(_) => "products.product.deleted",
            ProductEvent::StockMoved(_) => "products.product.stock_moved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductUpdated(e) => e.occurred_at,
            ProductEvent::ProductDeleted(e) => e.occurred_at,
            ProductEvent::StockMoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.price = e.price;
                self.cost_price = e.cost_price;
                self.stock = StockLevel::new(e.initial_stock).unwrap_or_default();
                self.min_stock_level = e.min_stock_level;
                self.active = true;
                self.meta = RecordMeta::created(e.occurred_at);
                self.created = true;
            }
            ProductEvent::ProductUpdated(e) => {
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.price = e.price;
                self.cost_price = e.cost_price;
                self.min_stock_level = e.min_stock_level;
                self.active = e.active;
                self.meta.touch(e.occurred_at);
            }
            ProductEvent::ProductDeleted(e) => {
                self.active = false;
                self.meta.mark_deleted(e.occurred_at);
            }
            ProductEvent::StockMoved(e) => {
                self.stock.apply(&e.movement);
                self.meta.touch(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::UpdateProduct(cmd) => self.handle_update(cmd),
            ProductCommand::DeleteProduct(cmd) => self.handle_delete(cmd),
            ProductCommand::ReserveStock(cmd) => {
                self.ensure_live(cmd.product_id)?;
                if !self.active {
                    return Err(DomainError::invalid_request(format!(
                        "product {} is not available for sale",
                        self.sku
                    )));
                }
                self.stock_moved(cmd.product_id, self.stock.reserve(cmd.quantity), cmd.occurred_at)
            }
            ProductCommand::ReleaseStock(cmd) => {
                self.ensure_live(cmd.product_id)?;
                self.stock_moved(cmd.product_id, self.stock.release(cmd.quantity), cmd.occurred_at)
            }
            ProductCommand::CommitStock(cmd) => {
                self.ensure_live(cmd.product_id)?;
                self.stock_moved(cmd.product_id, self.stock.commit(cmd.quantity), cmd.occurred_at)
            }
            ProductCommand::AdjustStock(cmd) => {
                self.ensure_live(cmd.product_id)?;
                self.stock_moved(cmd.product_id, self.stock.adjust(cmd.delta), cmd.occurred_at)
            }
        }
    }
}

fn ensure_non_negative(field: &str, amount: Money) -> Result<(), DomainError> {
    if amount < Decimal::ZERO {
        return Err(DomainError::invalid_request(format!("{field} cannot be negative")));
    }
    Ok(())
}

fn ensure_min_level(min_stock_level: Option<i64>) -> Result<(), DomainError> {
    if min_stock_level.is_some_and(|m| m < 0) {
        return Err(DomainError::invalid_request("min stock level cannot be negative"));
    }
    Ok(())
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn ensure_live(&self, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created || self.meta.is_deleted() {
            return Err(DomainError::not_found("product", product_id));
        }
        self.ensure_product_id(product_id)
    }

    fn stock_moved(
        &self,
        product_id: ProductId,
        decided: Result<StockMovement, orderflow_inventory::StockError>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        let movement = decided.map_err(|e| e.into_domain(&self.sku))?;
        Ok(vec![ProductEvent::StockMoved(StockMoved {
            product_id,
            movement,
            occurred_at,
        })])
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }
        if cmd.sku.trim().is_empty() {
            return Err(DomainError::invalid_request("SKU cannot be empty"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::invalid_request("name cannot be empty"));
        }
        ensure_non_negative("price", cmd.price)?;
        if let Some(cost) = cmd.cost_price {
            ensure_non_negative("cost price", cost)?;
        }
        if cmd.initial_stock < 0 {
            return Err(DomainError::invalid_request("initial stock cannot be negative"));
        }
        ensure_min_level(cmd.min_stock_level)?;

        // SKU uniqueness is checked against the ledger by the catalog service.
        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            sku: cmd.sku.trim().to_string(),
            name: cmd.name.trim().to_string(),
            description: cmd.description.clone(),
            price: cmd.price,
            cost_price: cmd.cost_price,
            initial_stock: cmd.initial_stock,
            min_stock_level: cmd.min_stock_level,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.product_id)?;

        let name = match &cmd.name {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::invalid_request("name cannot be empty"));
            }
            Some(name) => name.trim().to_string(),
            None => self.name.clone(),
        };
        let price = cmd.price.unwrap_or(self.price);
        ensure_non_negative("price", price)?;
        let cost_price = cmd.cost_price.or(self.cost_price);
        if let Some(cost) = cost_price {
            ensure_non_negative("cost price", cost)?;
        }
        let min_stock_level = cmd.min_stock_level.or(self.min_stock_level);
        ensure_min_level(min_stock_level)?;

        Ok(vec![ProductEvent::ProductUpdated(ProductUpdated {
            product_id: cmd.product_id,
            name,
            description: cmd.description.clone().or_else(|| self.description.clone()),
            price,
            cost_price,
            min_stock_level,
            active: cmd.active.unwrap_or(self.active),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.product_id)?;
        if self.stock.reserved() > 0 {
            return Err(DomainError::invalid_request(format!(
                "product {} has {} units reserved by open orders",
                self.sku,
                self.stock.reserved()
            )));
        }
        Ok(vec![ProductEvent::ProductDeleted(ProductDeleted {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_events::execute;
    use rust_decimal_macros::dec;

    fn test_product_id() -> ProductId {
        ProductId::from(1)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(initial_stock: i64) -> CreateProduct {
        CreateProduct {
            product_id: test_product_id(),
            sku: "SKU-001".to_string(),
            name: "Widget".to_string(),
            description: Some("A widget".to_string()),
            price: dec!(10.00),
            cost_price: Some(dec!(6.50)),
            initial_stock,
            min_stock_level: Some(2),
            occurred_at: test_time(),
        }
    }

    fn created_product(initial_stock: i64) -> Product {
        let mut product = Product::empty(test_product_id());
        execute(&mut product, &ProductCommand::CreateProduct(create_cmd(initial_stock))).unwrap();
        product
    }

    fn reserve(quantity: i64) -> ProductCommand {
        ProductCommand::ReserveStock(ReserveStock {
            product_id: test_product_id(),
            quantity,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn create_product_emits_created_event_and_applies_stock() {
        let product = created_product(10);
        assert_eq!(product.sku(), "SKU-001");
        assert_eq!(product.price(), dec!(10.00));
        assert_eq!(product.quantity_in_stock(), 10);
        assert_eq!(product.reserved_quantity(), 0);
        assert!(product.is_active());
        assert_eq!(product.version(), 1);
        assert!(product.meta().created_at.is_some());
    }

    #[test]
    fn create_product_rejects_bad_input() {
        let product = Product::empty(test_product_id());

        let mut blank_sku = create_cmd(1);
        blank_sku.sku = "  ".to_string();
        let mut negative_price = create_cmd(1);
        negative_price.price = dec!(-1);
        let negative_stock = create_cmd(-5);

        for cmd in [blank_sku, negative_price, negative_stock] {
            match product.handle(&ProductCommand::CreateProduct(cmd)).unwrap_err() {
                DomainError::InvalidRequest(_) => {}
                other => panic!("expected InvalidRequest, got {other:?}"),
            }
        }
    }

    #[test]
    fn create_product_rejects_duplicate_creation() {
        let product = created_product(1);
        let err = product.handle(&ProductCommand::CreateProduct(create_cmd(1))).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn reserve_and_release_move_reserved_counter() {
        let mut product = created_product(10);
        execute(&mut product, &reserve(4)).unwrap();
        assert_eq!(product.reserved_quantity(), 4);
        assert_eq!(product.available_stock(), 6);

        execute(
            &mut product,
            &ProductCommand::ReleaseStock(ReleaseStock {
                product_id: test_product_id(),
                quantity: 9,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(product.reserved_quantity(), 0);
        assert_eq!(product.quantity_in_stock(), 10);
    }

    #[test]
    fn over_reservation_reports_sku_and_leaves_state() {
        let mut product = created_product(3);
        let before = product.clone();
        match execute(&mut product, &reserve(4)).unwrap_err() {
            DomainError::InsufficientStock {
                product: sku,
                requested,
                available,
            } => {
                assert_eq!(sku, "SKU-001");
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(product, before);
    }

    #[test]
    fn inactive_products_cannot_be_reserved() {
        let mut product = created_product(3);
        execute(
            &mut product,
            &ProductCommand::UpdateProduct(UpdateProduct {
                product_id: test_product_id(),
                active: Some(false),
                occurred_at: test_time(),
                ..UpdateProduct::default()
            }),
        )
        .unwrap();
        assert!(matches!(
            product.handle(&reserve(1)).unwrap_err(),
            DomainError::InvalidRequest(_)
        ));
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let mut product = created_product(3);
        execute(
            &mut product,
            &ProductCommand::UpdateProduct(UpdateProduct {
                product_id: test_product_id(),
                price: Some(dec!(12.50)),
                occurred_at: test_time(),
                ..UpdateProduct::default()
            }),
        )
        .unwrap();
        assert_eq!(product.price(), dec!(12.50));
        assert_eq!(product.name(), "Widget");
        assert_eq!(product.cost_price(), Some(dec!(6.50)));
        assert_eq!(product.min_stock_level(), Some(2));
    }

    #[test]
    fn delete_is_soft_and_blocks_further_commands() {
        let mut product = created_product(3);
        execute(
            &mut product,
            &ProductCommand::DeleteProduct(DeleteProduct {
                product_id: test_product_id(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert!(product.is_deleted());
        assert!(!product.is_active());
        assert!(matches!(
            product.handle(&reserve(1)).unwrap_err(),
            DomainError::NotFound { entity: "product", .. }
        ));
    }

    #[test]
    fn delete_rejected_while_stock_is_reserved() {
        let mut product = created_product(3);
        execute(&mut product, &reserve(1)).unwrap();
        let err = product
            .handle(&ProductCommand::DeleteProduct(DeleteProduct {
                product_id: test_product_id(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[test]
    fn low_stock_flag_follows_available_stock() {
        let mut product = created_product(5);
        assert!(!product.is_low_stock());
        execute(&mut product, &reserve(3)).unwrap();
        assert!(product.is_low_stock());
    }

    #[test]
    fn commands_against_missing_product_are_not_found() {
        let product = Product::empty(test_product_id());
        assert!(matches!(
            product.handle(&reserve(1)).unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property-based tests
    // ─────────────────────────────────────────────────────────────────────────

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: replaying the emitted events on a fresh aggregate yields
            /// the same stock counters and version.
            #[test]
            fn replay_is_deterministic(
                initial in 0i64..50,
                reservations in prop::collection::vec(1i64..10, 0..10)
            ) {
                let mut product = Product::empty(test_product_id());
                let mut history = execute(
                    &mut product,
                    &ProductCommand::CreateProduct(create_cmd(initial)),
                ).unwrap();
                for qty in reservations {
                    if let Ok(events) = execute(&mut product, &reserve(qty)) {
                        history.extend(events);
                    }
                }

                let mut replayed = Product::empty(test_product_id());
                for event in &history {
                    replayed.apply(event);
                }
                prop_assert_eq!(replayed.stock(), product.stock());
                prop_assert_eq!(replayed.version(), product.version());
                prop_assert!(product.reserved_quantity() <= product.quantity_in_stock());
            }
        }
    }
}
