use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{
    Aggregate, AggregateRoot, DomainError, Money, RecordMeta, ValueObject, money_in_range,
    record_id_newtype,
};
use orderflow_events::Event;

use crate::segment::{CustomerSegment, segment_for};

record_id_newtype!(
    /// Customer identifier.
    CustomerId
);

/// Postal address (billing or shipping).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

impl ValueObject for Address {}

/// Aggregate root: Customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    customer_code: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    company_name: Option<String>,
    billing_address: Option<Address>,
    shipping_address: Option<Address>,
    segment: CustomerSegment,
    total_orders: u64,
    total_spent: Money,
    active: bool,
    meta: RecordMeta,
    version: u64,
    created: bool,
}

impl Customer {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: CustomerId) -> Self {
        Self {
            id,
            customer_code: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            company_name: None,
            billing_address: None,
            shipping_address: None,
            segment: CustomerSegment::Regular,
            total_orders: 0,
            total_spent: Decimal::ZERO,
            active: false,
            meta: RecordMeta::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn customer_code(&self) -> &str {
        &self.customer_code
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    pub fn segment(&self) -> CustomerSegment {
        self.segment
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    pub fn total_spent(&self) -> Money {
        self.total_spent
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

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub customer_id: CustomerId,
    pub customer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCustomer. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub customer_id: CustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCustomerActive (activate / deactivate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCustomerActive {
    pub customer_id: CustomerId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteCustomer (soft delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCustomer {
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordOrder. Adds a placed order to the running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOrder {
    pub customer_id: CustomerId,
    pub order_total: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerCommand {
    RegisterCustomer(RegisterCustomer),
    UpdateCustomer(UpdateCustomer),
    SetCustomerActive(SetCustomerActive),
    DeleteCustomer(DeleteCustomer),
    RecordOrder(RecordOrder),
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub customer_id: CustomerId,
    pub customer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerUpdated. Carries the full set of details after the update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdated {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerActivityChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerActivityChanged {
    pub customer_id: CustomerId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDeleted {
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderRecorded. Carries the totals after the order was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecorded {
    pub customer_id: CustomerId,
    pub order_total: Money,
    pub total_orders: u64,
    pub total_spent: Money,
    pub segment: CustomerSegment,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    CustomerRegistered(CustomerRegistered),
    CustomerUpdated(CustomerUpdated),
    CustomerActivityChanged(CustomerActivityChanged),
    CustomerDeleted(CustomerDeleted),
    OrderRecorded(OrderRecorded),
}

impl Event for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => "customers.customer.registered",
            CustomerEvent::CustomerUpdated(_) => "customers.customer.updated",
            CustomerEvent::CustomerActivityChanged(_) => "customers.customer.activity_changed",
            CustomerEvent::CustomerDeleted(_) => "customers.customer.deleted",
            CustomerEvent::OrderRecorded(_) => "customers.customer.order_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerRegistered(e) => e.occurred_at,
            CustomerEvent::CustomerUpdated(e) => e.occurred_at,
            CustomerEvent::CustomerActivityChanged(e) => e.occurred_at,
            CustomerEvent::CustomerDeleted(e) => e.occurred_at,
            CustomerEvent::OrderRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Customer {
    type Command = CustomerCommand;
    type Event = CustomerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CustomerEvent::CustomerRegistered(e) => {
                self.id = e.customer_id;
                self.customer_code = e.customer_code.clone();
                self.first_name = e.first_name.clone();
                self.last_name = e.last_name.clone();
                self.email = e.email.clone();
                self.phone = e.phone.clone();
                self.company_name = e.company_name.clone();
                self.billing_address = e.billing_address.clone();
                self.shipping_address = e.shipping_address.clone();
                self.segment = CustomerSegment::Regular;
                self.total_orders = 0;
                self.total_spent = Decimal::ZERO;
                self.active = true;
                self.meta = RecordMeta::created(e.occurred_at);
                self.created = true;
            }
            CustomerEvent::CustomerUpdated(e) => {
                self.first_name = e.first_name.clone();
                self.last_name = e.last_name.clone();
                self.email = e.email.clone();
                self.phone = e.phone.clone();
                self.company_name = e.company_name.clone();
                self.billing_address = e.billing_address.clone();
                self.shipping_address = e.shipping_address.clone();
                self.meta.touch(e.occurred_at);
            }
            CustomerEvent::CustomerActivityChanged(e) => {
                self.active = e.active;
                self.meta.touch(e.occurred_at);
            }
            CustomerEvent::CustomerDeleted(e) => {
                self.active = false;
                self.meta.mark_deleted(e.occurred_at);
            }
            CustomerEvent::OrderRecorded(e) => {
                self.total_orders = e.total_orders;
                self.total_spent = e.total_spent;
                self.segment = e.segment;
                self.meta.touch(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomerCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            CustomerCommand::UpdateCustomer(cmd) => self.handle_update(cmd),
            CustomerCommand::SetCustomerActive(cmd) => self.handle_set_active(cmd),
            CustomerCommand::DeleteCustomer(cmd) => self.handle_delete(cmd),
            CustomerCommand::RecordOrder(cmd) => self.handle_record_order(cmd),
        }
    }
}

/// Trimmed, lowercased email. Rejects anything without a local part and a domain.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(DomainError::invalid_request(format!("invalid email address: {raw}"))),
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_request(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

impl Customer {
    fn ensure_customer_id(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if self.id != customer_id {
            return Err(DomainError::invariant("customer_id mismatch"));
        }
        Ok(())
    }

    fn ensure_live(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if !self.created || self.meta.is_deleted() {
            return Err(DomainError::not_found("customer", customer_id));
        }
        self.ensure_customer_id(customer_id)
    }

    fn handle_register(&self, cmd: &RegisterCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("customer already exists"));
        }

        // Email uniqueness is checked against the ledger by the customer service.
        Ok(vec![CustomerEvent::CustomerRegistered(CustomerRegistered {
            customer_id: cmd.customer_id,
            customer_code: required("customer code", &cmd.customer_code)?,
            first_name: required("first name", &cmd.first_name)?,
            last_name: required("last name", &cmd.last_name)?,
            email: normalize_email(&cmd.email)?,
            phone: cmd.phone.clone(),
            company_name: cmd.company_name.clone(),
            billing_address: cmd.billing_address.clone(),
            shipping_address: cmd.shipping_address.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_live(cmd.customer_id)?;

        let first_name = match &cmd.first_name {
            Some(v) => required("first name", v)?,
            None => self.first_name.clone(),
        };
        let last_name = match &cmd.last_name {
            Some(v) => required("last name", v)?,
            None => self.last_name.clone(),
        };
        let email = match &cmd.email {
            Some(v) => normalize_email(v)?,
            None => self.email.clone(),
        };

        Ok(vec![CustomerEvent::CustomerUpdated(CustomerUpdated {
            customer_id: cmd.customer_id,
            first_name,
            last_name,
            email,
            phone: cmd.phone.clone().or_else(|| self.phone.clone()),
            company_name: cmd.company_name.clone().or_else(|| self.company_name.clone()),
            billing_address: cmd
                .billing_address
                .clone()
                .or_else(|| self.billing_address.clone()),
            shipping_address: cmd
                .shipping_address
                .clone()
                .or_else(|| self.shipping_address.clone()),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_active(&self, cmd: &SetCustomerActive) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_live(cmd.customer_id)?;

        if self.active == cmd.active {
            let state = if cmd.active { "active" } else { "inactive" };
            return Err(DomainError::conflict(format!("customer is already {state}")));
        }

        Ok(vec![CustomerEvent::CustomerActivityChanged(CustomerActivityChanged {
            customer_id: cmd.customer_id,
            active: cmd.active,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_live(cmd.customer_id)?;
        Ok(vec![CustomerEvent::CustomerDeleted(CustomerDeleted {
            customer_id: cmd.customer_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_order(&self, cmd: &RecordOrder) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_live(cmd.customer_id)?;

        if cmd.order_total < Decimal::ZERO {
            return Err(DomainError::invalid_request("order total cannot be negative"));
        }

        let total_spent = money_in_range(self.total_spent.checked_add(cmd.order_total))?;
        Ok(vec![CustomerEvent::OrderRecorded(OrderRecorded {
            customer_id: cmd.customer_id,
            order_total: cmd.order_total,
            total_orders: self.total_orders + 1,
            total_spent,
            segment: segment_for(total_spent),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_events::execute;
    use rust_decimal_macros::dec;

    fn test_customer_id() -> CustomerId {
        CustomerId::from(7)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn register_cmd() -> RegisterCustomer {
        RegisterCustomer {
            customer_id: test_customer_id(),
            customer_code: "CUST-0000ABCD".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "  Ada@Example.COM ".to_string(),
            phone: None,
            company_name: Some("Analytical Engines".to_string()),
            billing_address: None,
            shipping_address: None,
            occurred_at: test_time(),
        }
    }

    fn registered() -> Customer {
        let mut customer = Customer::empty(test_customer_id());
        execute(&mut customer, &CustomerCommand::RegisterCustomer(register_cmd())).unwrap();
        customer
    }

    fn record_order(total: Money) -> CustomerCommand {
        CustomerCommand::RecordOrder(RecordOrder {
            customer_id: test_customer_id(),
            order_total: total,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn register_normalizes_email_and_starts_regular() {
        let customer = registered();
        assert_eq!(customer.email(), "ada@example.com");
        assert_eq!(customer.segment(), CustomerSegment::Regular);
        assert!(customer.is_active());
        assert_eq!(customer.full_name(), "Ada Lovelace");
        assert_eq!(customer.version(), 1);
    }

    #[test]
    fn register_rejects_invalid_email() {
        let mut cmd = register_cmd();
        cmd.email = "not-an-email".to_string();
        let err = Customer::empty(test_customer_id())
            .handle(&CustomerCommand::RegisterCustomer(cmd))
            .unwrap_err();
        match err {
            DomainError::InvalidRequest(msg) => assert!(msg.contains("email")),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn record_order_accumulates_totals_and_promotes_segment() {
        let mut customer = registered();
        execute(&mut customer, &record_order(dec!(40000))).unwrap();
        assert_eq!(customer.total_orders(), 1);
        assert_eq!(customer.segment(), CustomerSegment::Regular);

        execute(&mut customer, &record_order(dec!(20000))).unwrap();
        assert_eq!(customer.total_orders(), 2);
        assert_eq!(customer.total_spent(), dec!(60000));
        assert_eq!(customer.segment(), CustomerSegment::Premium);

        execute(&mut customer, &record_order(dec!(40000.01))).unwrap();
        assert_eq!(customer.segment(), CustomerSegment::Vip);
    }

    #[test]
    fn record_order_past_decimal_range_keeps_totals() {
        let mut customer = registered();
        execute(&mut customer, &record_order(Decimal::MAX)).unwrap();
        let before = customer.clone();

        assert_eq!(
            execute(&mut customer, &record_order(dec!(1))),
            Err(DomainError::invalid_request("amount out of range"))
        );
        assert_eq!(customer, before);
    }

    #[test]
    fn deactivate_twice_is_a_conflict() {
        let mut customer = registered();
        let deactivate = CustomerCommand::SetCustomerActive(SetCustomerActive {
            customer_id: test_customer_id(),
            active: false,
            occurred_at: test_time(),
        });
        execute(&mut customer, &deactivate).unwrap();
        assert!(!customer.is_active());
        assert!(matches!(
            customer.handle(&deactivate).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut customer = registered();
        execute(
            &mut customer,
            &CustomerCommand::UpdateCustomer(UpdateCustomer {
                customer_id: test_customer_id(),
                phone: Some("+1-555-0100".to_string()),
                occurred_at: test_time(),
                ..UpdateCustomer::default()
            }),
        )
        .unwrap();
        assert_eq!(customer.phone(), Some("+1-555-0100"));
        assert_eq!(customer.first_name(), "Ada");
        assert_eq!(customer.company_name(), Some("Analytical Engines"));
    }

    #[test]
    fn deleted_customer_is_not_found() {
        let mut customer = registered();
        execute(
            &mut customer,
            &CustomerCommand::DeleteCustomer(DeleteCustomer {
                customer_id: test_customer_id(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert!(customer.is_deleted());
        assert!(matches!(
            customer.handle(&record_order(dec!(1))).unwrap_err(),
            DomainError::NotFound { entity: "customer", .. }
        ));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let customer = registered();
        let before = customer.clone();
        let _ = customer.handle(&record_order(dec!(10))).unwrap();
        assert_eq!(customer, before);
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

            /// Property: the stored segment always equals the segment of the
            /// accumulated spend, and order count equals the number of orders.
            #[test]
            fn segment_tracks_total_spent(
                totals in prop::collection::vec(0u32..60_000, 0..8)
            ) {
                let mut customer = registered();
                let mut expected = Decimal::ZERO;
                for (i, units) in totals.iter().enumerate() {
                    let amount = Decimal::from(*units);
                    expected += amount;
                    execute(&mut customer, &record_order(amount)).unwrap();
                    prop_assert_eq!(customer.total_orders(), i as u64 + 1);
                }
                prop_assert_eq!(customer.total_spent(), expected);
                prop_assert_eq!(customer.segment(), segment_for(expected));
            }
        }
    }
}
