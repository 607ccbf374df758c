use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use orderflow_core::{BusinessKeyPrefix, DomainError, business_key};
use orderflow_customers::{
    Address, Customer, CustomerCommand, CustomerId, CustomerSegment, DeleteCustomer,
    RegisterCustomer, SetCustomerActive, UpdateCustomer, normalize_email,
};
use orderflow_events::EventBus;

use crate::ledger::{LedgerRecord, LedgerStore};

use super::error::ServiceError;
use super::ledger::{JsonEnvelope, Ledger};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
}

/// Customer master data.
pub struct CustomerService<S, B> {
    ledger: Arc<Ledger<S, B>>,
}

impl<S, B> CustomerService<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(ledger: Arc<Ledger<S, B>>) -> Self {
        Self { ledger }
    }

    pub fn register(&self, request: NewCustomer) -> Result<Customer, ServiceError> {
        let customer = self.ledger.execute("customers.register", |uow| {
            let email = normalize_email(&request.email)?;
            if uow.exists_by_key::<Customer>(&email) {
                return Err(DomainError::invalid_request(format!(
                    "customer with email {email} already exists"
                ))
                .into());
            }

            let customer_id = CustomerId::new(uow.next_id::<Customer>());
            let mut customer = Customer::empty(customer_id);
            uow.execute(
                &mut customer,
                CustomerCommand::RegisterCustomer(RegisterCustomer {
                    customer_id,
                    customer_code: business_key(BusinessKeyPrefix::Customer),
                    first_name: request.first_name,
                    last_name: request.last_name,
                    email,
                    phone: request.phone,
                    company_name: request.company_name,
                    billing_address: request.billing_address,
                    shipping_address: request.shipping_address,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(customer)
        })?;

        tracing::info!(
            customer_id = %customer.id_typed(),
            customer_code = customer.customer_code(),
            "customer registered"
        );
        Ok(customer)
    }

    pub fn update(&self, customer_id: CustomerId, changes: CustomerChanges) -> Result<Customer, ServiceError> {
        let customer = self.ledger.execute("customers.update", |uow| {
            let mut customer = uow.load::<Customer>(customer_id.record_id())?;

            let email = match changes.email {
                Some(raw) => {
                    let email = normalize_email(&raw)?;
                    if email != customer.email() && uow.exists_by_key::<Customer>(&email) {
                        return Err(DomainError::invalid_request(format!(
                            "customer with email {email} already exists"
                        ))
                        .into());
                    }
                    Some(email)
                }
                None => None,
            };

            uow.execute(
                &mut customer,
                CustomerCommand::UpdateCustomer(UpdateCustomer {
                    customer_id,
                    first_name: changes.first_name,
                    last_name: changes.last_name,
                    email,
                    phone: changes.phone,
                    company_name: changes.company_name,
                    billing_address: changes.billing_address,
                    shipping_address: changes.shipping_address,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(customer)
        })?;

        tracing::info!(customer_id = %customer_id, "customer updated");
        Ok(customer)
    }

    pub fn set_active(&self, customer_id: CustomerId, active: bool) -> Result<Customer, ServiceError> {
        let customer = self.ledger.execute("customers.set_active", |uow| {
            let mut customer = uow.load::<Customer>(customer_id.record_id())?;
            uow.execute(
                &mut customer,
                CustomerCommand::SetCustomerActive(SetCustomerActive {
                    customer_id,
                    active,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(customer)
        })?;

        tracing::info!(customer_id = %customer_id, active, "customer activity changed");
        Ok(customer)
    }

    pub fn delete(&self, customer_id: CustomerId) -> Result<(), ServiceError> {
        self.ledger.execute("customers.delete", |uow| {
            let mut customer = uow.load::<Customer>(customer_id.record_id())?;
            uow.execute(
                &mut customer,
                CustomerCommand::DeleteCustomer(DeleteCustomer {
                    customer_id,
                    occurred_at: Utc::now(),
                }),
            )
        })?;

        tracing::info!(customer_id = %customer_id, "customer deleted");
        Ok(())
    }

    pub fn get(&self, customer_id: CustomerId) -> Result<Customer, ServiceError> {
        self.ledger
            .read(|view| view.customers().find_by_id(customer_id.record_id()))?
            .ok_or_else(|| DomainError::not_found(Customer::ENTITY, customer_id).into())
    }

    pub fn find_by_email(&self, email: &str) -> Result<Customer, ServiceError> {
        let email = normalize_email(email)?;
        self.ledger
            .read(|view| view.customers().find_by_key(&email))?
            .ok_or_else(|| DomainError::not_found(Customer::ENTITY, email).into())
    }

    pub fn find_by_code(&self, code: &str) -> Result<Customer, ServiceError> {
        self.ledger
            .read(|view| view.customers().find_by_key(code))?
            .ok_or_else(|| DomainError::not_found(Customer::ENTITY, code).into())
    }

    pub fn list(&self) -> Result<Vec<Customer>, ServiceError> {
        self.ledger.read(|view| view.customers().all())
    }

    pub fn list_active(&self) -> Result<Vec<Customer>, ServiceError> {
        self.ledger
            .read(|view| view.customers().find_where(&|c: &Customer| c.is_active()))
    }

    pub fn list_by_segment(&self, segment: CustomerSegment) -> Result<Vec<Customer>, ServiceError> {
        self.ledger
            .read(|view| view.customers().find_where(&|c: &Customer| c.segment() == segment))
    }
}
