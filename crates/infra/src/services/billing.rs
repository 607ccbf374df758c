//! Billing engine: invoices derived from orders.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use orderflow_core::{BusinessKeyPrefix, DomainError, business_key};
use orderflow_customers::CustomerId;
use orderflow_events::EventBus;
use orderflow_invoicing::{
    ChangeInvoiceStatus, GenerateInvoice, Invoice, InvoiceCommand, InvoiceId, InvoiceStatus,
    MarkInvoicePaid, due_date_from,
};
use orderflow_sales::{Order, OrderId};

use crate::config::BillingPolicy;
use crate::ledger::{LedgerRecord, LedgerStore};

use super::error::ServiceError;
use super::ledger::{JsonEnvelope, Ledger};

pub struct BillingEngine<S, B> {
    ledger: Arc<Ledger<S, B>>,
    policy: BillingPolicy,
}

impl<S, B> BillingEngine<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(ledger: Arc<Ledger<S, B>>, policy: BillingPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Issue the (single) invoice of an order, dated today.
    pub fn generate_for_order(&self, order_id: OrderId) -> Result<Invoice, ServiceError> {
        let due_days = self.policy.due_days;
        let invoice = self.ledger.execute("invoices.generate", |uow| {
            let now = Utc::now();
            let order = uow.load::<Order>(order_id.record_id())?;

            let existing = uow
                .view()
                .invoices()
                .find_where(&|i: &Invoice| i.order_id() == order_id);
            if let Some(invoice) = existing.first() {
                return Err(DomainError::invalid_request(format!(
                    "invoice {} already exists for order {}",
                    invoice.invoice_number(),
                    order.order_number()
                ))
                .into());
            }

            let invoice_date = now.date_naive();
            let invoice_id = InvoiceId::new(uow.next_id::<Invoice>());
            let mut invoice = Invoice::empty(invoice_id);
            uow.execute(
                &mut invoice,
                InvoiceCommand::GenerateInvoice(GenerateInvoice {
                    invoice_id,
                    invoice_number: business_key(BusinessKeyPrefix::Invoice),
                    order_id,
                    order_number: order.order_number().to_string(),
                    order_status: order.status(),
                    customer_id: order.customer_id(),
                    subtotal: order.subtotal(),
                    tax_amount: order.tax_amount(),
                    total_amount: order.total_amount(),
                    invoice_date,
                    due_date: due_date_from(invoice_date, due_days)?,
                    occurred_at: now,
                }),
            )?;
            Ok(invoice)
        })?;

        tracing::info!(
            invoice_id = %invoice.id_typed(),
            invoice_number = invoice.invoice_number(),
            order_id = %order_id,
            total = %invoice.total_amount(),
            "invoice generated"
        );
        Ok(invoice)
    }

    /// Manual status change through the invoice status table.
    pub fn update_status(&self, invoice_id: InvoiceId, status: InvoiceStatus) -> Result<Invoice, ServiceError> {
        let invoice = self.ledger.execute("invoices.update_status", |uow| {
            let mut invoice = uow.load::<Invoice>(invoice_id.record_id())?;
            uow.execute(
                &mut invoice,
                InvoiceCommand::ChangeInvoiceStatus(ChangeInvoiceStatus {
                    invoice_id,
                    status,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(invoice)
        })?;

        tracing::info!(invoice_id = %invoice_id, status = %status, "invoice status changed");
        Ok(invoice)
    }

    /// Settle in full, whatever the current status.
    pub fn mark_as_paid(&self, invoice_id: InvoiceId) -> Result<Invoice, ServiceError> {
        let invoice = self.ledger.execute("invoices.mark_paid", |uow| {
            let mut invoice = uow.load::<Invoice>(invoice_id.record_id())?;
            uow.execute(
                &mut invoice,
                InvoiceCommand::MarkInvoicePaid(MarkInvoicePaid {
                    invoice_id,
                    occurred_at: Utc::now(),
                }),
            )?;
            Ok(invoice)
        })?;

        tracing::info!(
            invoice_id = %invoice_id,
            invoice_number = invoice.invoice_number(),
            "invoice marked as paid"
        );
        Ok(invoice)
    }

    pub fn get(&self, invoice_id: InvoiceId) -> Result<Invoice, ServiceError> {
        self.ledger
            .read(|view| view.invoices().find_by_id(invoice_id.record_id()))?
            .ok_or_else(|| DomainError::not_found(Invoice::ENTITY, invoice_id).into())
    }

    pub fn find_by_number(&self, invoice_number: &str) -> Result<Invoice, ServiceError> {
        self.ledger
            .read(|view| view.invoices().find_by_key(invoice_number))?
            .ok_or_else(|| DomainError::not_found(Invoice::ENTITY, invoice_number).into())
    }

    pub fn find_for_order(&self, order_id: OrderId) -> Result<Invoice, ServiceError> {
        self.ledger
            .read(|view| {
                view.invoices()
                    .find_where(&|i: &Invoice| i.order_id() == order_id)
                    .into_iter()
                    .next()
            })?
            .ok_or_else(|| DomainError::not_found(Invoice::ENTITY, format!("order {order_id}")).into())
    }

    pub fn list(&self) -> Result<Vec<Invoice>, ServiceError> {
        self.ledger.read(|view| view.invoices().all())
    }

    pub fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Invoice>, ServiceError> {
        self.ledger
            .read(|view| view.invoices().find_where(&|i: &Invoice| i.customer_id() == customer_id))
    }

    /// SENT invoices whose due date is before `today`.
    pub fn list_overdue(&self, today: NaiveDate) -> Result<Vec<Invoice>, ServiceError> {
        self.ledger
            .read(|view| view.invoices().find_where(&|i: &Invoice| i.is_overdue(today)))
    }
}
