use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{Aggregate, AggregateRoot, DomainError, Money, RecordMeta, record_id_newtype};
use orderflow_customers::CustomerId;
use orderflow_events::Event;
use orderflow_sales::{OrderId, OrderStatus};

use crate::status::InvoiceStatus;

record_id_newtype!(
    /// Invoice identifier.
    InvoiceId
);

/// `invoice_date + due_days`.
pub fn due_date_from(invoice_date: NaiveDate, due_days: u32) -> Result<NaiveDate, DomainError> {
    invoice_date
        .checked_add_days(Days::new(u64::from(due_days)))
        .ok_or_else(|| DomainError::invalid_request("due date out of range"))
}

/// Aggregate root: Invoice.
///
/// `paid_amount` never decreases and never exceeds `total_amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: String,
    order_id: OrderId,
    customer_id: CustomerId,
    invoice_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    status: InvoiceStatus,
    subtotal: Money,
    tax_amount: Money,
    total_amount: Money,
    paid_amount: Money,
    paid_at: Option<DateTime<Utc>>,
    meta: RecordMeta,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            invoice_number: String::new(),
            order_id: OrderId::default(),
            customer_id: CustomerId::default(),
            invoice_date: None,
            due_date: None,
            status: InvoiceStatus::Draft,
            subtotal: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            paid_at: None,
            meta: RecordMeta::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn invoice_date(&self) -> Option<NaiveDate> {
        self.invoice_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax_amount(&self) -> Money {
        self.tax_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    pub fn balance_amount(&self) -> Money {
        self.total_amount - self.paid_amount
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Overdue iff it was sent and the due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Sent && self.due_date.is_some_and(|due| due < today)
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.is_deleted()
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: GenerateInvoice.
///
/// Carries the order snapshot the invoice is derived from. At most one invoice
/// per order is enforced by the billing engine against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateInvoice {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub order_id: OrderId,
    pub order_number: String,
    pub order_status: OrderStatus,
    pub customer_id: CustomerId,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeInvoiceStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInvoiceStatus {
    pub invoice_id: InvoiceId,
    pub status: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkInvoicePaid. Settles the invoice in full, whatever its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoicePaid {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApplyPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    GenerateInvoice(GenerateInvoice),
    ChangeInvoiceStatus(ChangeInvoiceStatus),
    MarkInvoicePaid(MarkInvoicePaid),
    ApplyPayment(ApplyPayment),
}

/// Event: InvoiceGenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceGenerated {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStatusChanged {
    pub invoice_id: InvoiceId,
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentApplied. `paid_amount` is the running total after this payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplied {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub paid_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoicePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaid {
    pub invoice_id: InvoiceId,
    pub from: InvoiceStatus,
    pub paid_amount: Money,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceGenerated(InvoiceGenerated),
    InvoiceStatusChanged(InvoiceStatusChanged),
    PaymentApplied(PaymentApplied),
    InvoicePaid(InvoicePaid),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceGenerated(_) => "invoicing.invoice.generated",
            InvoiceEvent::InvoiceStatusChanged(_) => "invoicing.invoice.status_changed",
            InvoiceEvent::PaymentApplied(_) => "invoicing.invoice.payment_applied",
            InvoiceEvent::InvoicePaid(_) => "invoicing.invoice.paid",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceGenerated(e) => e.occurred_at,
            InvoiceEvent::InvoiceStatusChanged(e) => e.occurred_at,
            InvoiceEvent::PaymentApplied(e) => e.occurred_at,
            InvoiceEvent::InvoicePaid(e) => e.paid_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceGenerated(e) => {
                self.id = e.invoice_id;
                self.invoice_number = e.invoice_number.clone();
                self.order_id = e.order_id;
                self.customer_id = e.customer_id;
                self.subtotal = e.subtotal;
                self.tax_amount = e.tax_amount;
                self.total_amount = e.total_amount;
                self.paid_amount = Decimal::ZERO;
                self.invoice_date = Some(e.invoice_date);
                self.due_date = Some(e.due_date);
                self.status = InvoiceStatus::Draft;
                self.meta = RecordMeta::created(e.occurred_at);
                self.created = true;
            }
            InvoiceEvent::InvoiceStatusChanged(e) => {
                self.status = e.to;
                self.meta.touch(e.occurred_at);
            }
            InvoiceEvent::PaymentApplied(e) => {
                self.paid_amount = e.paid_amount;
                self.meta.touch(e.occurred_at);
            }
            InvoiceEvent::InvoicePaid(e) => {
                self.status = InvoiceStatus::Paid;
                self.paid_amount = e.paid_amount;
                self.paid_at = Some(e.paid_at);
                self.meta.touch(e.paid_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::GenerateInvoice(cmd) => self.handle_generate(cmd),
            InvoiceCommand::ChangeInvoiceStatus(cmd) => self.handle_change_status(cmd),
            InvoiceCommand::MarkInvoicePaid(cmd) => self.handle_mark_paid(cmd),
            InvoiceCommand::ApplyPayment(cmd) => self.handle_apply_payment(cmd),
        }
    }
}

impl Invoice {
    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn ensure_live(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if !self.created || self.meta.is_deleted() {
            return Err(DomainError::not_found("invoice", invoice_id));
        }
        self.ensure_invoice_id(invoice_id)
    }

    fn handle_generate(&self, cmd: &GenerateInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }
        if !cmd.order_status.is_invoiceable() {
            return Err(DomainError::invalid_request(format!(
                "cannot generate invoice for order {} in status {}",
                cmd.order_number, cmd.order_status
            )));
        }
        if cmd.due_date < cmd.invoice_date {
            return Err(DomainError::invalid_request("due date cannot precede invoice date"));
        }
        if cmd.total_amount < Decimal::ZERO {
            return Err(DomainError::invariant("invoice total cannot be negative"));
        }

        Ok(vec![InvoiceEvent::InvoiceGenerated(InvoiceGenerated {
            invoice_id: cmd.invoice_id,
            invoice_number: cmd.invoice_number.clone(),
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            subtotal: cmd.subtotal,
            tax_amount: cmd.tax_amount,
            total_amount: cmd.total_amount,
            invoice_date: cmd.invoice_date,
            due_date: cmd.due_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeInvoiceStatus,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_live(cmd.invoice_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_request(format!(
                "invoice {} cannot move from {} to {}",
                self.invoice_number, self.status, cmd.status
            )));
        }

        Ok(vec![InvoiceEvent::InvoiceStatusChanged(InvoiceStatusChanged {
            invoice_id: cmd.invoice_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_paid(&self, cmd: &MarkInvoicePaid) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_live(cmd.invoice_id)?;

        Ok(vec![InvoiceEvent::InvoicePaid(InvoicePaid {
            invoice_id: cmd.invoice_id,
            from: self.status,
            paid_amount: self.total_amount,
            paid_at: cmd.occurred_at,
        })])
    }

    fn handle_apply_payment(&self, cmd: &ApplyPayment) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_live(cmd.invoice_id)?;

        if self.status == InvoiceStatus::Cancelled {
            return Err(DomainError::invalid_request(format!(
                "invoice {} is cancelled",
                self.invoice_number
            )));
        }
        if cmd.amount <= Decimal::ZERO {
            return Err(DomainError::invalid_request("payment amount must be positive"));
        }
        if cmd.amount > self.balance_amount() {
            return Err(DomainError::invalid_request(format!(
                "payment amount {} exceeds invoice balance {}",
                cmd.amount,
                self.balance_amount()
            )));
        }

        let paid_amount = self.paid_amount + cmd.amount;
        let mut events = vec![InvoiceEvent::PaymentApplied(PaymentApplied {
            invoice_id: cmd.invoice_id,
            amount: cmd.amount,
            paid_amount,
            occurred_at: cmd.occurred_at,
        })];
        if paid_amount >= self.total_amount {
            events.push(InvoiceEvent::InvoicePaid(InvoicePaid {
                invoice_id: cmd.invoice_id,
                from: self.status,
                paid_amount: self.total_amount,
                paid_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }
}
