use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{Aggregate, AggregateRoot, DomainError, Money, RecordMeta, record_id_newtype};
use orderflow_events::Event;
use orderflow_invoicing::InvoiceId;

use crate::status::{PaymentMethod, PaymentStatus};

record_id_newtype!(
    /// Payment identifier.
    PaymentId
);

/// Aggregate root: Payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: PaymentId,
    reference_number: String,
    invoice_id: InvoiceId,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    payment_date: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
    notes: Option<String>,
    meta: RecordMeta,
    version: u64,
    created: bool,
}

impl Payment {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: PaymentId) -> Self {
        Self {
            id,
            reference_number: String::new(),
            invoice_id: InvoiceId::default(),
            method: PaymentMethod::Cash,
            amount: Decimal::ZERO,
            status: PaymentStatus::Pending,
            payment_date: None,
            transaction_id: None,
            notes: None,
            meta: RecordMeta::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.payment_date
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.is_deleted()
    }
}

impl AggregateRoot for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: InitiatePayment. The payment starts out PROCESSING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatePayment {
    pub payment_id: PaymentId,
    pub reference_number: String,
    pub invoice_id: InvoiceId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompletePayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePayment {
    pub payment_id: PaymentId,
    pub transaction_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangePaymentStatus. Completion goes through `CompletePayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePaymentStatus {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentCommand {
    InitiatePayment(InitiatePayment),
    CompletePayment(CompletePayment),
    ChangePaymentStatus(ChangePaymentStatus),
}

/// Event: PaymentInitiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiated {
    pub payment_id: PaymentId,
    pub reference_number: String,
    pub invoice_id: InvoiceId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompleted {
    pub payment_id: PaymentId,
    pub transaction_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusChanged {
    pub payment_id: PaymentId,
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEvent {
    PaymentInitiated(PaymentInitiated),
    PaymentCompleted(PaymentCompleted),
    PaymentStatusChanged(PaymentStatusChanged),
}

impl Event for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentInitiated(_) => "payments.payment.initiated",
            PaymentEvent::PaymentCompleted(_) => "payments.payment.completed",
            PaymentEvent::PaymentStatusChanged(_) => "payments.payment.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PaymentEvent::PaymentInitiated(e) => e.occurred_at,
            PaymentEvent::PaymentCompleted(e) => e.occurred_at,
            PaymentEvent::PaymentStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Payment {
    type Command = PaymentCommand;
    type Event = PaymentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PaymentEvent::PaymentInitiated(e) => {
                self.id = e.payment_id;
                self.reference_number = e.reference_number.clone();
                self.invoice_id = e.invoice_id;
                self.method = e.method;
                self.amount = e.amount;
                self.notes = e.notes.clone();
                self.status = PaymentStatus::Processing;
                self.meta = RecordMeta::created(e.occurred_at);
                self.created = true;
            }
            PaymentEvent::PaymentCompleted(e) => {
                self.status = PaymentStatus::Completed;
                self.transaction_id = Some(e.transaction_id.clone());
                self.payment_date = Some(e.occurred_at);
                self.meta.touch(e.occurred_at);
            }
            PaymentEvent::PaymentStatusChanged(e) => {
                self.status = e.to;
                self.meta.touch(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PaymentCommand::InitiatePayment(cmd) => self.handle_initiate(cmd),
            PaymentCommand::CompletePayment(cmd) => self.handle_complete(cmd),
            PaymentCommand::ChangePaymentStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl Payment {
    fn ensure_live(&self, payment_id: PaymentId) -> Result<(), DomainError> {
        if !self.created || self.meta.is_deleted() {
            return Err(DomainError::not_found("payment", payment_id));
        }
        if self.id != payment_id {
            return Err(DomainError::invariant("payment_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(&self, to: PaymentStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::invalid_request(format!(
                "payment {} cannot move from {} to {}",
                self.reference_number, self.status, to
            )));
        }
        Ok(())
    }

    fn handle_initiate(&self, cmd: &InitiatePayment) -> Result<Vec<PaymentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("payment already exists"));
        }
        if cmd.amount <= Decimal::ZERO {
            return Err(DomainError::invalid_request("payment amount must be positive"));
        }

        Ok(vec![PaymentEvent::PaymentInitiated(PaymentInitiated {
            payment_id: cmd.payment_id,
            reference_number: cmd.reference_number.clone(),
            invoice_id: cmd.invoice_id,
            method: cmd.method,
            amount: cmd.amount,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompletePayment) -> Result<Vec<PaymentEvent>, DomainError> {
        self.ensure_live(cmd.payment_id)?;
        self.ensure_transition(PaymentStatus::Completed)?;
        if cmd.transaction_id.trim().is_empty() {
            return Err(DomainError::invalid_request("transaction id cannot be empty"));
        }

        Ok(vec![PaymentEvent::PaymentCompleted(PaymentCompleted {
            payment_id: cmd.payment_id,
            transaction_id: cmd.transaction_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangePaymentStatus,
    ) -> Result<Vec<PaymentEvent>, DomainError> {
        self.ensure_live(cmd.payment_id)?;
        if cmd.status == PaymentStatus::Completed {
            return Err(DomainError::invalid_request(
                "payment completion requires a transaction id",
            ));
        }
        self.ensure_transition(cmd.status)?;

        Ok(vec![PaymentEvent::PaymentStatusChanged(PaymentStatusChanged {
            payment_id: cmd.payment_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_events::execute;
    use rust_decimal_macros::dec;

    fn test_payment_id() -> PaymentId {
        PaymentId::from(31)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn initiate(amount: Money) -> PaymentCommand {
        PaymentCommand::InitiatePayment(InitiatePayment {
            payment_id: test_payment_id(),
            reference_number: "PAY-1234ABCD".to_string(),
            invoice_id: InvoiceId::from(21),
            method: PaymentMethod::CreditCard,
            amount,
            notes: None,
            occurred_at: test_time(),
        })
    }

    fn complete() -> PaymentCommand {
        PaymentCommand::CompletePayment(CompletePayment {
            payment_id: test_payment_id(),
            transaction_id: "TXN-ABCDEF012345".to_string(),
            occurred_at: test_time(),
        })
    }

    fn change_status(status: PaymentStatus) -> PaymentCommand {
        PaymentCommand::ChangePaymentStatus(ChangePaymentStatus {
            payment_id: test_payment_id(),
            status,
            occurred_at: test_time(),
        })
    }

    fn processing() -> Payment {
        let mut payment = Payment::empty(test_payment_id());
        execute(&mut payment, &initiate(dec!(20.00))).unwrap();
        payment
    }

    #[test]
    fn initiated_payment_is_processing() {
        let payment = processing();
        assert_eq!(payment.status(), PaymentStatus::Processing);
        assert_eq!(payment.amount(), dec!(20.00));
        assert!(payment.transaction_id().is_none());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let err = Payment::empty(test_payment_id())
            .handle(&initiate(dec!(0)))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[test]
    fn completion_assigns_transaction_and_date() {
        let mut payment = processing();
        execute(&mut payment, &complete()).unwrap();
        assert_eq!(payment.status(), PaymentStatus::Completed);
        assert_eq!(payment.transaction_id(), Some("TXN-ABCDEF012345"));
        assert!(payment.payment_date().is_some());
        assert_eq!(payment.version(), 2);
    }

    #[test]
    fn completed_payment_can_only_be_refunded() {
        let mut payment = processing();
        execute(&mut payment, &complete()).unwrap();
        assert!(payment.handle(&complete()).is_err());
        assert!(payment.handle(&change_status(PaymentStatus::Failed)).is_err());
        execute(&mut payment, &change_status(PaymentStatus::Refunded)).unwrap();
        assert_eq!(payment.status(), PaymentStatus::Refunded);
    }

    #[test]
    fn completion_through_status_change_is_rejected() {
        let payment = processing();
        match payment.handle(&change_status(PaymentStatus::Completed)).unwrap_err() {
            DomainError::InvalidRequest(msg) => assert!(msg.contains("transaction id")),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }
}
