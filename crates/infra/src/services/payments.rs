//! Payment processor: settles invoice balances.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use orderflow_core::{BusinessKeyPrefix, DomainError, Money, business_key, transaction_id};
use orderflow_events::EventBus;
use orderflow_invoicing::{ApplyPayment, Invoice, InvoiceCommand, InvoiceId};
use orderflow_payments::{
    ChangePaymentStatus, CompletePayment, InitiatePayment, Payment, PaymentCommand, PaymentId,
    PaymentMethod, PaymentStatus,
};

use crate::ledger::{LedgerRecord, LedgerStore};

use super::error::ServiceError;
use super::ledger::{JsonEnvelope, Ledger};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

pub struct PaymentProcessor<S, B> {
    ledger: Arc<Ledger<S, B>>,
}

impl<S, B> PaymentProcessor<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(ledger: Arc<Ledger<S, B>>) -> Self {
        Self { ledger }
    }

    /// Apply a payment against an invoice's outstanding balance.
    ///
    /// The payment is created and completed in the same transaction that
    /// raises the invoice's paid amount; an invoice whose balance reaches
    /// zero becomes PAID.
    pub fn process(&self, request: PaymentRequest) -> Result<Payment, ServiceError> {
        let (payment, invoice) = self.ledger.execute("payments.process", |uow| {
            let now = Utc::now();
            let mut invoice = uow.load::<Invoice>(request.invoice_id.record_id())?;

            uow.execute(
                &mut invoice,
                InvoiceCommand::ApplyPayment(ApplyPayment {
                    invoice_id: request.invoice_id,
                    amount: request.amount,
                    occurred_at: now,
                }),
            )?;

            let payment_id = PaymentId::new(uow.next_id::<Payment>());
            let mut payment = Payment::empty(payment_id);
            uow.execute(
                &mut payment,
                PaymentCommand::InitiatePayment(InitiatePayment {
                    payment_id,
                    reference_number: business_key(BusinessKeyPrefix::Payment),
                    invoice_id: request.invoice_id,
                    method: request.method,
                    amount: request.amount,
                    notes: request.notes,
                    occurred_at: now,
                }),
            )?;
            uow.execute(
                &mut payment,
                PaymentCommand::CompletePayment(CompletePayment {
                    payment_id,
                    transaction_id: transaction_id(),
                    occurred_at: now,
                }),
            )?;
            Ok((payment, invoice))
        })?;

        tracing::info!(
            payment_id = %payment.id_typed(),
            reference_number = payment.reference_number(),
            invoice_id = %invoice.id_typed(),
            amount = %payment.amount(),
            balance = %invoice.balance_amount(),
            invoice_status = %invoice.status(),
            "payment processed"
        );
        Ok(payment)
    }

    /// Manual status change through the payment status table. COMPLETED
    /// assigns a fresh transaction id.
    pub fn update_status(&self, payment_id: PaymentId, status: PaymentStatus) -> Result<Payment, ServiceError> {
        let payment = self.ledger.execute("payments.update_status", |uow| {
            let now = Utc::now();
            let mut payment = uow.load::<Payment>(payment_id.record_id())?;
            let command = if status == PaymentStatus::Completed {
                PaymentCommand::CompletePayment(CompletePayment {
                    payment_id,
                    transaction_id: transaction_id(),
                    occurred_at: now,
                })
            } else {
                PaymentCommand::ChangePaymentStatus(ChangePaymentStatus {
                    payment_id,
                    status,
                    occurred_at: now,
                })
            };
            uow.execute(&mut payment, command)?;
            Ok(payment)
        })?;

        tracing::info!(payment_id = %payment_id, status = %status, "payment status changed");
        Ok(payment)
    }

    pub fn get(&self, payment_id: PaymentId) -> Result<Payment, ServiceError> {
        self.ledger
            .read(|view| view.payments().find_by_id(payment_id.record_id()))?
            .ok_or_else(|| DomainError::not_found(Payment::ENTITY, payment_id).into())
    }

    pub fn find_by_reference(&self, reference_number: &str) -> Result<Payment, ServiceError> {
        self.ledger
            .read(|view| view.payments().find_by_key(reference_number))?
            .ok_or_else(|| DomainError::not_found(Payment::ENTITY, reference_number).into())
    }

    pub fn list(&self) -> Result<Vec<Payment>, ServiceError> {
        self.ledger.read(|view| view.payments().all())
    }

    pub fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, ServiceError> {
        self.ledger
            .read(|view| view.payments().find_where(&|p: &Payment| p.invoice_id() == invoice_id))
    }

    pub fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, ServiceError> {
        self.ledger
            .read(|view| view.payments().find_where(&|p: &Payment| p.status() == status))
    }
}
