//! Invoicing domain module (event-sourced).
//!
//! Invoices derived from orders, their balance and the invoice status machine,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod status;

pub use invoice::{
    ApplyPayment, ChangeInvoiceStatus, GenerateInvoice, Invoice, InvoiceCommand, InvoiceEvent,
    InvoiceGenerated, InvoiceId, InvoicePaid, InvoiceStatusChanged, MarkInvoicePaid,
    PaymentApplied, due_date_from,
};
pub use status::{INVOICE_TRANSITIONS, InvoiceStatus};
