//! Payments domain module (event-sourced).
//!
//! A payment settles (part of) one invoice. Completion is instant: there is no
//! gateway behind it, a transaction id is simply assigned.

pub mod payment;
pub mod status;

pub use payment::{
    ChangePaymentStatus, CompletePayment, InitiatePayment, Payment, PaymentCommand,
    PaymentCompleted, PaymentEvent, PaymentId, PaymentInitiated, PaymentStatusChanged,
};
pub use status::{PAYMENT_TRANSITIONS, PaymentMethod, PaymentStatus};
