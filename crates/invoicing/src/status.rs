//! Invoice status machine.

use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, TransitionTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

/// Manual invoice status changes. PAID is only reached by settling the balance.
pub const INVOICE_TRANSITIONS: TransitionTable<InvoiceStatus> = TransitionTable::new(&[
    (InvoiceStatus::Draft, InvoiceStatus::Sent),
    (InvoiceStatus::Draft, InvoiceStatus::Cancelled),
    (InvoiceStatus::Sent, InvoiceStatus::Overdue),
    (InvoiceStatus::Sent, InvoiceStatus::Cancelled),
    (InvoiceStatus::Overdue, InvoiceStatus::Cancelled),
]);

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(self, to: InvoiceStatus) -> bool {
        INVOICE_TRANSITIONS.allows(self, to)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::invalid_request(format!("unknown invoice status: {s}")))
    }
}
