//! Customer segmentation by lifetime spend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerSegment {
    #[default]
    Regular,
    Premium,
    Vip,
}

impl CustomerSegment {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerSegment::Regular => "REGULAR",
            CustomerSegment::Premium => "PREMIUM",
            CustomerSegment::Vip => "VIP",
        }
    }
}

impl core::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CustomerSegment {
    type Err = orderflow_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(CustomerSegment::Regular),
            "PREMIUM" => Ok(CustomerSegment::Premium),
            "VIP" => Ok(CustomerSegment::Vip),
            other => Err(orderflow_core::DomainError::invalid_request(format!(
                "unknown customer segment: {other}"
            ))),
        }
    }
}

const PREMIUM_THRESHOLD: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);
const VIP_THRESHOLD: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Segment for a lifetime spend. Thresholds are strict: exactly 50,000 is still REGULAR.
pub fn segment_for(total_spent: Decimal) -> CustomerSegment {
    if total_spent > VIP_THRESHOLD {
        CustomerSegment::Vip
    } else if total_spent > PREMIUM_THRESHOLD {
        CustomerSegment::Premium
    } else {
        CustomerSegment::Regular
    }
}
