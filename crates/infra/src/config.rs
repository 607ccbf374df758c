//! Runtime configuration, resolved once at startup from the environment.
//!
//! Every setting has a default; a value that does not parse is logged and
//! replaced by its default rather than aborting startup.

use std::str::FromStr;

use rust_decimal::Decimal;

pub const BIND_ADDR_VAR: &str = "ORDERFLOW_BIND_ADDR";
pub const TAX_RATE_VAR: &str = "ORDERFLOW_TAX_RATE";
pub const INVOICE_DUE_DAYS_VAR: &str = "ORDERFLOW_INVOICE_DUE_DAYS";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// 18%.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);
pub const DEFAULT_INVOICE_DUE_DAYS: u32 = 30;

/// Flat tax applied by the order lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

/// Invoice terms applied by the billing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    pub due_days: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            due_days: DEFAULT_INVOICE_DUE_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderflowConfig {
    pub bind_addr: String,
    pub pricing: PricingPolicy,
    pub billing: BillingPolicy,
}

impl Default for OrderflowConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            pricing: PricingPolicy::default(),
            billing: BillingPolicy::default(),
        }
    }
}

impl OrderflowConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup` (variable name → raw value).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup(BIND_ADDR_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let tax_rate = parse_or_default(&lookup, TAX_RATE_VAR, DEFAULT_TAX_RATE, |rate: &Decimal| {
            *rate >= Decimal::ZERO && *rate <= Decimal::ONE
        });

        let due_days = parse_or_default(&lookup, INVOICE_DUE_DAYS_VAR, DEFAULT_INVOICE_DUE_DAYS, |_| true);

        Self {
            bind_addr,
            pricing: PricingPolicy { tax_rate },
            billing: BillingPolicy { due_days },
        }
    }
}

fn parse_or_default<T, F, V>(lookup: &F, name: &str, default: T, valid: V) -> T
where
    T: FromStr + core::fmt::Display,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(variable = name, value = %raw, fallback = %default, "ignoring invalid setting");
            default
        }
    }
}
