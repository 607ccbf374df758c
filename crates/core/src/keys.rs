//! Generated business keys (`ORD-1A2B3C4D`, `TXN-0F1E2D3C4B5A`, ...).
//!
//! Keys are random, not sequential. Uniqueness is enforced by the ledger
//! store's unique index, not here.

use uuid::Uuid;

/// Prefix of a generated business key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BusinessKeyPrefix {
    Order,
    Invoice,
    Payment,
    Customer,
}

impl BusinessKeyPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessKeyPrefix::Order => "ORD",
            BusinessKeyPrefix::Invoice => "INV",
            BusinessKeyPrefix::Payment => "PAY",
            BusinessKeyPrefix::Customer => "CUST",
        }
    }
}

const KEY_HEX_LEN: usize = 8;
const TXN_HEX_LEN: usize = 12;

fn random_hex(len: usize) -> String {
    // v4: every hex digit is random, unlike the timestamp-led v7 layout.
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(len);
    hex.make_ascii_uppercase();
    hex
}

/// `<PREFIX>-<8 uppercase hex>`.
pub fn business_key(prefix: BusinessKeyPrefix) -> String {
    format!("{}-{}", prefix.as_str(), random_hex(KEY_HEX_LEN))
}

/// `TXN-<12 uppercase hex>`, assigned when a payment completes.
pub fn transaction_id() -> String {
    format!("TXN-{}", random_hex(TXN_HEX_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_shape(key: &str, prefix: &str, hex_len: usize) {
        let (p, hex) = key.split_once('-').expect("key has a dash");
        assert_eq!(p, prefix);
        assert_eq!(hex.len(), hex_len);
        assert!(
            hex.chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn business_keys_have_prefix_and_eight_hex_digits() {
        assert_shape(&business_key(BusinessKeyPrefix::Order), "ORD", 8);
        assert_shape(&business_key(BusinessKeyPrefix::Invoice), "INV", 8);
        assert_shape(&business_key(BusinessKeyPrefix::Payment), "PAY", 8);
        assert_shape(&business_key(BusinessKeyPrefix::Customer), "CUST", 8);
    }

    #[test]
    fn transaction_ids_have_twelve_hex_digits() {
        assert_shape(&transaction_id(), "TXN", 12);
    }

    #[test]
    fn consecutive_keys_differ() {
        assert_ne!(
            business_key(BusinessKeyPrefix::Order),
            business_key(BusinessKeyPrefix::Order)
        );
    }
}
