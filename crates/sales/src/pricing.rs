//! Order line pricing and order totals.
//!
//! `line_total = unit_price * quantity - discount`,
//! `tax = round(subtotal * tax_rate)`,
//! `total = subtotal + tax - order_discount`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, Money, money_in_range, round_money};
use orderflow_products::ProductId;

/// A requested line with the product snapshot taken at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub discount: Money,
}

/// Order line as stored on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

fn ensure_not_negative(what: &str, amount: Money) -> Result<(), DomainError> {
    if amount < Decimal::ZERO {
        return Err(DomainError::invalid_request(format!("{what} cannot be negative")));
    }
    Ok(())
}

/// Number the lines and compute each line total.
pub fn price_lines(lines: &[PricedLine]) -> Result<Vec<OrderItem>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::invalid_request("order must contain at least one item"));
    }

    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            if line.quantity <= 0 {
                return Err(DomainError::invalid_request(format!(
                    "quantity for {} must be positive",
                    line.product_sku
                )));
            }
            ensure_not_negative("unit price", line.unit_price)?;
            ensure_not_negative("line discount", line.discount)?;

            let gross = line.unit_price.checked_mul(Decimal::from(line.quantity));
            let line_total =
                round_money(money_in_range(gross.and_then(|g| g.checked_sub(line.discount)))?);
            if line_total < Decimal::ZERO {
                return Err(DomainError::invalid_request(format!(
                    "discount on {} exceeds the line amount",
                    line.product_sku
                )));
            }

            Ok(OrderItem {
                line_no: idx as u32 + 1,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                product_sku: line.product_sku.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount: line.discount,
                line_total,
            })
        })
        .collect()
}

pub fn compute_totals(
    items: &[OrderItem],
    tax_rate: Decimal,
    discount_amount: Money,
) -> Result<OrderTotals, DomainError> {
    ensure_not_negative("tax rate", tax_rate)?;
    ensure_not_negative("order discount", discount_amount)?;

    let subtotal = money_in_range(
        items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total)),
    )?;
    let tax_amount = round_money(money_in_range(subtotal.checked_mul(tax_rate))?);
    let total_amount = money_in_range(
        subtotal
            .checked_add(tax_amount)
            .and_then(|t| t.checked_sub(discount_amount)),
    )?;
    if total_amount < Decimal::ZERO {
        return Err(DomainError::invalid_request("order discount exceeds the order amount"));
    }

    Ok(OrderTotals {
        subtotal,
        tax_amount,
        discount_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(sku: &str, unit_price: Money, quantity: i64, discount: Money) -> PricedLine {
        PricedLine {
            product_id: ProductId::from(1),
            product_name: format!("{sku} name"),
            product_sku: sku.to_string(),
            unit_price,
            quantity,
            discount,
        }
    }

    #[test]
    fn three_units_at_ten_with_eighteen_percent_tax() {
        let items = price_lines(&[line("SKU-1", dec!(10.00), 3, dec!(0))]).unwrap();
        let totals = compute_totals(&items, dec!(0.18), dec!(0)).unwrap();
        assert_eq!(items[0].line_total, dec!(30.00));
        assert_eq!(totals.subtotal, dec!(30.00));
        assert_eq!(totals.tax_amount, dec!(5.40));
        assert_eq!(totals.total_amount, dec!(35.40));
    }

    #[test]
    fn line_and_order_discounts_are_subtracted() {
        let items = price_lines(&[
            line("SKU-1", dec!(19.99), 2, dec!(1.98)),
            line("SKU-2", dec!(5.00), 1, dec!(0)),
        ])
        .unwrap();
        assert_eq!(items[0].line_no, 1);
        assert_eq!(items[1].line_no, 2);
        assert_eq!(items[0].line_total, dec!(38.00));

        let totals = compute_totals(&items, dec!(0.18), dec!(3.00)).unwrap();
        assert_eq!(totals.subtotal, dec!(43.00));
        assert_eq!(totals.tax_amount, dec!(7.74));
        assert_eq!(totals.discount_amount, dec!(3.00));
        assert_eq!(totals.total_amount, dec!(47.74));
    }

    #[test]
    fn tax_is_rounded_half_away_from_zero() {
        let items = price_lines(&[line("SKU-1", dec!(0.25), 1, dec!(0))]).unwrap();
        // 0.25 * 0.18 = 0.045
        let totals = compute_totals(&items, dec!(0.18), dec!(0)).unwrap();
        assert_eq!(totals.tax_amount, dec!(0.05));
    }

    #[test]
    fn empty_orders_and_bad_quantities_are_invalid() {
        assert!(matches!(price_lines(&[]), Err(DomainError::InvalidRequest(_))));
        assert!(matches!(
            price_lines(&[line("SKU-1", dec!(1), 0, dec!(0))]),
            Err(DomainError::InvalidRequest(_))
        ));
        assert!(matches!(
            price_lines(&[line("SKU-1", dec!(1), 1, dec!(2))]),
            Err(DomainError::InvalidRequest(_))
        ));
    }

    #[test]
    fn amounts_beyond_decimal_range_are_invalid() {
        let huge = Decimal::MAX / dec!(2);
        assert_eq!(
            price_lines(&[line("SKU-1", huge, 3, dec!(0))]),
            Err(DomainError::invalid_request("amount out of range"))
        );

        let items = price_lines(&[
            line("SKU-1", huge, 1, dec!(0)),
            line("SKU-2", huge, 1, dec!(0)),
            line("SKU-3", huge, 1, dec!(0)),
        ])
        .unwrap();
        assert_eq!(
            compute_totals(&items, dec!(0.18), dec!(0)),
            Err(DomainError::invalid_request("amount out of range"))
        );
    }

    #[test]
    fn order_discount_cannot_make_total_negative() {
        let items = price_lines(&[line("SKU-1", dec!(1.00), 1, dec!(0))]).unwrap();
        assert!(compute_totals(&items, dec!(0.18), dec!(1.18)).is_ok());
        assert!(matches!(
            compute_totals(&items, dec!(0.18), dec!(1.19)),
            Err(DomainError::InvalidRequest(_))
        ));
    }
}
