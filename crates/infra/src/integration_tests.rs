//! End-to-end tests: engines → ledger store → event bus.
//!
//! Verifies:
//! - Stock counters never oversell and roll back with the operation
//! - Order totals, status table and stock coordination
//! - One invoice per order, monotonic payment application
//! - Failed operations leave no trace (state and published events)

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{Days, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use orderflow_core::{DomainError, Money};
    use orderflow_events::EventBus;
    use orderflow_customers::{CustomerId, CustomerSegment};
    use orderflow_invoicing::InvoiceStatus;
    use orderflow_payments::{PaymentMethod, PaymentStatus};
    use orderflow_products::ProductId;
    use orderflow_sales::{OrderId, OrderStatus};

    use crate::config::OrderflowConfig;
    use crate::services::{
        InMemoryServices, NewCustomer, NewProduct, OrderLineRequest, PaymentRequest,
        PlaceOrderRequest, ProductChanges, ServiceError,
    };

    fn setup() -> InMemoryServices {
        InMemoryServices::in_memory(&OrderflowConfig::default())
    }

    fn register_customer(services: &InMemoryServices, email: &str) -> CustomerId {
        services
            .customers
            .register(NewCustomer {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: email.to_string(),
                ..NewCustomer::default()
            })
            .unwrap()
            .id_typed()
    }

    fn create_product(services: &InMemoryServices, sku: &str, price: Money, stock: i64) -> ProductId {
        services
            .catalog
            .create(NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                description: None,
                price,
                cost_price: None,
                initial_stock: stock,
                min_stock_level: None,
            })
            .unwrap()
            .id_typed()
    }

    fn line(product_id: ProductId, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
            discount: None,
        }
    }

    fn place(
        services: &InMemoryServices,
        customer_id: CustomerId,
        items: Vec<OrderLineRequest>,
    ) -> Result<orderflow_sales::Order, ServiceError> {
        services.orders.place_order(PlaceOrderRequest {
            customer_id,
            items,
            discount_amount: None,
            notes: None,
        })
    }

    fn stock(services: &InMemoryServices, product_id: ProductId) -> (i64, i64) {
        let product = services.catalog.get(product_id).unwrap();
        (product.quantity_in_stock(), product.reserved_quantity())
    }

    fn confirmed_order(services: &InMemoryServices) -> OrderId {
        let customer = register_customer(services, "billing@example.com");
        let product = create_product(services, "SKU-BILL", dec!(10.00), 10);
        let order = place(services, customer, vec![line(product, 3)]).unwrap();
        services
            .orders
            .update_status(order.id_typed(), OrderStatus::Confirmed)
            .unwrap();
        order.id_typed()
    }

    #[test]
    fn placing_an_order_reserves_stock_and_computes_totals() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);

        let order = place(&services, customer, vec![line(product, 3)]).unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.order_number().starts_with("ORD-"));
        assert_eq!(order.subtotal(), dec!(30.00));
        assert_eq!(order.tax_amount(), dec!(5.40));
        assert_eq!(order.total_amount(), dec!(35.40));
        assert_eq!(order.items()[0].product_sku, "SKU-1");
        assert_eq!(order.items()[0].unit_price, dec!(10.00));

        assert_eq!(stock(&services, product), (10, 3));

        let customer = services.customers.get(customer).unwrap();
        assert_eq!(customer.total_orders(), 1);
        assert_eq!(customer.total_spent(), dec!(35.40));
    }

    #[test]
    fn order_snapshot_survives_catalog_price_change() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 1)]).unwrap();

        services
            .catalog
            .update(
                product,
                ProductChanges {
                    price: Some(dec!(99.00)),
                    ..ProductChanges::default()
                },
            )
            .unwrap();

        let reloaded = services.orders.get(order.id_typed()).unwrap();
        assert_eq!(reloaded.items()[0].unit_price, dec!(10.00));
    }

    #[test]
    fn over_reservation_fails_and_leaves_counters_unchanged() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(5.00), 2);

        let err = place(&services, customer, vec![line(product, 3)]).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));

        assert_eq!(stock(&services, product), (2, 0));
        assert!(services.orders.list().unwrap().is_empty());
        assert_eq!(services.customers.get(customer).unwrap().total_orders(), 0);
    }

    #[test]
    fn failed_line_rolls_back_earlier_reservations() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let plenty = create_product(&services, "SKU-A", dec!(1.00), 100);
        let scarce = create_product(&services, "SKU-B", dec!(1.00), 1);

        let err = place(&services, customer, vec![line(plenty, 5), line(scarce, 2)]).unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InsufficientStock { .. })
        ));

        assert_eq!(stock(&services, plenty), (100, 0));
        assert_eq!(stock(&services, scarce), (1, 0));
    }

    #[test]
    fn repeated_product_lines_reserve_cumulatively() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(1.00), 5);

        let err = place(&services, customer, vec![line(product, 3), line(product, 3)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InsufficientStock { .. })));
        assert_eq!(stock(&services, product), (5, 0));

        place(&services, customer, vec![line(product, 2), line(product, 3)]).unwrap();
        assert_eq!(stock(&services, product), (5, 5));
    }

    #[test]
    fn placement_rejects_bad_requests() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(1.00), 5);

        let err = place(&services, customer, vec![]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        let err = place(&services, CustomerId::from(999), vec![line(product, 1)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound { .. })));

        let err = place(&services, customer, vec![line(ProductId::from(999), 1)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound { .. })));

        let err = place(&services, customer, vec![line(product, 0)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        services.customers.set_active(customer, false).unwrap();
        let err = place(&services, customer, vec![line(product, 1)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        assert_eq!(stock(&services, product), (5, 0));
    }

    #[test]
    fn inactive_products_cannot_be_ordered() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(1.00), 5);
        services
            .catalog
            .update(
                product,
                ProductChanges {
                    active: Some(false),
                    ..ProductChanges::default()
                },
            )
            .unwrap();

        let err = place(&services, customer, vec![line(product, 1)]).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));
    }

    #[test]
    fn confirming_commits_reserved_stock() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 3)]).unwrap();

        let confirmed = services
            .orders
            .update_status(order.id_typed(), OrderStatus::Confirmed)
            .unwrap();
        assert_eq!(confirmed.status(), OrderStatus::Confirmed);
        assert_eq!(stock(&services, product), (7, 0));

        services
            .orders
            .update_status(order.id_typed(), OrderStatus::Processing)
            .unwrap();
        assert_eq!(stock(&services, product), (7, 0));
    }

    #[test]
    fn disallowed_transitions_fail_and_keep_status() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 1)]).unwrap();
        let order_id = order.id_typed();

        for target in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Refunded,
            OrderStatus::Pending,
        ] {
            let err = services.orders.update_status(order_id, target).unwrap_err();
            assert!(
                matches!(err.as_domain(), Some(DomainError::InvalidOrderTransition { .. })),
                "PENDING -> {target} should be rejected, got {err:?}"
            );
            assert_eq!(services.orders.get(order_id).unwrap().status(), OrderStatus::Pending);
        }
        assert_eq!(stock(&services, product), (10, 1));
    }

    #[test]
    fn cancelling_pending_order_releases_reservations() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 4)]).unwrap();

        let cancelled = services
            .orders
            .cancel(order.id_typed(), Some("customer changed mind".to_string()))
            .unwrap();

        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(cancelled.notes(), Some("customer changed mind"));
        assert_eq!(stock(&services, product), (10, 0));
    }

    #[test]
    fn cancelling_confirmed_order_returns_committed_units() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 4)]).unwrap();
        services
            .orders
            .update_status(order.id_typed(), OrderStatus::Confirmed)
            .unwrap();
        assert_eq!(stock(&services, product), (6, 0));

        services
            .orders
            .update_status(order.id_typed(), OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(stock(&services, product), (10, 0));
    }

    #[test]
    fn cancelling_shipped_order_fails_and_keeps_stock() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order_id = place(&services, customer, vec![line(product, 2)])
            .unwrap()
            .id_typed();
        for status in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::Shipped] {
            services.orders.update_status(order_id, status).unwrap();
        }
        let before = stock(&services, product);

        let err = services.orders.cancel(order_id, None).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::OrderProcessing(_))));
        assert_eq!(services.orders.get(order_id).unwrap().status(), OrderStatus::Shipped);
        assert_eq!(stock(&services, product), before);

        // A status change to CANCELLED takes the cancel path and fails the same way.
        let err = services
            .orders
            .update_status(order_id, OrderStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::OrderProcessing(_))));
        assert_eq!(stock(&services, product), before);
    }

    #[test]
    fn generating_invoice_twice_fails_and_keeps_the_first() {
        let services = setup();
        let order_id = confirmed_order(&services);

        let first = services.billing.generate_for_order(order_id).unwrap();
        assert_eq!(first.status(), InvoiceStatus::Draft);
        assert!(first.invoice_number().starts_with("INV-"));
        assert_eq!(first.total_amount(), dec!(35.40));
        assert_eq!(first.balance_amount(), dec!(35.40));
        let invoice_date = first.invoice_date().unwrap();
        assert_eq!(first.due_date(), invoice_date.checked_add_days(Days::new(30)));

        let err = services.billing.generate_for_order(order_id).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        let invoices = services.billing.list().unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0], first);
    }

    #[test]
    fn pending_orders_cannot_be_invoiced() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(product, 1)]).unwrap();

        let err = services.billing.generate_for_order(order.id_typed()).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        let err = services.billing.generate_for_order(OrderId::from(404)).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound { .. })));
    }

    #[test]
    fn paying_the_full_balance_marks_invoice_paid() {
        let services = setup();
        let invoice = services
            .billing
            .generate_for_order(confirmed_order(&services))
            .unwrap();

        let payment = services
            .payments
            .process(PaymentRequest {
                invoice_id: invoice.id_typed(),
                amount: dec!(35.40),
                method: PaymentMethod::CreditCard,
                notes: None,
            })
            .unwrap();

        assert_eq!(payment.status(), PaymentStatus::Completed);
        assert!(payment.reference_number().starts_with("PAY-"));
        assert!(payment.transaction_id().is_some_and(|t| t.starts_with("TXN-")));
        assert!(payment.payment_date().is_some());

        let invoice = services.billing.get(invoice.id_typed()).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.paid_amount(), invoice.total_amount());
        assert_eq!(invoice.balance_amount(), dec!(0));
        assert!(invoice.paid_at().is_some());
    }

    #[test]
    fn overpayment_fails_and_creates_no_payment() {
        let services = setup();
        let invoice = services
            .billing
            .generate_for_order(confirmed_order(&services))
            .unwrap();

        let err = services
            .payments
            .process(PaymentRequest {
                invoice_id: invoice.id_typed(),
                amount: dec!(35.41),
                method: PaymentMethod::Cash,
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        assert!(services.payments.list().unwrap().is_empty());
        assert_eq!(services.billing.get(invoice.id_typed()).unwrap(), invoice);
    }

    #[test]
    fn partial_payments_accumulate_until_paid() {
        let services = setup();
        let invoice_id = services
            .billing
            .generate_for_order(confirmed_order(&services))
            .unwrap()
            .id_typed();

        let pay = |amount| {
            services.payments.process(PaymentRequest {
                invoice_id,
                amount,
                method: PaymentMethod::BankTransfer,
                notes: None,
            })
        };

        pay(dec!(10.00)).unwrap();
        let invoice = services.billing.get(invoice_id).unwrap();
        assert_eq!(invoice.paid_amount(), dec!(10.00));
        assert_eq!(invoice.balance_amount(), dec!(25.40));
        assert_eq!(invoice.status(), InvoiceStatus::Draft);

        let err = pay(dec!(0)).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        pay(dec!(25.40)).unwrap();
        let invoice = services.billing.get(invoice_id).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(services.payments.list_for_invoice(invoice_id).unwrap().len(), 2);

        let err = pay(dec!(0.01)).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));
    }

    #[test]
    fn invoice_status_follows_its_table() {
        let services = setup();
        let invoice_id = services
            .billing
            .generate_for_order(confirmed_order(&services))
            .unwrap()
            .id_typed();

        let err = services
            .billing
            .update_status(invoice_id, InvoiceStatus::Paid)
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        services.billing.update_status(invoice_id, InvoiceStatus::Sent).unwrap();

        let today = Utc::now().date_naive();
        assert!(services.billing.list_overdue(today).unwrap().is_empty());
        let later = today.checked_add_days(Days::new(31)).unwrap();
        assert_eq!(services.billing.list_overdue(later).unwrap().len(), 1);

        let paid = services.billing.mark_as_paid(invoice_id).unwrap();
        assert_eq!(paid.status(), InvoiceStatus::Paid);
        assert_eq!(paid.paid_amount(), paid.total_amount());
        assert!(services.billing.list_overdue(later).unwrap().is_empty());
    }

    #[test]
    fn payment_status_follows_its_table() {
        let services = setup();
        let invoice_id = services
            .billing
            .generate_for_order(confirmed_order(&services))
            .unwrap()
            .id_typed();
        let payment = services
            .payments
            .process(PaymentRequest {
                invoice_id,
                amount: dec!(5.00),
                method: PaymentMethod::Upi,
                notes: None,
            })
            .unwrap();

        let err = services
            .payments
            .update_status(payment.id_typed(), PaymentStatus::Failed)
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        let refunded = services
            .payments
            .update_status(payment.id_typed(), PaymentStatus::Refunded)
            .unwrap();
        assert_eq!(refunded.status(), PaymentStatus::Refunded);
        assert_eq!(
            services.payments.list_by_status(PaymentStatus::Refunded).unwrap().len(),
            1
        );
    }

    #[test]
    fn customer_segment_follows_total_spent() {
        let services = setup();
        let customer = register_customer(&services, "big@example.com");
        let product = create_product(&services, "SKU-BIG", dec!(50000.00), 10);

        place(&services, customer, vec![line(product, 1)]).unwrap();
        let c = services.customers.get(customer).unwrap();
        assert_eq!(c.total_spent(), dec!(59000.00));
        assert_eq!(c.segment(), CustomerSegment::Premium);

        place(&services, customer, vec![line(product, 1)]).unwrap();
        let c = services.customers.get(customer).unwrap();
        assert_eq!(c.total_orders(), 2);
        assert_eq!(c.segment(), CustomerSegment::Vip);
        assert_eq!(
            services.customers.list_by_segment(CustomerSegment::Vip).unwrap().len(),
            1
        );
    }

    #[test]
    fn duplicate_business_keys_are_rejected() {
        let services = setup();
        register_customer(&services, "dup@example.com");
        create_product(&services, "SKU-DUP", dec!(1.00), 1);

        let err = services
            .customers
            .register(NewCustomer {
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                email: " DUP@example.com ".to_string(),
                ..NewCustomer::default()
            })
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        let err = services
            .catalog
            .create(NewProduct {
                sku: "SKU-DUP".to_string(),
                name: "Another".to_string(),
                description: None,
                price: dec!(2.00),
                cost_price: None,
                initial_stock: 0,
                min_stock_level: None,
            })
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));
        assert_eq!(services.catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn reserved_products_cannot_be_deleted() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(1.00), 5);
        let order = place(&services, customer, vec![line(product, 1)]).unwrap();

        let err = services.catalog.delete(product).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));

        services.orders.cancel(order.id_typed(), None).unwrap();
        services.catalog.delete(product).unwrap();

        let err = services.catalog.get(product).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound { .. })));
        assert!(services.catalog.find_by_sku("SKU-1").is_err());
    }

    #[test]
    fn catalog_queries() {
        let services = setup();
        let widget = services
            .catalog
            .create(NewProduct {
                sku: "W-1".to_string(),
                name: "Blue Widget".to_string(),
                description: Some("A sturdy widget".to_string()),
                price: dec!(3.00),
                cost_price: Some(dec!(1.00)),
                initial_stock: 4,
                min_stock_level: Some(5),
            })
            .unwrap();
        create_product(&services, "G-1", dec!(9.00), 100);

        let low = services.catalog.low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku(), "W-1");

        assert_eq!(services.catalog.search("WIDGET").unwrap().len(), 1);
        assert_eq!(services.catalog.search("sturdy").unwrap().len(), 1);

        let adjusted = services.catalog.adjust_stock(widget.id_typed(), 10).unwrap();
        assert_eq!(adjusted.quantity_in_stock(), 14);
        assert!(services.catalog.low_stock().unwrap().is_empty());

        let err = services.catalog.adjust_stock(widget.id_typed(), -15).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InsufficientStock { .. })));
    }

    #[test]
    fn out_of_range_amounts_are_rejected_and_store_stays_usable() {
        let services = setup();
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-BIG", Decimal::MAX / dec!(2), 10);

        let err = place(&services, customer, vec![line(product, 3)]).unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::invalid_request("amount out of range"))
        );
        assert_eq!(stock(&services, product), (10, 0));
        assert_eq!(services.customers.get(customer).unwrap().total_orders(), 0);

        let err = services.catalog.adjust_stock(product, i64::MAX).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidRequest(_))));
        assert_eq!(stock(&services, product), (10, 0));

        let cheap = create_product(&services, "SKU-OK", dec!(10.00), 10);
        let order = place(&services, customer, vec![line(cheap, 3)]).unwrap();
        assert_eq!(order.total_amount(), dec!(35.40));
    }

    #[test]
    fn events_are_published_only_after_commit() {
        let services = setup();
        let subscription = services.ledger.bus().subscribe();

        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-1", dec!(10.00), 1);
        subscription.drain();

        let _ = place(&services, customer, vec![line(product, 5)]).unwrap_err();
        assert!(subscription.drain().is_empty());

        place(&services, customer, vec![line(product, 1)]).unwrap();
        let types: Vec<String> = subscription
            .drain()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect();
        assert_eq!(types.len(), 3);
        assert!(types.iter().any(|t| t == "sales.order.placed"));
    }

    #[test]
    fn concurrent_orders_never_oversell() {
        let services = Arc::new(setup());
        let customer = register_customer(&services, "a@example.com");
        let product = create_product(&services, "SKU-HOT", dec!(1.00), 10);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let services = services.clone();
                thread::spawn(move || {
                    (0..5)
                        .filter(|_| place(&services, customer, vec![line(product, 1)]).is_ok())
                        .count()
                })
            })
            .collect();
        let placed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(placed, 10);
        assert_eq!(stock(&services, product), (10, 10));
        assert_eq!(services.orders.list().unwrap().len(), 10);
        assert_eq!(services.customers.get(customer).unwrap().total_orders(), 10);
    }

    #[test]
    fn order_queries() {
        let services = setup();
        let a = register_customer(&services, "a@example.com");
        let b = register_customer(&services, "b@example.com");
        let product = create_product(&services, "SKU-1", dec!(1.00), 10);
        let first = place(&services, a, vec![line(product, 1)]).unwrap();
        place(&services, b, vec![line(product, 1)]).unwrap();
        services.orders.cancel(first.id_typed(), None).unwrap();

        assert_eq!(services.orders.list_by_customer(a).unwrap().len(), 1);
        assert_eq!(services.orders.list_by_status(OrderStatus::Pending).unwrap().len(), 1);
        assert_eq!(
            services.orders.find_by_number(first.order_number()).unwrap().status(),
            OrderStatus::Cancelled
        );

        let now = Utc::now();
        let window = services
            .orders
            .list_between(now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(window.len(), 2);
    }
}
