use orderflow_core::{AggregateRoot, RecordId};
use orderflow_customers::Customer;
use orderflow_invoicing::Invoice;
use orderflow_payments::Payment;
use orderflow_products::Product;
use orderflow_sales::Order;

use super::store::{LedgerRecord, LedgerTx, LedgerView, RecordTable};

impl LedgerRecord for Customer {
    const ENTITY: &'static str = "customer";
    const AGGREGATE_TYPE: &'static str = "customers.customer";

    fn record_id(&self) -> RecordId {
        self.id().record_id()
    }

    fn record_version(&self) -> u64 {
        self.version()
    }

    fn is_deleted(&self) -> bool {
        Customer::is_deleted(self)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.customer_code().to_string(), self.email().to_string()]
    }

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self> {
        tx.customers_mut()
    }

    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self> {
        view.customers()
    }
}

impl LedgerRecord for Product {
    const ENTITY: &'static str = "product";
    const AGGREGATE_TYPE: &'static str = "products.product";

    fn record_id(&self) -> RecordId {
        self.id().record_id()
    }

    fn record_version(&self) -> u64 {
        self.version()
    }

    fn is_deleted(&self) -> bool {
        Product::is_deleted(self)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.sku().to_string()]
    }

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self> {
        tx.products_mut()
    }

    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self> {
        view.products()
    }
}

impl LedgerRecord for Order {
    const ENTITY: &'static str = "order";
    const AGGREGATE_TYPE: &'static str = "sales.order";

    fn record_id(&self) -> RecordId {
        self.id().record_id()
    }

    fn record_version(&self) -> u64 {
        self.version()
    }

    fn is_deleted(&self) -> bool {
        Order::is_deleted(self)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.order_number().to_string()]
    }

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self> {
        tx.orders_mut()
    }

    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self> {
        view.orders()
    }
}

impl LedgerRecord for Invoice {
    const ENTITY: &'static str = "invoice";
    const AGGREGATE_TYPE: &'static str = "invoicing.invoice";

    fn record_id(&self) -> RecordId {
        self.id().record_id()
    }

    fn record_version(&self) -> u64 {
        self.version()
    }

    fn is_deleted(&self) -> bool {
        Invoice::is_deleted(self)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.invoice_number().to_string()]
    }

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self> {
        tx.invoices_mut()
    }

    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self> {
        view.invoices()
    }
}

impl LedgerRecord for Payment {
    const ENTITY: &'static str = "payment";
    const AGGREGATE_TYPE: &'static str = "payments.payment";

    fn record_id(&self) -> RecordId {
        self.id().record_id()
    }

    fn record_version(&self) -> u64 {
        self.version()
    }

    fn is_deleted(&self) -> bool {
        Payment::is_deleted(self)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.reference_number().to_string()]
    }

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self> {
        tx.payments_mut()
    }

    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self> {
        view.payments()
    }
}
