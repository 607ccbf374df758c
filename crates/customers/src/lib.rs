//! Customers domain module (event-sourced).
//!
//! Customer master data plus the running order totals that drive the
//! customer segment. Pure domain logic, no IO.

pub mod customer;
pub mod segment;

pub use customer::{
    Address, Customer, CustomerActivityChanged, CustomerCommand, CustomerDeleted, CustomerEvent,
    CustomerId, CustomerRegistered, CustomerUpdated, DeleteCustomer, OrderRecorded, RecordOrder,
    RegisterCustomer, SetCustomerActive, UpdateCustomer, normalize_email,
};
pub use segment::{CustomerSegment, segment_for};
