//! Engine wiring for the HTTP layer.

use orderflow_infra::config::OrderflowConfig;
use orderflow_infra::services::InMemoryServices;

/// Engines shared by every handler.
pub type AppServices = InMemoryServices;

/// Build the in-memory ledger, its bus and the engines, and start the event
/// audit trail on the bus.
pub fn build_services(config: &OrderflowConfig) -> AppServices {
    let services = InMemoryServices::in_memory(config);
    // Detached: the audit thread ends when the bus is dropped with the services.
    let _audit = orderflow_observability::audit::spawn_event_audit(services.ledger.bus());
    services
}
