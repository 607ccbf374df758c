//! Infrastructure for orderflow: the ledger store, the engines that run
//! domain commands against it, and runtime configuration.

pub mod config;
pub mod ledger;
pub mod services;

#[cfg(test)]
mod integration_tests;
