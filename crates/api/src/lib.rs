//! HTTP API: routing and request/response mapping over the orderflow engines.

pub mod app;
