// ABOUTME: Library interface for the keyvote HTTP gateway
// ABOUTME: Exposes the router and shared state for the binary and integration tests

pub mod api;
pub mod state;
