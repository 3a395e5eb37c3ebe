// ABOUTME: Core library for quorum-gated remote signing
// ABOUTME: Exports the vote data model, collaborator traits, voting handlers and configuration

pub mod config;
pub mod directory;
pub mod signing;
pub mod types;
pub mod voting_handler;
