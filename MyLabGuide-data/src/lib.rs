// MyLabGuide Data
// This crate holds the laboratory reference catalog and wizard session storage

// Data storage models
pub mod models;

// Built-in reference catalog of laboratory tests
pub mod reference;

// Session store implementations
pub mod session;
