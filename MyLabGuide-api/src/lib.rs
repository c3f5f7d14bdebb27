// MyLabGuide-api lib.rs
//
// This is the main library file for the MyLabGuide API.
// It re-exports the APIs from the various modules.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
pub mod pdf;

// Re-export the application factory for the binary and integration tests
pub use api::create_application;
