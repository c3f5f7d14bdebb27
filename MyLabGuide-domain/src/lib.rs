// MyLabGuide Domain
// This crate contains the business logic for the MyLabGuide application

// Services that implement business logic
pub mod services;

// Domain models
pub mod models;

// Health checks and system status
pub mod health;

// Re-export the reference catalog from the data crate for convenience
pub use my_lab_guide_data::reference;

// Testing utilities - only available with mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
