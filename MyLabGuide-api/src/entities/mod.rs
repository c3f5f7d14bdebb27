// Public entities for the MyLabGuide API
// This module contains data structures that are shared across the application boundary

// Wizard session and request payloads
pub mod wizard;

// Classified lab report entities
pub mod report;

// Reference range browsing entities
pub mod reference;

// Common entities for error handling
pub mod common;
