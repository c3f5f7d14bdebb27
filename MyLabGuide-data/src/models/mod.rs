// Data storage models

// Reference range and test definition models
pub mod reference;

// Wizard session model
pub mod session;
