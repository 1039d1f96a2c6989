pub mod holding;
pub mod investment;
pub mod price;
pub mod settings;
pub mod valuation;
