pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod operations;
pub mod settings;
pub mod sheets;
