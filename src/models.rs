pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod inventory;
pub mod operations;
pub mod settings;
pub mod sheet;
