pub mod auth;
pub mod crm_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod operation_service;
pub mod sheet_service;
