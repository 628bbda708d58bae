pub mod crm_repo;
pub mod dashboard_repo;
pub mod inventory_repo;
pub mod operations_repo;
pub mod settings_repo;
pub mod sheet_repo;
pub mod user_repo;

pub use crm_repo::CrmRepository;
pub use dashboard_repo::DashboardRepository;
pub use inventory_repo::InventoryRepository;
pub use operations_repo::OperationsRepository;
pub use settings_repo::SettingsRepository;
pub use sheet_repo::SheetRepository;
pub use user_repo::UserRepository;
