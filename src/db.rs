pub mod store;
pub use store::{CatalogStore, CompanyStore, OrderStore, UserStore};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod memory;
pub use memory::MemoryStore;
