pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{InMemoryRepository, MemoryRepositoryFactory};
pub use repository::{RepositoryError, TaxRulesRepository};
