pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::TaxEngine;
pub use db::repository::{RepositoryError, TaxRulesRepository};
pub use models::*;
