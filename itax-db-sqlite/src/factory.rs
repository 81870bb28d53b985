use std::path::PathBuf;

use async_trait::async_trait;
use itax_core::db::{DbConfig, RepositoryError, RepositoryFactory, TaxRulesRepository};

use crate::repository::SqliteRepository;

/// Seed files bundled with the rule tables.
///
/// `ITAX_SQLITE_SEEDS_DIR` wins, then `./seeds` when present, then the
/// crate's own `seeds/` directory.
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ITAX_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let local = PathBuf::from("./seeds");
    if local.is_dir() {
        local
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
    }
}

/// The `"sqlite"` backend.
///
/// ```rust,no_run
/// use itax_core::db::RepositoryRegistry;
/// use itax_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// `connection_string` is a file path (created if missing), a sqlx URL
    /// or `:memory:`. The schema is migrated and seed rules applied before
    /// the repository is returned.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TaxRulesRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        repo.run_seeds(&seeds_dir()).await?;
        Ok(Box::new(repo))
    }
}
