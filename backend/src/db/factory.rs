//! Repository factory for dependency injection.
//!
//! Turns the storage part of the club configuration into a shared
//! `Arc<dyn FullRepository>` that the HTTP state holds.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;
use crate::api::Court;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("postgres", "pg", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryType::Postgres => "postgres",
            RepositoryType::Local => "local",
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use court_booking::db::{RepositoryConfig, RepositoryFactory};
///
/// let repo = RepositoryFactory::from_repository_config(&RepositoryConfig::default(), courts).await?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `postgres_config` - Database configuration (required for Postgres)
    /// * `courts` - Courts the repository should expose
    ///
    /// # Returns
    /// * `Ok(Arc<dyn FullRepository>)` - Shared repository instance
    /// * `Err(RepositoryError)` - If creation fails
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
        courts: Vec<Court>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = postgres_config.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Postgres repository requires PostgresConfig",
                        )
                    })?;
                    let pg = Self::create_postgres(config, courts).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    let _ = (postgres_config, courts);
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => Ok(Self::create_local(courts)),
        }
    }

    /// Create a Postgres repository and align its court table with `courts`.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
        courts: Vec<Court>,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::configuration(format!("Task join error: {}", e)))??;
        if !courts.is_empty() {
            let synced = repo.sync_courts(courts).await?;
            log::info!("synchronized {} configured courts", synced);
        }
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository seeded with `courts`.
    pub fn create_local(courts: Vec<Court>) -> Arc<dyn FullRepository> {
        if courts.is_empty() {
            Arc::new(LocalRepository::new())
        } else {
            Arc::new(LocalRepository::with_courts(courts))
        }
    }

    /// Create a repository from the storage sections of the configuration.
    pub async fn from_repository_config(
        config: &RepositoryConfig,
        courts: Vec<Court>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type()?;
        log::info!("initializing {} repository", repo_type.as_str());
        let pg_config = config.to_postgres_config()?;
        Self::create(repo_type, pg_config.as_ref(), courts).await
    }
}
