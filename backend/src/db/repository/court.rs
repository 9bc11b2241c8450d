//! Court lookups.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{Court, CourtId};

/// Read access to the club's courts.
///
/// Courts are provisioned by configuration or migrations; there is no write
/// path through the API.
#[async_trait]
pub trait CourtRepository: Send + Sync {
    /// List every court ordered by id.
    async fn list_courts(&self) -> RepositoryResult<Vec<Court>>;

    /// Fetch one court.
    ///
    /// # Returns
    /// * `Ok(Court)` - The court
    /// * `Err(RepositoryError::NotFound)` - If no court has this id
    async fn get_court(&self, id: CourtId) -> RepositoryResult<Court>;
}
