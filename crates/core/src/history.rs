//! Search-history sink. Persisting history belongs to the HTTP layer's
//! collaborators; the engine never writes it.

use async_trait::async_trait;

use crate::repository::RepositoryError;
use crate::search::SearchRequest;
use crate::usage::Identity;

#[async_trait]
pub trait SearchHistory: Send + Sync {
    /// Record one admitted search.
    async fn record(
        &self,
        search_id: &str,
        identity: &Identity,
        request: &SearchRequest,
    ) -> Result<(), RepositoryError>;
}
