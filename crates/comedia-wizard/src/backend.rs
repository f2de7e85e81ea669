//! Backend collaborator consumed by the wizard.

use crate::error::BackendError;
use crate::record::{
    AnalysisId, AnalysisRecord, Category, CategoryKind, ListFilter, SimilarQuery, StoredAnalysis,
};
use async_trait::async_trait;

/// Storage API for structured analyses and their category lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Store a new analysis
    async fn create(&self, record: &AnalysisRecord) -> Result<StoredAnalysis, BackendError>;

    /// Replace an existing analysis
    async fn update(
        &self,
        id: &AnalysisId,
        record: &AnalysisRecord,
    ) -> Result<StoredAnalysis, BackendError>;

    /// Fetch an analysis by identity
    async fn fetch(&self, id: &AnalysisId) -> Result<AnalysisRecord, BackendError>;

    /// Stored analyses passing `filter`, in backend order
    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredAnalysis>, BackendError>;

    /// Soft-delete an analysis; it disappears from listings and lookups
    async fn delete(&self, id: &AnalysisId) -> Result<(), BackendError>;

    /// Analyses sharing categories with `query`
    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<StoredAnalysis>, BackendError>;

    /// Options for a selectable field
    async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>, BackendError>;

    /// Append a user-defined option
    async fn add_category(&self, kind: CategoryKind, valor: &str)
        -> Result<Category, BackendError>;
}

#[async_trait]
impl<B: AnalysisBackend + ?Sized> AnalysisBackend for std::sync::Arc<B> {
    async fn create(&self, record: &AnalysisRecord) -> Result<StoredAnalysis, BackendError> {
        (**self).create(record).await
    }

    async fn update(
        &self,
        id: &AnalysisId,
        record: &AnalysisRecord,
    ) -> Result<StoredAnalysis, BackendError> {
        (**self).update(id, record).await
    }

    async fn fetch(&self, id: &AnalysisId) -> Result<AnalysisRecord, BackendError> {
        (**self).fetch(id).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredAnalysis>, BackendError> {
        (**self).list(filter).await
    }

    async fn delete(&self, id: &AnalysisId) -> Result<(), BackendError> {
        (**self).delete(id).await
    }

    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<StoredAnalysis>, BackendError> {
        (**self).similar(query).await
    }

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>, BackendError> {
        (**self).categories(kind).await
    }

    async fn add_category(
        &self,
        kind: CategoryKind,
        valor: &str,
    ) -> Result<Category, BackendError> {
        (**self).add_category(kind, valor).await
    }
}
