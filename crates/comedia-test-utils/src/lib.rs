//! Testing utilities for the Método Comedia workspace
//!
//! Shared fakes, fixtures, and helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use comedia_offline::{
    CacheError, CacheStorage, CacheStore, MemoryCacheStorage, Network, NetworkError, Request,
    RequestKey, Response, StatusCode,
};
use comedia_wizard::{
    AnalysisBackend, AnalysisId, AnalysisRecord, BackendError, Category, CategoryKind, Field,
    ListFilter, Section, SimilarQuery, StoredAnalysis, WizardController,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

pub const TEST_ORIGIN: &str = "http://localhost:5000/";

/// Absolute URL under the test origin
pub fn test_url(path: &str) -> Url {
    Url::parse(TEST_ORIGIN).unwrap().join(path).unwrap()
}

/// Complete record that passes every wizard check
pub fn sample_record() -> AnalysisRecord {
    AnalysisRecord {
        titulo: "La comida de avión".to_string(),
        comediante: "Jerry Seinfeld".to_string(),
        premisa: "¿Qué pasa con la comida de avión?\nNadie la pidió".to_string(),
        ruptura: "La bandeja es más pequeña que el plato".to_string(),
        remate: "Y aun así sobra".to_string(),
        perspectiva_categoria: Some("observacional".to_string()),
        actitud: Some("indignación".to_string()),
        notas: Some("Ritmo de tres".to_string()),
        ..AnalysisRecord::default()
    }
}

/// Fill every required wizard input from `record`, staying on step 1
pub fn fill_required<B: AnalysisBackend>(wizard: &mut WizardController<B>, record: &AnalysisRecord) {
    wizard.set_field(Field::Title, record.titulo.clone());
    wizard.set_field(Field::Author, record.comediante.clone());
    for (section, block) in [
        (Section::Premise, &record.premisa),
        (Section::Rupture, &record.ruptura),
        (Section::Punchline, &record.remate),
    ] {
        let mut lines = block.split('\n');
        let first = wizard.state().lines(section).live().next().map(|(k, _)| k);
        if let (Some(key), Some(text)) = (first, lines.next()) {
            wizard.edit_line(section, key, text).unwrap();
        }
        for text in lines {
            wizard.add_line(section, text);
        }
    }
}

/// Advance until the last step, panicking on validation failure
pub fn advance_to_end<B: AnalysisBackend>(wizard: &mut WizardController<B>) {
    while !wizard.current_step().is_final() {
        wizard.advance().unwrap();
    }
}

/// In-memory analysis backend
#[derive(Debug, Default)]
pub struct FakeBackend {
    records: Mutex<HashMap<String, AnalysisRecord>>,
    categories: Mutex<Vec<Category>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend already holding `record` under `id`
    pub fn with_record(self, id: &str, record: AnalysisRecord) -> Self {
        self.records.lock().insert(id.to_string(), record);
        self
    }

    /// Backend holding one option per `(kind, valor)`
    pub fn with_categories(self, options: &[(CategoryKind, &str)]) -> Self {
        {
            let mut categories = self.categories.lock();
            for (orden, (kind, valor)) in options.iter().enumerate() {
                categories.push(Category {
                    id: Some(format!("cat-{orden}")),
                    tipo: *kind,
                    valor: (*valor).to_string(),
                    orden: i32::try_from(orden).unwrap(),
                });
            }
        }
        self
    }

    /// Make every create/update fail with a 500 until switched back
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn record(&self, id: &str) -> Option<AnalysisRecord> {
        self.records.lock().get(id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Stored records sorted by id
    fn stored(&self) -> Vec<StoredAnalysis> {
        let mut stored: Vec<_> = self
            .records
            .lock()
            .iter()
            .map(|(id, record)| StoredAnalysis {
                id: AnalysisId::new(id.as_str()),
                record: record.clone(),
            })
            .collect();
        stored.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        stored
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(BackendError::rejected(500, "database unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn create(&self, record: &AnalysisRecord) -> Result<StoredAnalysis, BackendError> {
        self.check_writable()?;
        let id = format!("analysis-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.records.lock().insert(id.clone(), record.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(StoredAnalysis {
            id: AnalysisId::new(id),
            record: record.clone(),
        })
    }

    async fn update(
        &self,
        id: &AnalysisId,
        record: &AnalysisRecord,
    ) -> Result<StoredAnalysis, BackendError> {
        self.check_writable()?;
        let mut records = self.records.lock();
        let slot = records
            .get_mut(id.as_str())
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        *slot = record.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(StoredAnalysis {
            id: id.clone(),
            record: record.clone(),
        })
    }

    async fn fetch(&self, id: &AnalysisId) -> Result<AnalysisRecord, BackendError> {
        self.record(id.as_str())
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredAnalysis>, BackendError> {
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .stored()
            .into_iter()
            .filter(|s| filter.matches(&s.record))
            .take(limit)
            .collect())
    }

    async fn delete(&self, id: &AnalysisId) -> Result<(), BackendError> {
        self.check_writable()?;
        self.records
            .lock()
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<StoredAnalysis>, BackendError> {
        let mut scored: Vec<_> = self
            .stored()
            .into_iter()
            .map(|s| (query.shared_categories(&s.record), s))
            .filter(|(shared, _)| *shared > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .map(|(_, s)| s)
            .take(query.limit as usize)
            .collect())
    }

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>, BackendError> {
        Ok(self
            .categories
            .lock()
            .iter()
            .filter(|c| c.tipo == kind)
            .cloned()
            .collect())
    }

    async fn add_category(
        &self,
        kind: CategoryKind,
        valor: &str,
    ) -> Result<Category, BackendError> {
        if valor.is_empty() {
            return Err(BackendError::rejected(400, "Tipo y valor son obligatorios"));
        }
        let mut categories = self.categories.lock();
        let category = Category {
            id: Some(format!("cat-{}", categories.len())),
            tipo: kind,
            valor: valor.to_string(),
            orden: 0,
        };
        categories.push(category.clone());
        Ok(category)
    }
}

/// Network answering from a route table, switchable offline
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with `response` from now on
    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().insert(test_url(path).to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs requested so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.lock().push(request.url().to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unavailable("connection refused".to_string()));
        }
        Ok(self
            .routes
            .lock()
            .get(request.url().as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}

/// Storage whose stores reject every write
#[derive(Debug, Default)]
pub struct FullCacheStorage {
    inner: MemoryCacheStorage,
}

struct FullStore {
    inner: Arc<dyn CacheStore>,
}

#[async_trait]
impl CacheStore for FullStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        self.inner.lookup(key).await
    }

    async fn put(&self, key: RequestKey, _response: Response) -> Result<(), CacheError> {
        Err(CacheError::QuotaExceeded(key.to_string()))
    }

    async fn keys(&self) -> Vec<RequestKey> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FullCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, CacheError> {
        let inner = self.inner.open(name).await?;
        let store: Arc<dyn CacheStore> = Arc::new(FullStore { inner });
        Ok(store)
    }

    async fn names(&self) -> Vec<String> {
        self.inner.names().await
    }

    async fn delete(&self, name: &str) -> bool {
        self.inner.delete(name).await
    }
}
