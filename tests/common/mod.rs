#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tokio::sync::{mpsc, Notify};

use reel_recs::{
    db::{KeyValueStore, MemoryStore, StorageKey},
    error::{AppError, AppResult},
    models::{CatalogId, CatalogSummary, DiscoverQuery, MediaKind, PagedResult, TitleDetails},
    services::{
        providers::CatalogProvider, PipelineSettings, RecommendationService, Session, SignalBus,
    },
};

/// In-process catalog with scripted search hits and optional gates on details lookups.
///
/// `details(id)` reports genre `[id]`, so a discover for that genre returns the
/// seed itself plus `id * 10 + 1 ..= id * 10 + 6`.
pub struct FakeCatalog {
    search_hits: Vec<(String, MediaKind, Vec<CatalogId>)>,
    gates: HashMap<CatalogId, Arc<Notify>>,
    entered: mpsc::UnboundedSender<CatalogId>,
    failing: bool,
    discover_queries: Mutex<Vec<DiscoverQuery>>,
}

impl FakeCatalog {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CatalogId>) {
        let (entered, rx) = mpsc::unbounded_channel();
        let catalog = Self {
            search_hits: Vec::new(),
            gates: HashMap::new(),
            entered,
            failing: false,
            discover_queries: Mutex::new(Vec::new()),
        };
        (catalog, rx)
    }

    pub fn with_search(mut self, term: &str, media_kind: MediaKind, ids: &[CatalogId]) -> Self {
        self.search_hits
            .push((term.to_lowercase(), media_kind, ids.to_vec()));
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Holds `details(catalog_id)` until the returned gate is notified
    pub fn gate(&mut self, catalog_id: CatalogId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.insert(catalog_id, Arc::clone(&gate));
        gate
    }

    pub fn discover_queries(&self) -> Vec<DiscoverQuery> {
        self.discover_queries.lock().unwrap().clone()
    }
}

pub fn summary(id: CatalogId) -> CatalogSummary {
    CatalogSummary {
        id,
        title: format!("Title {id}"),
        overview: String::new(),
        backdrop_path: Some(format!("/backdrop-{id}.jpg")),
        poster_path: None,
        genre_ids: Vec::new(),
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn search(
        &self,
        term: &str,
        media_kind: MediaKind,
        _page: u32,
    ) -> AppResult<PagedResult<CatalogSummary>> {
        if self.failing {
            return Err(AppError::CatalogUnavailable("search".to_string()));
        }

        let term = term.to_lowercase();
        let hits = self
            .search_hits
            .iter()
            .find(|(t, kind, _)| *t == term && *kind == media_kind)
            .map(|(_, _, ids)| ids.iter().copied().map(summary).collect())
            .unwrap_or_default();
        Ok(PagedResult::from_results(hits))
    }

    async fn details(
        &self,
        catalog_id: CatalogId,
        _media_kind: MediaKind,
    ) -> AppResult<TitleDetails> {
        if let Some(gate) = self.gates.get(&catalog_id) {
            let _ = self.entered.send(catalog_id);
            gate.notified().await;
        }

        if self.failing {
            return Err(AppError::CatalogUnavailable("details".to_string()));
        }

        Ok(TitleDetails {
            id: catalog_id,
            title: format!("Title {catalog_id}"),
            genres: vec![catalog_id],
            rating_average: 8.0,
        })
    }

    async fn discover(&self, query: &DiscoverQuery) -> AppResult<PagedResult<CatalogSummary>> {
        self.discover_queries.lock().unwrap().push(query.clone());

        let genre = query.genre_ids.first().copied().unwrap_or_default();
        let results = std::iter::once(genre)
            .chain((1..=6).map(|n| genre * 10 + n))
            .map(summary)
            .collect();
        Ok(PagedResult::from_results(results))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct Harness {
    pub service: Arc<RecommendationService>,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<FakeCatalog>,
}

pub fn harness(catalog: FakeCatalog) -> Harness {
    let store = Arc::new(MemoryStore::new());
    harness_over(catalog, store.clone(), store)
}

/// Harness whose service reads `key` through a [`GatedStore`]
pub fn gated_harness(catalog: FakeCatalog, key: StorageKey) -> (Harness, Arc<GatedStore>) {
    let store = Arc::new(MemoryStore::new());
    let gated = Arc::new(GatedStore::new(store.clone(), key));
    (harness_over(catalog, store, gated.clone()), gated)
}

fn harness_over(
    catalog: FakeCatalog,
    store: Arc<MemoryStore>,
    backend: Arc<dyn KeyValueStore>,
) -> Harness {
    let catalog = Arc::new(catalog);
    let bus = SignalBus::default();
    let service = Arc::new(RecommendationService::new(
        backend,
        catalog.clone(),
        bus.clone(),
        Session::new(bus),
        PipelineSettings {
            rotation_interval: Duration::from_secs(3600),
            ..PipelineSettings::default()
        },
    ));

    Harness {
        service,
        store,
        catalog,
    }
}

/// Memory storage that, once armed, holds the next read of one key until released
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    key: StorageKey,
    armed: AtomicBool,
    gate: Notify,
    entered: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryStore>, key: StorageKey) -> Self {
        Self {
            inner,
            key,
            armed: AtomicBool::new(false),
            gate: Notify::new(),
            entered: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once the armed read is being held
    pub async fn held(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        if *key == self.key && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &StorageKey, value: String) -> AppResult<()> {
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &StorageKey, value: String) -> AppResult<bool> {
        self.inner.set_if_absent(key, value).await
    }

    async fn remove(&self, key: &StorageKey) -> AppResult<()> {
        self.inner.remove(key).await
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// An unsigned bearer token whose payload names `user_id`
pub fn token_for(user_id: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"user_id":{user_id}}}"#));
    format!("{header}.{payload}.signature")
}
