use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};

use crate::{
    config::Config,
    db::KeyValueStore,
    error::{AppError, AppResult},
    models::{CatalogId, Identity, MediaKind, RecommendationResult, RecommendationView, Seed},
    services::{
        fetcher::RecommendationFetcher,
        providers::CatalogProvider,
        recent_searches::RecentSearches,
        recommendation_cache::RecommendationCache,
        rotation::RotationPresenter,
        seed_resolver::SeedResolver,
        seed_store::SeedStore,
        session::Session,
        signals::{SignalBus, SignalKind, Subscription},
    },
};

/// Tunables of the recommendation pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub freshness: chrono::Duration,
    pub rotation_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            freshness: chrono::Duration::hours(6),
            rotation_interval: Duration::from_millis(4500),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            freshness: config.recommendation_ttl(),
            rotation_interval: config.rotation_interval(),
        }
    }
}

/// How one pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Nothing to recommend from; the panel was cleared
    NoSeed,
    /// A fresh cached result for the same seed was adopted
    CacheHit,
    /// A new result was fetched, cached and adopted
    Computed,
    /// The catalog failed; the panel was cleared
    Unavailable,
    /// A newer run started meanwhile; this run's result was dropped
    Superseded,
}

/// Label and media kind of the adopted result; the candidate itself lives in the presenter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub label: Option<String>,
    pub media_kind: Option<MediaKind>,
    /// Generation of the run that produced this state
    pub generation: u64,
}

enum Commit {
    Clear,
    Adopt {
        result: RecommendationResult,
        write_cache: bool,
    },
}

/// Drives seed resolution, caching, fetching and rotation for the landing page
pub struct RecommendationService {
    seeds: SeedStore,
    recent: RecentSearches,
    resolver: SeedResolver,
    cache: RecommendationCache,
    fetcher: RecommendationFetcher,
    session: Session,
    bus: SignalBus,
    presenter: RotationPresenter,
    generation: AtomicU64,
    commit_lock: Mutex<()>,
    panel: watch::Sender<PanelState>,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn CatalogProvider>,
        bus: SignalBus,
        session: Session,
        settings: PipelineSettings,
    ) -> Self {
        let seeds = SeedStore::new(Arc::clone(&store), bus.clone());
        let recent = RecentSearches::new(Arc::clone(&store));
        let (panel, _) = watch::channel(PanelState::default());

        Self {
            resolver: SeedResolver::new(seeds.clone(), recent.clone()),
            cache: RecommendationCache::new(store, settings.freshness),
            fetcher: RecommendationFetcher::new(catalog),
            presenter: RotationPresenter::new(settings.rotation_interval),
            generation: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
            seeds,
            recent,
            session,
            bus,
            panel,
        }
    }

    /// Starts reacting to seed and auth changes, and runs the pipeline once
    ///
    /// Every signal starts a fresh run; an older run still in flight is
    /// superseded and its result dropped.
    pub fn start(self: &Arc<Self>) -> PipelineHandle {
        let subscriptions = [SignalKind::SeedChanged, SignalKind::AuthChanged]
            .into_iter()
            .map(|kind| {
                let service = Arc::clone(self);
                self.bus.on_signal(kind, move |signal| {
                    tracing::debug!(?signal, "Recommendation pipeline triggered");
                    service.spawn_run();
                })
            })
            .collect();

        self.spawn_run();
        tracing::info!("Recommendation pipeline started");

        PipelineHandle {
            service: Arc::clone(self),
            subscriptions,
        }
    }

    /// Runs the pipeline once for the current identity and waits for it
    pub async fn refresh(&self) -> PipelineOutcome {
        let generation = self.next_generation();
        self.run(generation).await
    }

    /// Records a submitted search and makes it the seed
    ///
    /// Returns the updated recent-search list.
    pub async fn record_search(&self, term: &str) -> AppResult<Vec<String>> {
        let cleaned = term.trim();
        if cleaned.is_empty() {
            return Err(AppError::InvalidInput(
                "Search term cannot be empty".to_string(),
            ));
        }

        let identity = self.session.identity().await;
        self.seeds
            .write_seed(&identity, &Seed::search(cleaned, Utc::now()))
            .await?;
        let recent = self.recent.record(&identity, cleaned).await.map_err(|e| {
            tracing::warn!(error = %e, identity = %identity, "Seed stored but search history not updated");
            e
        })?;

        tracing::info!(identity = %identity, term = %cleaned, "Search recorded");
        Ok(recent)
    }

    /// Makes a title just added to a playlist the seed
    pub async fn record_playlist_add(
        &self,
        catalog_id: CatalogId,
        media_kind: MediaKind,
    ) -> AppResult<()> {
        let identity = self.session.identity().await;
        self.seeds
            .write_seed(
                &identity,
                &Seed::playlist_add(catalog_id, media_kind, Utc::now()),
            )
            .await?;

        tracing::info!(identity = %identity, catalog_id, media_kind = %media_kind, "Playlist add recorded");
        Ok(())
    }

    pub async fn recent_searches(&self) -> Vec<String> {
        let identity = self.session.identity().await;
        self.recent.list(&identity).await
    }

    pub async fn clear_recent_searches(&self) -> AppResult<()> {
        let identity = self.session.identity().await;
        self.recent.clear(&identity).await
    }

    /// What the page should show right now
    pub fn view(&self) -> RecommendationView {
        let panel = self.panel.borrow().clone();
        let candidate = self.presenter.current();

        RecommendationView {
            has_recommendations: candidate.is_some(),
            candidate,
            label: panel.label,
            media_kind: panel.media_kind,
        }
    }

    /// Notified whenever a run commits to the panel
    pub fn watch_panel(&self) -> watch::Receiver<PanelState> {
        self.panel.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn presenter(&self) -> &RotationPresenter {
        &self.presenter
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn spawn_run(self: &Arc<Self>) {
        // Claim the generation before spawning so runs are ordered by signal arrival.
        let generation = self.next_generation();
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.run(generation).await;
        });
    }

    #[tracing::instrument(skip(self), fields(identity))]
    async fn run(&self, generation: u64) -> PipelineOutcome {
        let identity = self.session.identity().await;
        tracing::Span::current().record("identity", tracing::field::display(&identity));

        let seed = match self.resolve(&identity).await {
            Ok(seed) => seed,
            Err(e) => {
                tracing::debug!(error = %e, "Nothing to recommend");
                return self
                    .commit(generation, &identity, Commit::Clear)
                    .await
                    .unwrap_or(PipelineOutcome::NoSeed);
            }
        };

        if let Some(cached) = self.cache.read_cache(&identity, Utc::now()).await {
            if cached.seed.same_subject(&seed) {
                let commit = Commit::Adopt {
                    result: cached,
                    write_cache: false,
                };
                return self
                    .commit(generation, &identity, commit)
                    .await
                    .unwrap_or(PipelineOutcome::CacheHit);
            }
            tracing::debug!("Cached recommendation belongs to an older seed");
        }

        match self.fetcher.fetch(&seed).await {
            Ok(result) => {
                let commit = Commit::Adopt {
                    result,
                    write_cache: true,
                };
                self.commit(generation, &identity, commit)
                    .await
                    .unwrap_or(PipelineOutcome::Computed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendations unavailable");
                self.commit(generation, &identity, Commit::Clear)
                    .await
                    .unwrap_or(PipelineOutcome::Unavailable)
            }
        }
    }

    async fn resolve(&self, identity: &Identity) -> AppResult<Seed> {
        self.resolver.resolve(identity).await.ok_or(AppError::NoSeed)
    }

    /// Applies a run's outcome unless a newer run has started since.
    ///
    /// Returns `Some(Superseded)` when the outcome was dropped, `None` when applied.
    async fn commit(
        &self,
        generation: u64,
        identity: &Identity,
        commit: Commit,
    ) -> Option<PipelineOutcome> {
        let _guard = self.commit_lock.lock().await;

        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            tracing::debug!(generation, latest, "Dropping superseded recommendation run");
            return Some(PipelineOutcome::Superseded);
        }

        match commit {
            Commit::Clear => {
                self.presenter.adopt(Vec::new());
                self.panel.send_replace(PanelState {
                    label: None,
                    media_kind: None,
                    generation,
                });
            }
            Commit::Adopt {
                result,
                write_cache,
            } => {
                if write_cache {
                    if let Err(e) = self.cache.write_cache(identity, &result).await {
                        tracing::warn!(error = %e, "Failed to cache recommendations");
                    }
                }

                self.presenter.adopt(result.items);
                self.panel.send_replace(PanelState {
                    label: result.label,
                    media_kind: Some(result.media_kind),
                    generation,
                });
            }
        }

        None
    }
}

/// Keeps the pipeline subscribed to signals until shut down
pub struct PipelineHandle {
    service: Arc<RecommendationService>,
    subscriptions: Vec<Subscription>,
}

impl PipelineHandle {
    pub fn service(&self) -> &Arc<RecommendationService> {
        &self.service
    }

    /// Drops the signal subscriptions and stops rotation
    pub fn shutdown(self) {
        drop(self.subscriptions);
        self.service.presenter.shutdown();
        tracing::info!("Recommendation pipeline stopped");
    }
}
