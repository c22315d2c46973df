//! Location Resolution Module
//!
//! This module turns free-text or coordinate queries into weather data,
//! falls back to a suggested location when the exact query is not found,
//! and races the positioning capability against a soft timeout for
//! "use my current location".
//!
//! Every attempt takes a generation number. Writes from an attempt are
//! applied only while it is still the newest one, so a slow earlier request
//! can never overwrite the result of a later query.

use crate::api::{LocationInput, LocationParser, WeatherApiClient, WeatherSource};
use crate::config::{ResolverConfig, WeatherDeskConfig};
use crate::geolocation::{self, Geolocator, PositionOptions};
use crate::state::{Notice, ResolutionState, ResolveError, ViewState, WidgetView};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const NOTICE_CAPACITY: usize = 32;
const SUGGESTION_NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Service for resolving location queries into weather data
#[derive(Clone)]
pub struct LocationResolver {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn WeatherSource>,
    geolocator: Arc<dyn Geolocator>,
    config: ResolverConfig,
    state: watch::Sender<ViewState>,
    notices: broadcast::Sender<Notice>,
    generation: AtomicU64,
    pending_retry: Mutex<Option<JoinHandle<()>>>,
}

impl LocationResolver {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geolocator: Arc<dyn Geolocator>,
        config: ResolverConfig,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                source,
                geolocator,
                config,
                state,
                notices,
                generation: AtomicU64::new(0),
                pending_retry: Mutex::new(None),
            }),
        }
    }

    /// Wire up the WeatherAPI client and the configured positioning provider
    pub fn from_config(config: &WeatherDeskConfig) -> crate::Result<Self> {
        config.require_api_key()?;
        let client = WeatherApiClient::new(&config.weather)?;
        let geolocator = geolocation::from_config(&config.geolocation)?;
        Ok(Self::new(Arc::new(client), geolocator, config.resolver.clone()))
    }

    /// Presentation action: remember `text` as the current query and resolve it
    pub async fn submit_query(&self, text: &str) {
        let text = text.to_string();
        self.inner.state.send_modify(|state| state.query.clone_from(&text));
        self.resolve(&text, false).await;
    }

    /// Presentation action: resolve weather for the current position
    pub async fn use_current_location(&self) {
        self.resolve_current_location().await;
    }

    /// Resolve `query` into weather data.
    ///
    /// Empty or whitespace-only queries are ignored. `is_auto_suggested`
    /// marks the delayed retry with a suggested location: it announces
    /// success with an info notice, fails silently, and never looks up
    /// another suggestion.
    pub async fn resolve(&self, query: &str, is_auto_suggested: bool) {
        if query.trim().is_empty() {
            debug!("Ignoring empty query");
            return;
        }

        let generation = self.begin_attempt(|state| {
            state.resolution = ResolutionState::Loading;
            state.suggestion = None;
        });

        match LocationParser::parse(query) {
            Ok(LocationInput::Coordinates(lat, lon)) => {
                info!("Resolving coordinates ({}, {}) [attempt {}]", lat, lon, generation);
            }
            _ => info!(
                "Resolving '{}' [attempt {}, auto-suggested: {}]",
                query, generation, is_auto_suggested
            ),
        }

        match self.inner.source.forecast(query).await {
            Ok(snapshot) => {
                let description = format!(
                    "Showing results for \"{}\" instead.",
                    snapshot.location.display_name()
                );
                info!("Resolved '{}' to {}", query, snapshot.location.display_name());

                let committed = self.commit(generation, |state| {
                    state.resolution = ResolutionState::Ready(Box::new(snapshot));
                    state.suggestion = None;
                });

                if committed && is_auto_suggested {
                    self.notify(Notice::info(
                        "Location Suggestion",
                        description,
                        SUGGESTION_NOTICE_DURATION,
                    ));
                }
            }
            Err(error) => {
                warn!("Failed to resolve '{}': {}", query, error);
                let resolve_error = ResolveError::from(&error);

                if error.is_location_not_found() && !is_auto_suggested {
                    self.suggest(query, generation).await;
                }

                let message = resolve_error.to_string();
                let committed = self.commit(generation, |state| {
                    state.resolution = ResolutionState::Failed(resolve_error);
                });

                if committed && !is_auto_suggested {
                    self.notify(Notice::error("Error", message));
                }
            }
        }
    }

    /// Look up an alternative for a query that matched no location.
    ///
    /// On a hit the first candidate becomes the suggestion and a retry with it
    /// is scheduled after the configured delay. Lookup failures are logged only.
    pub async fn find_suggestion(&self, query: &str) {
        let generation = self.current_generation();
        self.suggest(query, generation).await;
    }

    async fn suggest(&self, query: &str, generation: u64) {
        let candidates = match self.inner.source.search(query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!("Suggestion lookup for '{}' failed: {}", query, error);
                return;
            }
        };

        let Some(best) = candidates.first() else {
            debug!("No suggestions for '{}'", query);
            return;
        };

        let suggestion = best.suggestion();
        if !self.commit(generation, |state| state.suggestion = Some(suggestion.clone())) {
            return;
        }

        info!(
            "Suggesting '{}' for '{}', retrying in {:?}",
            suggestion,
            query,
            self.inner.config.suggestion_retry_delay()
        );
        let handle = tokio::spawn(self.retry_with_suggestion(suggestion, generation));
        *self.inner.pending_retry.lock().await = Some(handle);
    }

    fn retry_with_suggestion(&self, suggestion: String, generation: u64) -> BoxFuture<'static, ()> {
        let resolver = self.clone();
        let deadline = Instant::now() + self.inner.config.suggestion_retry_delay();

        Box::pin(async move {
            tokio::time::sleep_until(deadline).await;
            if resolver.current_generation() != generation {
                debug!("Skipping retry with '{}', a newer attempt started", suggestion);
                return;
            }
            resolver.resolve(&suggestion, true).await;
        })
    }

    /// Resolve weather for the position reported by the positioning capability.
    ///
    /// The request races a soft timeout; whichever finishes first decides the
    /// single outcome and the other is dropped.
    pub async fn resolve_current_location(&self) {
        let geolocator = Arc::clone(&self.inner.geolocator);

        if !geolocator.is_supported() {
            let error = ResolveError::GeolocationUnsupported;
            warn!("{}", error);
            self.inner
                .state
                .send_modify(|state| state.geo_error = Some(error.to_string()));
            self.notify(Notice::error(
                "Geolocation Not Supported",
                "Geolocation is not available. Please enter your location manually.",
            ));
            return;
        }

        let generation = self.begin_attempt(|state| {
            state.resolution = ResolutionState::Loading;
            state.suggestion = None;
            state.geo_error = None;
        });

        let config = &self.inner.config;
        let options = PositionOptions {
            enable_high_accuracy: config.high_accuracy,
            timeout: config.position_timeout(),
            maximum_age: Duration::ZERO,
        };
        info!("Requesting current position [attempt {}]", generation);

        let outcome = tokio::select! {
            result = geolocator.current_position(options) => Some(result),
            () = tokio::time::sleep(config.soft_timeout()) => None,
        };

        match outcome {
            Some(Ok(position)) => {
                let query = LocationParser::format_coordinates(position.latitude, position.longitude);
                debug!("Position fix: {}", query);
                if self.commit(generation, |state| state.query.clone_from(&query)) {
                    self.resolve(&query, false).await;
                }
            }
            Some(Err(error)) => {
                warn!("Positioning failed: {}", error);
                self.fail_geolocation(
                    generation,
                    "Geolocation Error",
                    ResolveError::from_position_error(&error),
                );
            }
            None => {
                warn!("Positioning did not answer within {:?}", config.soft_timeout());
                self.fail_geolocation(generation, "Geolocation Timeout", ResolveError::SoftTimeout);
            }
        }
    }

    fn fail_geolocation(&self, generation: u64, title: &str, error: ResolveError) {
        let message = error.to_string();
        let committed = self.commit(generation, |state| {
            state.geo_error = Some(message.clone());
            state.resolution = ResolutionState::Failed(error);
        });
        if committed {
            self.notify(Notice::error(title, message));
        }
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> WidgetView {
        self.inner.state.borrow().to_view()
    }

    /// Receiver that observes every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Receiver for notices published from now on
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Wait for a scheduled suggestion retry, if any, to finish
    pub async fn settled(&self) {
        loop {
            let handle = self.inner.pending_retry.lock().await.take();
            let Some(handle) = handle else {
                return;
            };
            if let Err(e) = handle.await {
                warn!("Suggestion retry task failed: {}", e);
            }
        }
    }

    fn current_generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Start a new attempt, superseding every earlier one
    fn begin_attempt(&self, update: impl FnOnce(&mut ViewState)) -> u64 {
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            update(state);
        });
        generation
    }

    /// Apply `update` only if attempt `generation` is still the newest
    fn commit(&self, generation: u64, update: impl FnOnce(&mut ViewState)) -> bool {
        let applied = self.inner.state.send_if_modified(|state| {
            if self.current_generation() != generation {
                return false;
            }
            update(state);
            true
        });
        if !applied {
            debug!("Discarding stale result of attempt {}", generation);
        }
        applied
    }

    fn notify(&self, notice: Notice) {
        info!("{}: {}", notice.title, notice.description);
        // no subscribers is fine
        let _ = self.inner.notices.send(notice);
    }
}
