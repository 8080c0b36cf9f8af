//! Shared session store and its async actions.
//!
//! One [`SessionStore`] backs one dashboard session. Actions follow a
//! three-phase shape: mark the resource loading, await the gateway with
//! no lock held, then merge or record the failure and drop the flag.
//! Failures land in state, never in return values, so a driving UI only
//! ever renders snapshots.
//!
//! Responses are guarded by per-resource generations: a fetch owns the
//! generation it started under, and its response is merged only while
//! that generation is still current. Selection changes and newer fetches
//! bump the generation, so a slow response for yesterday's selection is
//! dropped whole instead of overwriting today's data. A dropped response
//! still lowers its loading flag unless a newer fetch of the same
//! resource has begun and owns the flag now.

use crate::state::{ResourceKind, SessionState};
use options_terminal_core::{OptionSide, OptionType, Position, SessionConfig};
use options_terminal_gateway::{GatewayClient, PayoffRequest};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, RwLock};

/// One leg the user wants to add, as entered in the strategy builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRequest {
    pub side: OptionSide,
    pub option_type: OptionType,
    pub strike: f64,
    pub premium: f64,
}

/// Generation pair guarding one cached resource.
///
/// `current` advances on every fetch start and every invalidation;
/// `begun` holds the generation of the most recent fetch. A response is
/// merged only while its generation equals `current`; it owns the
/// loading flag while its generation equals `begun`.
#[derive(Debug, Default)]
struct FetchGeneration {
    current: AtomicU64,
    begun: AtomicU64,
}

impl FetchGeneration {
    fn begin(&self) -> u64 {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.begun.store(generation, Ordering::SeqCst);
        generation
    }

    fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current.load(Ordering::SeqCst) == generation
    }

    fn owns_flag(&self, generation: u64) -> bool {
        self.begun.load(Ordering::SeqCst) == generation
    }
}

/// Generation counters for the cached resources.
///
/// Payoff has none on purpose: position appends are additive, and two
/// overlapping adds must both land.
#[derive(Debug, Default)]
struct Generations {
    expirations: FetchGeneration,
    chain: FetchGeneration,
    greeks: FetchGeneration,
    distribution: FetchGeneration,
    historical: FetchGeneration,
}

/// Session store shared between the UI and its background tasks.
///
/// All methods take `&self`; wrap the store in an `Arc` to drive it from
/// several tasks. The state lock is never held across a gateway await.
pub struct SessionStore {
    state: RwLock<SessionState>,
    gateway: GatewayClient,
    config: SessionConfig,
    generations: Generations,
    watch_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Creates a store seeded with the configured default underlying.
    #[must_use]
    pub fn new(gateway: GatewayClient, config: SessionConfig) -> Self {
        let initial = SessionState::new(config.default_underlying.clone());
        let (watch_tx, _) = watch::channel(initial.clone());
        Self {
            state: RwLock::new(initial),
            gateway,
            config,
            generations: Generations::default(),
            watch_tx,
        }
    }

    /// Subscribes to state snapshots; every mutation publishes one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.watch_tx.subscribe()
    }

    /// One-shot snapshot of the current state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Switches the underlying.
    ///
    /// Applies the state cascade and invalidates every in-flight response
    /// the old underlying could still deliver, the expiration list
    /// included.
    pub async fn set_underlying(&self, ticker: impl Into<String>) {
        let mut state = self.state.write().await;
        state.set_underlying(ticker);
        self.generations.expirations.invalidate();
        self.invalidate_expiration_data();
        self.publish(&state);
    }

    /// Switches the expiration within the current underlying.
    pub async fn set_expiration(&self, expiration: impl Into<String>) {
        let mut state = self.state.write().await;
        state.set_expiration(expiration);
        self.invalidate_expiration_data();
        self.publish(&state);
    }

    // =========================================================================
    // Fetch actions
    // =========================================================================

    /// Loads the expiration list for the selected underlying.
    ///
    /// Merging auto-selects the first expiration; when that changes the
    /// selection, the per-expiration caches are invalidated exactly as a
    /// manual expiration switch would.
    pub async fn fetch_expirations(&self) {
        let Some(underlying) = self.underlying_for(ResourceKind::Expirations).await else {
            return;
        };

        let generation = self
            .begin_fetch(ResourceKind::Expirations, &self.generations.expirations)
            .await;
        let result = self.gateway.expirations(&underlying).await;

        let mut state = self.state.write().await;
        if !self.generations.expirations.is_current(generation) {
            self.drop_superseded(
                &mut state,
                ResourceKind::Expirations,
                &self.generations.expirations,
                generation,
            );
            return;
        }
        match result {
            Ok(listing) => {
                let before = state.selected_expiration.clone();
                state.merge_expirations(listing);
                if state.selected_expiration != before {
                    self.invalidate_expiration_data();
                }
            }
            Err(err) => state.fail(
                ResourceKind::Expirations,
                format!("failed to load expirations: {err}"),
            ),
        }
        state.finish(ResourceKind::Expirations);
        self.publish(&state);
    }

    /// Loads the option chain for the selected expiration.
    pub async fn fetch_chain(&self) {
        let Some((underlying, expiration)) = self.selection_for(ResourceKind::Chain).await else {
            return;
        };

        let generation = self
            .begin_fetch(ResourceKind::Chain, &self.generations.chain)
            .await;
        let result = self.gateway.option_chain(&underlying, &expiration).await;

        let mut state = self.state.write().await;
        if !self.generations.chain.is_current(generation) {
            self.drop_superseded(
                &mut state,
                ResourceKind::Chain,
                &self.generations.chain,
                generation,
            );
            return;
        }
        match result {
            Ok(chain) => state.merge_chain(chain),
            Err(err) => state.fail(
                ResourceKind::Chain,
                format!("failed to load option chain: {err}"),
            ),
        }
        state.finish(ResourceKind::Chain);
        self.publish(&state);
    }

    /// Loads per-contract Greeks for the selected expiration.
    pub async fn fetch_greeks(&self) {
        let Some((underlying, expiration)) = self.selection_for(ResourceKind::Greeks).await else {
            return;
        };

        let generation = self
            .begin_fetch(ResourceKind::Greeks, &self.generations.greeks)
            .await;
        let result = self.gateway.greeks(&underlying, &expiration).await;

        let mut state = self.state.write().await;
        if !self.generations.greeks.is_current(generation) {
            self.drop_superseded(
                &mut state,
                ResourceKind::Greeks,
                &self.generations.greeks,
                generation,
            );
            return;
        }
        match result {
            Ok(greeks) => state.merge_greeks(greeks),
            Err(err) => state.fail(
                ResourceKind::Greeks,
                format!("failed to load greeks: {err}"),
            ),
        }
        state.finish(ResourceKind::Greeks);
        self.publish(&state);
    }

    /// Loads the implied distribution for the selected expiration.
    ///
    /// Moneyness bounds fall back to the configured defaults when absent.
    pub async fn fetch_distribution(&self, min_moneyness: Option<f64>, max_moneyness: Option<f64>) {
        let Some((underlying, expiration)) =
            self.selection_for(ResourceKind::Distribution).await
        else {
            return;
        };
        let min = min_moneyness.unwrap_or(self.config.min_moneyness);
        let max = max_moneyness.unwrap_or(self.config.max_moneyness);

        let generation = self
            .begin_fetch(ResourceKind::Distribution, &self.generations.distribution)
            .await;
        let result = self
            .gateway
            .implied_distribution(&underlying, &expiration, Some(min), Some(max))
            .await;

        let mut state = self.state.write().await;
        if !self.generations.distribution.is_current(generation) {
            self.drop_superseded(
                &mut state,
                ResourceKind::Distribution,
                &self.generations.distribution,
                generation,
            );
            return;
        }
        match result {
            Ok(distribution) => state.merge_distribution(distribution),
            Err(err) => state.fail(
                ResourceKind::Distribution,
                format!("failed to load distribution: {err}"),
            ),
        }
        state.finish(ResourceKind::Distribution);
        self.publish(&state);
    }

    /// Loads price history for the selected underlying.
    ///
    /// Period and interval fall back to the configured defaults when
    /// absent.
    pub async fn fetch_historical(&self, period: Option<&str>, interval: Option<&str>) {
        let Some(underlying) = self.underlying_for(ResourceKind::Historical).await else {
            return;
        };
        let period = period.unwrap_or(&self.config.historical_period);
        let interval = interval.unwrap_or(&self.config.historical_interval);

        let generation = self
            .begin_fetch(ResourceKind::Historical, &self.generations.historical)
            .await;
        let result = self
            .gateway
            .historical_prices(&underlying, Some(period), Some(interval))
            .await;

        let mut state = self.state.write().await;
        if !self.generations.historical.is_current(generation) {
            self.drop_superseded(
                &mut state,
                ResourceKind::Historical,
                &self.generations.historical,
                generation,
            );
            return;
        }
        match result {
            Ok(historical) => state.merge_historical(historical),
            Err(err) => state.fail(
                ResourceKind::Historical,
                format!("failed to load price history: {err}"),
            ),
        }
        state.finish(ResourceKind::Historical);
        self.publish(&state);
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Prices a leg and appends it to the working strategy.
    ///
    /// The payoff grid is anchored on the cached chain spot, or on the
    /// configured fallback when no chain is loaded yet. When the Greeks
    /// cache is empty, a full Greeks fetch runs inline so the leg can
    /// carry its per-contract record; a leg whose strike has no record
    /// is stored without one.
    pub async fn add_position(&self, request: PositionRequest) {
        let (underlying, expiration, cached_spot) = {
            let state = self.state.read().await;
            let Some(expiration) = state.selected_expiration.clone() else {
                tracing::warn!("position skipped: no expiration selected");
                return;
            };
            (
                state.selected_underlying.clone(),
                expiration,
                state.chain.as_ref().map(|chain| chain.spot),
            )
        };

        // Bad form input degrades to a zero premium, not a rejected leg.
        let premium = if request.premium.is_finite() && request.premium >= 0.0 {
            request.premium
        } else {
            tracing::warn!("unusable premium {}, storing 0.0", request.premium);
            0.0
        };

        {
            let mut state = self.state.write().await;
            state.begin(ResourceKind::Payoff);
            self.publish(&state);
        }

        let anchor = cached_spot.unwrap_or(self.config.fallback_spot);
        let payoff_request = PayoffRequest::new(
            request.side,
            request.option_type,
            &underlying,
            request.strike,
            &expiration,
        )
        .with_spot_range(
            anchor * self.config.spot_range_lower,
            anchor * self.config.spot_range_upper,
        );

        let profile = match self.gateway.payoff_profile(&payoff_request).await {
            Ok(profile) => profile,
            Err(err) => {
                let mut state = self.state.write().await;
                state.fail(
                    ResourceKind::Payoff,
                    format!("failed to price position: {err}"),
                );
                state.finish(ResourceKind::Payoff);
                self.publish(&state);
                return;
            }
        };

        if self.state.read().await.greeks.is_none() {
            self.fetch_greeks().await;
        }

        let greeks = {
            let state = self.state.read().await;
            state
                .greeks
                .as_ref()
                .and_then(|chain| chain.lookup(request.option_type, request.strike))
                .cloned()
        };
        if greeks.is_none() {
            tracing::warn!(
                "no {} greeks at strike {}, storing the leg without them",
                request.option_type,
                request.strike
            );
        }

        let mut state = self.state.write().await;
        state.push_position(Position {
            side: request.side,
            option_type: request.option_type,
            strike: request.strike,
            premium,
            payoff: profile.curve(),
            greeks,
        });
        state.finish(ResourceKind::Payoff);
        self.publish(&state);
    }

    /// Removes the leg at `index`; out of range is a no-op.
    pub async fn remove_position(&self, index: usize) {
        let mut state = self.state.write().await;
        state.remove_position(index);
        self.publish(&state);
    }

    /// Empties the working strategy.
    pub async fn clear_positions(&self) {
        let mut state = self.state.write().await;
        state.clear_positions();
        self.publish(&state);
    }

    /// Drops every cached dataset and the basket; keeps the selection.
    pub async fn clear_data(&self) {
        let mut state = self.state.write().await;
        state.clear_data();
        self.publish(&state);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Phase one of a fetch: flag up, error cleared, generation bumped.
    ///
    /// Returns the generation this request owns; its response is merged
    /// only while that generation is still current.
    async fn begin_fetch(&self, kind: ResourceKind, generation: &FetchGeneration) -> u64 {
        let mut state = self.state.write().await;
        state.begin(kind);
        let current = generation.begin();
        self.publish(&state);
        current
    }

    /// Phase three of a superseded fetch: the payload is discarded. The
    /// loading flag falls too unless a newer fetch has begun and owns it
    /// now; a selection change bumps the generation without starting
    /// one, leaving the superseded fetch responsible for its flag.
    fn drop_superseded(
        &self,
        state: &mut SessionState,
        kind: ResourceKind,
        generation: &FetchGeneration,
        owned: u64,
    ) {
        tracing::debug!("{} response dropped: superseded", kind.as_str());
        if generation.owns_flag(owned) {
            state.finish(kind);
            self.publish(state);
        }
    }

    /// Invalidates in-flight responses for the per-expiration datasets.
    fn invalidate_expiration_data(&self) {
        self.generations.chain.invalidate();
        self.generations.greeks.invalidate();
        self.generations.distribution.invalidate();
    }

    async fn underlying_for(&self, kind: ResourceKind) -> Option<String> {
        let state = self.state.read().await;
        if state.selected_underlying.is_empty() {
            tracing::warn!("{} fetch skipped: no underlying selected", kind.as_str());
            return None;
        }
        Some(state.selected_underlying.clone())
    }

    async fn selection_for(&self, kind: ResourceKind) -> Option<(String, String)> {
        let state = self.state.read().await;
        if state.selected_underlying.is_empty() {
            tracing::warn!("{} fetch skipped: no underlying selected", kind.as_str());
            return None;
        }
        let Some(expiration) = state.selected_expiration.clone() else {
            tracing::warn!("{} fetch skipped: no expiration selected", kind.as_str());
            return None;
        };
        Some((state.selected_underlying.clone(), expiration))
    }

    /// Publishes a snapshot. Callers hold the state lock, so snapshots
    /// leave in mutation order.
    fn publish(&self, state: &SessionState) {
        self.watch_tx.send_replace(state.clone());
    }
}
