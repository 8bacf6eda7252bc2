// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! The async entry point of the protocol.
//!
//! Each method reads the clock once, then runs one protocol operation as a
//! single store transaction. Conflicting transactions are re-run by the
//! store; the operation bodies hold no state outside the repository.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dss_geo::Volume4D;
use dss_models::{
    Constraint, EntityId, Manager, OperationalIntent, Ovn, Subscription, UssAvailability,
    UssAvailabilityStatus,
};
use dss_storage::{Repository, Store};
use tracing::instrument;

use crate::clock::{Clock, SystemClock};
use crate::config::to_chrono;
use crate::params::{
    ChangeResult, EvictionReport, PutConstraintParams, PutOperationalIntentParams,
    PutSubscriptionParams, RequestContext, SubscriptionResult,
};
use crate::{availability, constraint, evict, operational_intent, subscription};
use crate::{ScdConfig, ScdError};

pub struct ScdService<S, C = SystemClock> {
    store: S,
    config: Arc<ScdConfig>,
    clock: C,
}

impl<S: Store> ScdService<S> {
    pub fn new(store: S, config: ScdConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: Store, C: Clock> ScdService<S, C> {
    pub fn with_clock(store: S, config: ScdConfig, clock: C) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ScdConfig {
        &self.config
    }

    fn context(&self, manager: &Manager) -> RequestContext {
        RequestContext {
            manager: manager.clone(),
            now: self.clock.now(),
        }
    }

    // -- Operational intents --------------------------------------------

    /// Create (empty `ovn`) or update an operational intent.
    #[instrument(skip(self, params), fields(state = %params.state))]
    pub async fn put_operational_intent(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: &Ovn,
        params: PutOperationalIntentParams,
    ) -> Result<ChangeResult<OperationalIntent>, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let (id, ovn) = (id.clone(), ovn.clone());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                operational_intent::put(repo, &config, &ctx, &id, &ovn, &params)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_operational_intent(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: Option<&Ovn>,
    ) -> Result<ChangeResult<OperationalIntent>, ScdError> {
        let ctx = self.context(manager);
        let (id, ovn) = (id.clone(), ovn.cloned());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                operational_intent::delete(repo, &ctx, &id, ovn.as_ref())
            })
            .await
    }

    pub async fn get_operational_intent(
        &self,
        manager: &Manager,
        id: &EntityId,
    ) -> Result<OperationalIntent, ScdError> {
        let ctx = self.context(manager);
        let id = id.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| operational_intent::get(repo, &ctx, &id))
            .await
    }

    pub async fn query_operational_intents(
        &self,
        manager: &Manager,
        area: &Volume4D,
    ) -> Result<Vec<OperationalIntent>, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let area = area.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| {
                operational_intent::query(repo, &config, &ctx, &area)
            })
            .await
    }

    // -- Constraints ----------------------------------------------------

    #[instrument(skip(self, params))]
    pub async fn put_constraint(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: &Ovn,
        params: PutConstraintParams,
    ) -> Result<ChangeResult<Constraint>, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let (id, ovn) = (id.clone(), ovn.clone());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                constraint::put(repo, &config, &ctx, &id, &ovn, &params)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_constraint(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: Option<&Ovn>,
    ) -> Result<ChangeResult<Constraint>, ScdError> {
        let ctx = self.context(manager);
        let (id, ovn) = (id.clone(), ovn.cloned());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                constraint::delete(repo, &ctx, &id, ovn.as_ref())
            })
            .await
    }

    pub async fn get_constraint(
        &self,
        manager: &Manager,
        id: &EntityId,
    ) -> Result<Constraint, ScdError> {
        let ctx = self.context(manager);
        let id = id.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| constraint::get(repo, &ctx, &id))
            .await
    }

    pub async fn query_constraints(
        &self,
        manager: &Manager,
        area: &Volume4D,
    ) -> Result<Vec<Constraint>, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let area = area.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| {
                constraint::query(repo, &config, &ctx, &area)
            })
            .await
    }

    // -- Subscriptions --------------------------------------------------

    #[instrument(skip(self, params))]
    pub async fn put_subscription(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: &Ovn,
        params: PutSubscriptionParams,
    ) -> Result<SubscriptionResult, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let (id, ovn) = (id.clone(), ovn.clone());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                subscription::put(repo, &config, &ctx, &id, &ovn, &params)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_subscription(
        &self,
        manager: &Manager,
        id: &EntityId,
        ovn: Option<&Ovn>,
    ) -> Result<Subscription, ScdError> {
        let ctx = self.context(manager);
        let (id, ovn) = (id.clone(), ovn.cloned());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                subscription::delete(repo, &ctx, &id, ovn.as_ref())
            })
            .await
    }

    pub async fn get_subscription(
        &self,
        manager: &Manager,
        id: &EntityId,
    ) -> Result<Subscription, ScdError> {
        let ctx = self.context(manager);
        let id = id.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| subscription::get(repo, &ctx, &id))
            .await
    }

    pub async fn query_subscriptions(
        &self,
        manager: &Manager,
        area: &Volume4D,
    ) -> Result<Vec<Subscription>, ScdError> {
        let ctx = self.context(manager);
        let config = Arc::clone(&self.config);
        let area = area.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| {
                subscription::query(repo, &config, &ctx, &area)
            })
            .await
    }

    // -- Availability ---------------------------------------------------

    pub async fn get_uss_availability(
        &self,
        manager: &Manager,
    ) -> Result<UssAvailabilityStatus, ScdError> {
        let manager = manager.clone();
        self.store
            .transact(move |repo: &mut dyn Repository| availability::get(repo, &manager))
            .await
    }

    /// Set `target`'s availability on behalf of `caller`, fenced on the
    /// version last read (empty when no record exists).
    #[instrument(skip(self))]
    pub async fn set_uss_availability(
        &self,
        caller: &Manager,
        target: &Manager,
        availability: UssAvailability,
        old_version: &Ovn,
    ) -> Result<UssAvailabilityStatus, ScdError> {
        let ctx = self.context(caller);
        let (target, old_version) = (target.clone(), old_version.clone());
        self.store
            .transact(move |repo: &mut dyn Repository| {
                availability::set(repo, &ctx, &target, availability, &old_version)
            })
            .await
    }

    // -- Eviction -------------------------------------------------------

    /// Find (and with `delete`, remove) everything that expired at or
    /// before `threshold`.
    #[instrument(skip(self))]
    pub async fn evict(
        &self,
        threshold: DateTime<Utc>,
        delete: bool,
    ) -> Result<EvictionReport, ScdError> {
        self.store
            .transact(move |repo: &mut dyn Repository| evict::evict(repo, threshold, delete))
            .await
    }

    /// [`Self::evict`] with the threshold set `ttl` before now.
    pub async fn evict_older_than(
        &self,
        ttl: Duration,
        delete: bool,
    ) -> Result<EvictionReport, ScdError> {
        let now = self.clock.now();
        let threshold = now
            .checked_sub_signed(to_chrono(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.evict(threshold, delete).await
    }
}
