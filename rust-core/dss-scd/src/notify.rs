// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Subscriber fan-out.
//!
//! After a mutation commits, every subscription overlapping the changed
//! area gets its notification index bumped. The caller delivers the
//! notifications itself, grouped by subscriber base URL.

use std::collections::BTreeMap;

use dss_geo::IndexedVolume4D;
use dss_models::EntityId;
use dss_storage::Repository;
use serde::Serialize;
use tracing::debug;

use crate::ScdError;

/// Which subscription flag a change is filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyFor {
    OperationalIntents,
    Constraints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionState {
    pub subscription_id: EntityId,
    pub notification_index: u64,
}

/// All subscriptions of one base URL touched by a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberToNotify {
    pub uss_base_url: String,
    pub subscriptions: Vec<SubscriptionState>,
}

/// Bump the index of every subscription over `area` that asked for `kind`
/// and group the new indices by base URL (sorted by URL).
pub(crate) fn notify_subscribers(
    repo: &mut dyn Repository,
    area: &IndexedVolume4D,
    kind: NotifyFor,
) -> Result<Vec<SubscriberToNotify>, ScdError> {
    let subscriptions: Vec<_> = repo
        .search_subscriptions(area)?
        .into_iter()
        .filter(|sub| match kind {
            NotifyFor::OperationalIntents => sub.notify_for_operational_intents,
            NotifyFor::Constraints => sub.notify_for_constraints,
        })
        .collect();

    let ids: Vec<EntityId> = subscriptions.iter().map(|sub| sub.id.clone()).collect();
    let indices = repo.increment_notification_indices(&ids)?;

    let mut grouped: BTreeMap<String, Vec<SubscriptionState>> = BTreeMap::new();
    for (sub, index) in subscriptions.into_iter().zip(indices) {
        grouped
            .entry(sub.uss_base_url)
            .or_default()
            .push(SubscriptionState {
                subscription_id: sub.id,
                notification_index: index,
            });
    }
    debug!(?kind, subscriptions = ids.len(), subscribers = grouped.len(), "notified subscribers");

    Ok(grouped
        .into_iter()
        .map(|(uss_base_url, subscriptions)| SubscriberToNotify {
            uss_base_url,
            subscriptions,
        })
        .collect())
}
