// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Removal of expired entities.
//!
//! An entity is expired when it ends (or, lacking an end, was last updated)
//! at or before the threshold. Without `delete` the pass only reports what
//! it would remove.

use chrono::{DateTime, Utc};
use dss_storage::Repository;
use tracing::{debug, warn};

use crate::operational_intent::remove_if_orphaned;
use crate::params::EvictionReport;
use crate::ScdError;

pub(crate) fn evict(
    repo: &mut dyn Repository,
    threshold: DateTime<Utc>,
    delete: bool,
) -> Result<EvictionReport, ScdError> {
    let expired_ois = repo.list_expired_operational_intents(threshold)?;
    let expired_subs = repo.list_expired_subscriptions(threshold)?;
    let mut report = EvictionReport {
        operational_intents: expired_ois.iter().map(|oi| oi.id.clone()).collect(),
        subscriptions: expired_subs.iter().map(|sub| sub.id.clone()).collect(),
        orphaned_subscriptions: Vec::new(),
        deleted: delete,
    };
    if !delete {
        debug!(
            %threshold,
            operational_intents = report.operational_intents.len(),
            subscriptions = report.subscriptions.len(),
            "found expired entities"
        );
        return Ok(report);
    }

    warn!(
        %threshold,
        operational_intents = report.operational_intents.len(),
        subscriptions = report.subscriptions.len(),
        "deleting expired entities"
    );
    for oi in &expired_ois {
        repo.delete_operational_intent(&oi.id)?;
    }
    for oi in &expired_ois {
        if report.subscriptions.contains(&oi.subscription_id)
            || report.orphaned_subscriptions.contains(&oi.subscription_id)
        {
            continue;
        }
        if remove_if_orphaned(repo, &oi.subscription_id)? {
            report.orphaned_subscriptions.push(oi.subscription_id.clone());
        }
    }

    let mut deleted = Vec::with_capacity(expired_subs.len());
    for sub in expired_subs {
        if !repo.get_dependent_operational_intents(&sub.id)?.is_empty() {
            warn!(subscription = %sub.id, "kept expired subscription that still backs operational intents");
            continue;
        }
        repo.delete_subscription(&sub.id)?;
        deleted.push(sub.id);
    }
    report.subscriptions = deleted;
    Ok(report)
}
