// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The protocol against the persistent store.

#![cfg(feature = "redb-backend")]

mod common;

use common::*;
use dss_models::{EntityId, Ovn, UssAvailability};
use dss_scd::{ErrorKind, ScdConfig};
use dss_storage::RedbStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_protocol_round_trip_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dss.redb");
    let (uss1, uss2, watcher) = (manager("uss1"), manager("uss2"), manager("watcher"));
    let a_id = EntityId::new_v4();
    let sub_id = EntityId::new_v4();

    let a = {
        let (service, _clock) = service_with(RedbStore::open(&path).unwrap(), ScdConfig::default());
        service
            .put_subscription(&watcher, &sub_id, &Ovn::empty(), subscription_params(&watcher, here(), true, false))
            .await
            .unwrap();
        let put = service
            .put_operational_intent(&uss1, &a_id, &Ovn::empty(), accepted(&uss1, here()))
            .await
            .unwrap();
        assert!(put
            .subscribers
            .iter()
            .any(|s| s.uss_base_url == base_url(&watcher)));

        let err = service
            .put_operational_intent(&uss2, &EntityId::new_v4(), &Ovn::empty(), accepted(&uss2, here()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingOvns);

        service
            .set_uss_availability(&uss1, &uss1, UssAvailability::Normal, &Ovn::empty())
            .await
            .unwrap();
        put.entity
    };

    let (service, _clock) = service_with(RedbStore::open(&path).unwrap(), ScdConfig::default());
    let own = service.get_operational_intent(&uss1, &a_id).await.unwrap();
    assert_eq!(own.ovn, a.ovn);
    assert_eq!(own.uss_availability, UssAvailability::Normal);
    assert_eq!(service.get_subscription(&watcher, &sub_id).await.unwrap().notification_index, 1);

    service.delete_operational_intent(&uss1, &a_id, Some(&a.ovn)).await.unwrap();
    let err = service.get_subscription(&uss1, &a.subscription_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service.query_operational_intents(&uss2, &here()).await.unwrap().is_empty());
}
