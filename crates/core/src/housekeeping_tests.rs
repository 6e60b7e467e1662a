// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::str::FromStr;

#[test]
fn default_config_enables_every_type() {
    let config = HousekeepingConfig::default();
    assert!(config.dry_run);
    assert_eq!(config.detection_types.len(), 5);
}

#[test]
fn config_deserializes_partial_payload() {
    let config: HousekeepingConfig = serde_json::from_str(
        r#"{"dry_run": false, "detection_types": ["physical_orphans"], "max_files": 5}"#,
    )
    .unwrap();
    assert!(!config.dry_run);
    assert_eq!(config.max_files, 5);
    assert_eq!(config.grace_period_hours, 24);
    assert_eq!(config.detection_types.iter().collect::<Vec<_>>(), vec![&FindingType::PhysicalOrphans]);
}

#[test]
fn setters_and_only_compose() {
    let config = HousekeepingConfig::default()
        .dry_run(false)
        .grace_period_hours(48)
        .only([FindingType::AbandonedUploads]);
    assert!(!config.dry_run);
    assert_eq!(config.grace_period_hours, 48);
    assert!(config.detection_types.contains(&FindingType::AbandonedUploads));
    assert_eq!(config.detection_types.len(), 1);
}

#[test]
fn finding_type_round_trips_through_str() {
    for t in FindingType::ALL {
        assert_eq!(FindingType::from_str(&t.to_string()).unwrap(), *t);
    }
}

#[test]
fn reference_time_prefers_status_change() {
    let mut candidate = FileCandidate::builder().created_at_ms(100).build();
    assert_eq!(candidate.reference_time_ms(), 100);
    candidate.record = Some(CatalogRecord {
        id: "m1".into(),
        status: RecordStatus::PendingDeletion,
        status_at_ms: Some(500),
    });
    assert_eq!(candidate.reference_time_ms(), 500);
    assert_eq!(candidate.record_status(), Some(RecordStatus::PendingDeletion));
}
