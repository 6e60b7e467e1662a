// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tally_folds_retry_into_pending() {
    let counts = QueueCounts::tally([
        JobState::Pending,
        JobState::Retry,
        JobState::Active,
        JobState::Failed,
        JobState::Failed,
        JobState::Completed,
    ]);
    assert_eq!(counts, QueueCounts::new(2, 1, 1, 2));
    assert_eq!(counts.total, 6);
    assert_eq!(counts.get(JobState::Retry), 2);
}

#[test]
fn descriptor_defaults_display_name_to_name() {
    let desc = QueueDescriptor::new("process-image");
    assert_eq!(desc.display_name, "process-image");
    let desc = desc.titled("Image processing", "Thumbnails and variants");
    assert_eq!(desc.display_name, "Image processing");
}

#[test]
fn descriptor_deserializes_with_only_name() {
    let desc: QueueDescriptor = serde_json::from_str(r#"{"name":"email"}"#).unwrap();
    assert_eq!(desc.name, "email");
    assert!(desc.description.is_empty());
    let snap = QueueSnapshot::from_descriptor(&desc, QueueCounts::default());
    assert_eq!(snap.display_name, "email");
}
