//! Duplicate detection and retention decisions.
//!
//! Records are grouped by their precomputed checksum. Within each group the
//! retention policy decides which records would be deleted. Nothing here
//! deletes anything: callers pick a selection and issue the delete
//! themselves, after [`validate_delete_selection`] accepts it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{FileId, FileRecord, RetentionPolicy};

/// Why a record would or would not be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionReason {
    Protected,
    TooRecent,
    NewestKept,
    WillBeDeleted,
}

impl RetentionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protected => "protected",
            Self::TooRecent => "too recent",
            Self::NewestKept => "newest duplicate, kept",
            Self::WillBeDeleted => "will be deleted",
        }
    }
}

impl fmt::Display for RetentionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grouped record together with its retention decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub record: FileRecord,
    pub will_be_deleted: bool,
    pub reason: RetentionReason,
}

/// Records sharing one checksum, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub checksum: String,
    pub records: Vec<DuplicateCandidate>,
}

impl DuplicateGroup {
    /// Number of records in the group that would be deleted
    #[must_use]
    pub fn deletable_count(&self) -> usize {
        self.records
            .iter()
            .filter(|candidate| candidate.will_be_deleted)
            .count()
    }
}

/// Outcome of a duplicate scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateScan {
    /// The retention policy is switched off; no analysis ran
    Disabled,
    /// Analysis ran; an empty list means no duplicates were found
    Groups(Vec<DuplicateGroup>),
}

impl DuplicateScan {
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        match self {
            Self::Disabled => &[],
            Self::Groups(groups) => groups,
        }
    }
}

/// Group records by checksum and decide, per record, whether it would be deleted.
///
/// Groups come back ordered by checksum. Within a group records are sorted
/// newest first; equal `created_at` values are ordered by ascending id.
#[must_use]
pub fn resolve(
    records: &[FileRecord],
    policy: &RetentionPolicy,
    now_ms: i64,
) -> Vec<DuplicateGroup> {
    let mut by_checksum: BTreeMap<&str, Vec<&FileRecord>> = BTreeMap::new();
    for record in records {
        if let Some(checksum) = record.checksum.as_deref() {
            by_checksum.entry(checksum).or_default().push(record);
        }
    }

    let cutoff = policy.cutoff(now_ms);

    by_checksum
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(checksum, mut members)| {
            members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

            let records = members
                .into_iter()
                .enumerate()
                .map(|(index, record)| {
                    let reason = decide(record, index, policy, cutoff);
                    DuplicateCandidate {
                        record: record.clone(),
                        will_be_deleted: reason == RetentionReason::WillBeDeleted,
                        reason,
                    }
                })
                .collect();

            DuplicateGroup {
                checksum: checksum.to_string(),
                records,
            }
        })
        .collect()
}

/// Run [`resolve`] unless the policy is disabled.
#[must_use]
pub fn scan(records: &[FileRecord], policy: &RetentionPolicy, now_ms: i64) -> DuplicateScan {
    if !policy.enabled {
        tracing::debug!("Duplicate retention disabled; skipping scan");
        return DuplicateScan::Disabled;
    }

    let groups = resolve(records, policy, now_ms);
    tracing::debug!(
        "Duplicate scan found {} groups across {} records",
        groups.len(),
        records.len()
    );
    DuplicateScan::Groups(groups)
}

fn decide(
    record: &FileRecord,
    index: usize,
    policy: &RetentionPolicy,
    cutoff: i64,
) -> RetentionReason {
    if record.is_protected {
        RetentionReason::Protected
    } else if record.created_at >= cutoff {
        RetentionReason::TooRecent
    } else if policy.keep_latest && index == 0 {
        RetentionReason::NewestKept
    } else {
        RetentionReason::WillBeDeleted
    }
}

/// Ids the policy marks for deletion, in group order
#[must_use]
pub fn deletable_ids(groups: &[DuplicateGroup]) -> Vec<FileId> {
    groups
        .iter()
        .flat_map(|group| group.records.iter())
        .filter(|candidate| candidate.will_be_deleted)
        .map(|candidate| candidate.record.id)
        .collect()
}

/// Reject selections that cannot be deleted as one batch.
///
/// Mixed protected/unprotected selections fail as a whole rather than
/// deleting only the unprotected part.
pub fn validate_delete_selection(selection: &[FileRecord]) -> Result<()> {
    if selection.is_empty() {
        return Err(Error::InvalidInput("no files selected".to_string()));
    }

    let protected = selection.iter().filter(|record| record.is_protected).count();
    let unprotected = selection.len() - protected;

    if protected > 0 && unprotected > 0 {
        return Err(Error::MixedProtection {
            protected,
            unprotected,
        });
    }
    if protected > 0 {
        return Err(Error::InvalidInput(format!(
            "{protected} selected files are protected; unprotect them before deleting"
        )));
    }

    Ok(())
}

/// Aggregate numbers for a set of duplicate groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateSummary {
    pub groups: usize,
    pub duplicate_records: usize,
    pub deletable_records: usize,
    pub reclaimable_bytes: i64,
}

impl DuplicateSummary {
    #[must_use]
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        groups.iter().fold(Self::default(), |mut summary, group| {
            summary.groups += 1;
            summary.duplicate_records += group.records.len();
            for candidate in group.records.iter().filter(|c| c.will_be_deleted) {
                summary.deletable_records += 1;
                summary.reclaimable_bytes = summary
                    .reclaimable_bytes
                    .saturating_add(candidate.record.size_bytes.max(0));
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TranscriptionStatus;
    use crate::util::DAY_MS;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;

    fn record(id: &str, checksum: Option<&str>, created_at: i64, is_protected: bool) -> FileRecord {
        FileRecord {
            id: id.parse().unwrap(),
            title: format!("file {id}"),
            checksum: checksum.map(str::to_string),
            created_at,
            is_protected,
            status: TranscriptionStatus::Completed,
            size_bytes: 1_000,
        }
    }

    fn id(n: u8) -> String {
        format!("00000000-0000-7000-8000-0000000000{n:02}")
    }

    fn policy(keep_latest: bool, days: u32) -> RetentionPolicy {
        RetentionPolicy {
            enabled: true,
            keep_latest,
            delete_older_than_days: days,
        }
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(resolve(&[], &policy(true, 30), NOW).is_empty());
    }

    #[test]
    fn distinct_checksums_yield_no_groups() {
        let records = vec![
            record(&id(1), Some("A"), NOW, false),
            record(&id(2), Some("B"), NOW, false),
            record(&id(3), None, NOW, false),
        ];
        assert!(resolve(&records, &policy(true, 30), NOW).is_empty());
    }

    #[test]
    fn records_without_checksum_are_ignored() {
        let records = vec![
            record(&id(1), None, NOW, false),
            record(&id(2), None, NOW, false),
            record(&id(3), Some("A"), NOW, false),
            record(&id(4), Some("A"), NOW - DAY_MS, false),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].records.len(), 2);
    }

    #[test]
    fn newest_is_kept_and_old_copy_is_deleted() {
        let records = vec![
            record(&id(1), Some("A"), NOW, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, false),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);

        let decisions = groups[0]
            .records
            .iter()
            .map(|c| (c.record.id.to_string(), c.will_be_deleted, c.reason))
            .collect::<Vec<_>>();
        // The newest copy is also within 30 days, so "too recent" wins over "newest kept".
        assert_eq!(
            decisions,
            vec![
                (id(1), false, RetentionReason::TooRecent),
                (id(2), true, RetentionReason::WillBeDeleted),
            ]
        );
    }

    #[test]
    fn protected_old_copy_is_never_deleted() {
        let records = vec![
            record(&id(1), Some("A"), NOW, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, true),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);
        let old = &groups[0].records[1];
        assert!(!old.will_be_deleted);
        assert_eq!(old.reason, RetentionReason::Protected);
        assert_eq!(old.reason.to_string(), "protected");
    }

    #[test]
    fn keep_latest_keeps_only_the_newest_when_all_are_old() {
        let records = vec![
            record(&id(1), Some("A"), NOW - 50 * DAY_MS, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, false),
            record(&id(3), Some("A"), NOW - 60 * DAY_MS, false),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);
        let group = &groups[0];

        let kept = group
            .records
            .iter()
            .filter(|c| c.reason == RetentionReason::NewestKept)
            .collect::<Vec<_>>();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].record.id.to_string(), id(2));
        assert_eq!(group.deletable_count(), 2);
    }

    #[test]
    fn without_keep_latest_every_old_copy_is_deleted() {
        let records = vec![
            record(&id(1), Some("A"), NOW - 50 * DAY_MS, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, false),
        ];
        let groups = resolve(&records, &policy(false, 30), NOW);
        assert_eq!(groups[0].deletable_count(), 2);
    }

    #[test]
    fn zero_days_makes_everything_older_than_now_eligible() {
        let records = vec![
            record(&id(1), Some("A"), NOW, false),
            record(&id(2), Some("A"), NOW - 1, false),
            record(&id(3), Some("A"), NOW - 2, false),
        ];
        let groups = resolve(&records, &policy(false, 0), NOW);
        let reasons = groups[0].records.iter().map(|c| c.reason).collect::<Vec<_>>();
        assert_eq!(
            reasons,
            vec![
                RetentionReason::TooRecent,
                RetentionReason::WillBeDeleted,
                RetentionReason::WillBeDeleted,
            ]
        );
    }

    #[test]
    fn equal_timestamps_are_ordered_by_id() {
        let created = NOW - 90 * DAY_MS;
        let records = vec![
            record(&id(9), Some("A"), created, false),
            record(&id(3), Some("A"), created, false),
            record(&id(5), Some("A"), created, false),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);
        let order = groups[0]
            .records
            .iter()
            .map(|c| c.record.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(order, vec![id(3), id(5), id(9)]);
        assert_eq!(groups[0].records[0].reason, RetentionReason::NewestKept);
    }

    #[test]
    fn groups_are_homogeneous_and_at_least_two_long() {
        let records = (0..20u8)
            .map(|n| {
                let checksum = ["A", "B", "C", "D", "E", "F", "G"][usize::from(n % 7)];
                let is_protected = n % 5 == 0;
                record(&id(n), Some(checksum), NOW - i64::from(n) * 7 * DAY_MS, is_protected)
            })
            .collect::<Vec<_>>();

        let groups = resolve(&records, &policy(true, 30), NOW);
        assert!(!groups.is_empty());
        for group in &groups {
            assert!(group.records.len() >= 2);
            assert!(group
                .records
                .iter()
                .all(|c| c.record.checksum.as_deref() == Some(group.checksum.as_str())));
            assert!(group
                .records
                .iter()
                .all(|c| !(c.record.is_protected && c.will_be_deleted)));

            let newest_kept = group
                .records
                .iter()
                .filter(|c| c.reason == RetentionReason::NewestKept)
                .collect::<Vec<_>>();
            assert!(newest_kept.len() <= 1);
            if let Some(kept) = newest_kept.first() {
                let max_created = group.records.iter().map(|c| c.record.created_at).max();
                assert_eq!(Some(kept.record.created_at), max_created);
            }
        }
    }

    #[test]
    fn resolve_is_idempotent() {
        let records = vec![
            record(&id(1), Some("A"), NOW - 45 * DAY_MS, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, false),
            record(&id(3), Some("B"), NOW - 40 * DAY_MS, true),
            record(&id(4), Some("B"), NOW - 41 * DAY_MS, false),
        ];
        let policy = policy(true, 30);
        assert_eq!(resolve(&records, &policy, NOW), resolve(&records, &policy, NOW));
    }

    #[test]
    fn disabled_policy_is_distinct_from_no_duplicates() {
        let records = vec![record(&id(1), Some("A"), NOW, false)];
        let disabled = RetentionPolicy {
            enabled: false,
            ..RetentionPolicy::default()
        };

        assert_eq!(scan(&records, &disabled, NOW), DuplicateScan::Disabled);
        assert_eq!(
            scan(&records, &RetentionPolicy::default(), NOW),
            DuplicateScan::Groups(Vec::new())
        );
    }

    #[test]
    fn summary_counts_reclaimable_bytes() {
        let records = vec![
            record(&id(1), Some("A"), NOW - 50 * DAY_MS, false),
            record(&id(2), Some("A"), NOW - 40 * DAY_MS, false),
            record(&id(3), Some("A"), NOW - 60 * DAY_MS, false),
        ];
        let groups = resolve(&records, &policy(true, 30), NOW);
        let summary = DuplicateSummary::from_groups(&groups);

        assert_eq!(
            summary,
            DuplicateSummary {
                groups: 1,
                duplicate_records: 3,
                deletable_records: 2,
                reclaimable_bytes: 2_000,
            }
        );
        assert_eq!(deletable_ids(&groups).len(), 2);
    }

    #[test]
    fn mixed_protection_selection_is_rejected() {
        let selection = vec![
            record(&id(1), Some("A"), NOW, false),
            record(&id(2), Some("A"), NOW, true),
        ];
        let error = validate_delete_selection(&selection).unwrap_err();
        assert!(matches!(
            error,
            Error::MixedProtection {
                protected: 1,
                unprotected: 1
            }
        ));
    }

    #[test]
    fn unprotected_selection_is_accepted() {
        let selection = vec![record(&id(1), None, NOW, false)];
        assert!(validate_delete_selection(&selection).is_ok());
        assert!(validate_delete_selection(&[]).is_err());
    }
}
