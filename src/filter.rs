// System
use std::collections::HashSet;

// Third Party
use tracing::info;

// Local
use crate::event::EventNotification;

/// Reason emitted by controllers after a successful delete.
pub const SUCCESSFUL_DELETE_REASON: &str = "SUCCESSFULDELETE";

/// Event reasons that are never notified, upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipReasons {
    reasons: HashSet<String>,
}

impl SkipReasons {
    /// Parse a whitespace separated list of reasons. Case is ignored.
    pub fn parse(list: &str, skip_delete_events: bool) -> Self {
        let mut reasons: HashSet<String> = list.split_whitespace().map(str::to_uppercase).collect();
        if skip_delete_events {
            reasons.insert(SUCCESSFUL_DELETE_REASON.to_string());
        }
        Self { reasons }
    }

    pub fn contains(&self, reason: &str) -> bool {
        self.reasons.contains(&reason.to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Sorted, for stable log output.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self.reasons.iter().cloned().collect();
        reasons.sort();
        reasons
    }
}

/// Ids of the events already notified during the current watch session.
#[derive(Debug, Default)]
pub struct DedupSet {
    uids: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    /// Record a delivered event. Call only after the delivery succeeded.
    pub fn insert(&mut self, uid: &str) {
        self.uids.insert(uid.to_string());
    }

    pub fn clear(&mut self) {
        self.uids.clear();
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

/// Decide whether a notification should go through the pipeline.
pub fn should_notify(
    notification: &EventNotification,
    skip_reasons: &SkipReasons,
    dedup: &DedupSet,
) -> bool {
    let reason = notification.normalized_reason();
    if skip_reasons.contains(&reason) {
        info!(
            "Event reason is {} and it is in the skip list. So skip it",
            reason
        );
        return false;
    }
    if dedup.contains(&notification.uid) {
        info!(
            "Event id is {} and it is in the cached events list. So skip it",
            notification.uid
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::notification;

    #[test]
    fn test_parse_upper_cases_and_splits_on_any_whitespace() {
        let skip = SkipReasons::parse("BackOff\n  pulled\tscheduled ", false);
        assert_eq!(skip.to_sorted_vec(), vec!["BACKOFF", "PULLED", "SCHEDULED"]);
        assert!(skip.contains("backoff"));
        assert!(!skip.contains(SUCCESSFUL_DELETE_REASON));
    }

    #[test]
    fn test_delete_suppression_adds_synthetic_reason() {
        let skip = SkipReasons::parse("", true);
        assert!(skip.contains("SuccessfulDelete"));
        assert_eq!(skip.to_sorted_vec(), vec![SUCCESSFUL_DELETE_REASON]);
        assert!(SkipReasons::parse("", false).is_empty());
    }

    #[test]
    fn test_skipped_reasons_are_rejected_in_any_case() {
        let skip = SkipReasons::parse("scheduled", false);
        let dedup = DedupSet::new();
        for reason in ["Scheduled", "SCHEDULED", "scheduled", "sChEdUlEd"] {
            assert!(!should_notify(
                &notification("Normal", reason, "u1"),
                &skip,
                &dedup
            ));
        }
        assert!(should_notify(
            &notification("Normal", "Pulled", "u1"),
            &skip,
            &dedup
        ));
    }

    #[test]
    fn test_already_notified_ids_are_rejected() {
        let skip = SkipReasons::default();
        let mut dedup = DedupSet::new();
        let event = notification("Normal", "Scheduled", "u1");
        assert!(should_notify(&event, &skip, &dedup));

        dedup.insert(&event.uid);
        assert!(!should_notify(&event, &skip, &dedup));
        assert!(should_notify(
            &notification("Normal", "Scheduled", "u2"),
            &skip,
            &dedup
        ));

        dedup.clear();
        assert!(dedup.is_empty());
        assert!(should_notify(&event, &skip, &dedup));
    }
}
