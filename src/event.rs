// System
use std::fmt;

// Third Party
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;

// Local
use crate::error::{Result, StreamerError};

/// The kind of change a watch reported for an Event object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvolvedObject {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
}

/// One validated update about a Kubernetes Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNotification {
    pub change: ChangeKind,
    /// `Normal` or `Warning`.
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub count: Option<i32>,
    pub involved_object: InvolvedObject,
    pub uid: String,
    pub name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl EventNotification {
    /// Validate a raw Event received from a watch.
    /// Only the identity fields and the reason are required, everything else may be absent.
    pub fn from_event(change: ChangeKind, event: Event) -> Result<Self> {
        let uid = event
            .metadata
            .uid
            .ok_or(StreamerError::MalformedNotification {
                field: "metadata.uid",
            })?;
        let name = event
            .metadata
            .name
            .ok_or(StreamerError::MalformedNotification {
                field: "metadata.name",
            })?;
        let reason = event
            .reason
            .ok_or(StreamerError::MalformedNotification { field: "reason" })?;

        Ok(EventNotification {
            change,
            event_type: event.type_.unwrap_or_default(),
            reason,
            message: event.message.unwrap_or_default(),
            first_seen: event.first_timestamp.map(|time| time.0),
            last_seen: event.last_timestamp.map(|time| time.0),
            count: event.count,
            involved_object: InvolvedObject {
                kind: event.involved_object.kind,
                name: event.involved_object.name,
                namespace: event.involved_object.namespace,
            },
            uid,
            name,
            creation_timestamp: event.metadata.creation_timestamp.map(|time| time.0),
        })
    }

    /// The reason upper-cased, which is how it is compared against the skip list.
    pub fn normalized_reason(&self) -> String {
        self.reason.to_uppercase()
    }

    pub fn is_warning(&self) -> bool {
        self.event_type == "Warning"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    // Third Party
    use chrono::TimeZone;
    use k8s_openapi::api::core::v1::ObjectReference;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    // Local
    use super::*;
    use crate::error::ErrorKind;

    /// A notification with every optional field filled in.
    pub(crate) fn notification(event_type: &str, reason: &str, uid: &str) -> EventNotification {
        EventNotification {
            change: ChangeKind::Added,
            event_type: event_type.to_string(),
            reason: reason.to_string(),
            message: "Pod scheduled".to_string(),
            first_seen: Some(Utc.with_ymd_and_hms(2023, 9, 4, 13, 5, 9).unwrap()),
            last_seen: Some(Utc.with_ymd_and_hms(2023, 9, 4, 14, 0, 0).unwrap()),
            count: Some(3),
            involved_object: InvolvedObject {
                kind: Some("Pod".to_string()),
                name: Some("web-0".to_string()),
                namespace: Some("default".to_string()),
            },
            uid: uid.to_string(),
            name: "web-0.178".to_string(),
            creation_timestamp: Some(Utc.with_ymd_and_hms(2023, 9, 4, 13, 5, 9).unwrap()),
        }
    }

    fn raw_event() -> Event {
        Event {
            metadata: ObjectMeta {
                name: Some("web-0.178".to_string()),
                uid: Some("u1".to_string()),
                creation_timestamp: Some(Time(Utc.with_ymd_and_hms(2023, 9, 4, 13, 5, 9).unwrap())),
                ..Default::default()
            },
            involved_object: ObjectReference {
                kind: Some("Pod".to_string()),
                name: Some("web-0".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            type_: Some("Normal".to_string()),
            reason: Some("Scheduled".to_string()),
            message: Some("Pod scheduled".to_string()),
            count: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_event_keeps_optional_fields_optional() {
        let notification =
            EventNotification::from_event(ChangeKind::Modified, raw_event()).unwrap();
        assert_eq!(notification.change, ChangeKind::Modified);
        assert_eq!(notification.uid, "u1");
        assert_eq!(notification.event_type, "Normal");
        assert_eq!(notification.involved_object.kind.as_deref(), Some("Pod"));
        assert!(notification.first_seen.is_none());
        assert!(notification.last_seen.is_none());
        assert!(notification.creation_timestamp.is_some());
        assert!(!notification.is_warning());
    }

    #[test]
    fn test_from_event_rejects_missing_identity() {
        let mut event = raw_event();
        event.metadata.uid = None;
        let error = EventNotification::from_event(ChangeKind::Added, event).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedNotification);
        assert!(error.to_string().contains("metadata.uid"));

        let mut event = raw_event();
        event.reason = None;
        let error = EventNotification::from_event(ChangeKind::Added, event).unwrap_err();
        assert!(error.to_string().contains("reason"));
    }

    #[test]
    fn test_reason_is_normalized_to_upper_case() {
        let notification = notification("Normal", "SuccessfulDelete", "u1");
        assert_eq!(notification.normalized_reason(), "SUCCESSFULDELETE");
    }
}
