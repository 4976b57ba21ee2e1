// System
use std::fmt;

// Third Party
use async_trait::async_trait;
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};
use k8s_openapi::api::core::v1::Event;
use kube::{
    api::{Api, WatchEvent, WatchParams},
    Client,
};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info};

// Local
use crate::{
    error::{ErrorKind, Result, StreamerError},
    event::{ChangeKind, EventNotification},
};

/// The API server rejects watch timeouts of 295 seconds and above, so a session is made of
/// shorter segments.
const MAX_SEGMENT_SECONDS: u64 = 290;

/// Resource version "0" makes the server replay the events it currently holds.
const REPLAY_RESOURCE_VERSION: &str = "0";

/// Which namespaces to watch events in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    All,
    Namespace(String),
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceScope::All => f.write_str("all namespaces"),
            NamespaceScope::Namespace(namespace) => write!(f, "namespace {}", namespace),
        }
    }
}

/// A lazy, in-order sequence of notifications. It ends once the session duration has elapsed.
/// A malformed event is yielded as an error in its place, a connection or protocol error as the
/// last item.
pub type NotificationStream = BoxStream<'static, Result<EventNotification>>;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a watch session that lasts at most `max_duration`. Never reconnects on error.
    async fn open_session(
        &self,
        scope: &NamespaceScope,
        max_duration: Duration,
    ) -> Result<NotificationStream>;
}

/// Watches `Event` objects through the Kubernetes API.
pub struct KubeEventSource {
    client: Client,
}

impl KubeEventSource {
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    fn api(&self, scope: &NamespaceScope) -> Api<Event> {
        match scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Namespace(namespace) => Api::namespaced(self.client.clone(), namespace),
        }
    }
}

#[async_trait]
impl EventSource for KubeEventSource {
    async fn open_session(
        &self,
        scope: &NamespaceScope,
        max_duration: Duration,
    ) -> Result<NotificationStream> {
        let mut session = WatchSession {
            api: self.api(scope),
            resource_version: REPLAY_RESOURCE_VERSION.to_string(),
            deadline: Instant::now() + max_duration,
            segment: None,
            finished: false,
        };
        // Open the first segment eagerly so that connection failures surface here
        session.open_segment().await?;
        info!(
            "Watching events in {} for {} seconds...",
            scope,
            max_duration.as_secs()
        );
        Ok(session.into_stream())
    }
}

/// One bounded session, chaining watch segments from the last seen resource version.
struct WatchSession {
    api: Api<Event>,
    resource_version: String,
    deadline: Instant,
    segment: Option<BoxStream<'static, kube::Result<WatchEvent<Event>>>>,
    finished: bool,
}

impl WatchSession {
    async fn open_segment(&mut self) -> Result<()> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let timeout = remaining.as_secs().clamp(1, MAX_SEGMENT_SECONDS) as u32;
        debug!(
            "Opening watch segment from resource version {} for {} seconds",
            self.resource_version, timeout
        );
        let stream = self
            .api
            .watch(&WatchParams::default().timeout(timeout), &self.resource_version)
            .await
            .map_err(StreamerError::from_watch_error)?;
        self.segment = Some(stream.boxed());
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<Result<EventNotification>> {
        loop {
            if self.finished || Instant::now() >= self.deadline {
                return None;
            }
            if self.segment.is_none() {
                if let Err(error) = self.open_segment().await {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
            let Some(segment) = self.segment.as_mut() else {
                continue;
            };
            let next = match time::timeout_at(self.deadline, segment.next()).await {
                Ok(next) => next,
                // Session duration elapsed while waiting
                Err(_) => return None,
            };
            match next {
                None => {
                    debug!("Watch segment ended at resource version {}", self.resource_version);
                    self.segment = None;
                }
                Some(Err(error)) => {
                    let error = StreamerError::from_watch_error(error);
                    self.finished = error.kind() != ErrorKind::MalformedNotification;
                    return Some(Err(error));
                }
                Some(Ok(WatchEvent::Added(event))) => {
                    return Some(self.accept(ChangeKind::Added, event));
                }
                Some(Ok(WatchEvent::Modified(event))) => {
                    return Some(self.accept(ChangeKind::Modified, event));
                }
                Some(Ok(WatchEvent::Deleted(event))) => {
                    return Some(self.accept(ChangeKind::Deleted, event));
                }
                Some(Ok(WatchEvent::Bookmark(bookmark))) => {
                    self.resource_version = bookmark.metadata.resource_version;
                }
                Some(Ok(WatchEvent::Error(response))) => {
                    self.finished = true;
                    return Some(Err(StreamerError::from_watch_status(response)));
                }
            }
        }
    }

    fn accept(&mut self, change: ChangeKind, event: Event) -> Result<EventNotification> {
        debug!("{} {:?}", change, event);
        if let Some(resource_version) = &event.metadata.resource_version {
            self.resource_version = resource_version.clone();
        }
        EventNotification::from_event(change, event)
    }

    fn into_stream(self) -> NotificationStream {
        stream::unfold(self, |mut session| async move {
            session
                .next_notification()
                .await
                .map(|item| (item, session))
        })
        .boxed()
    }
}
